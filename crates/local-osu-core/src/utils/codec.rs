use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, Result};

pub fn bytes_to_string(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn string_to_bytes(s: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(s.trim())
        .map_err(|e| Error::InvalidInput(format!("invalid base64: {}", e)))
}
