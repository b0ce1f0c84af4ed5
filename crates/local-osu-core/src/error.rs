use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    RemoteStatus { url: String, status: u16 },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Beatmap error: {0}")]
    Beatmap(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
