use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// `Some(path)` if `p` names an existing regular file.
pub fn is_path(p: impl AsRef<Path>) -> Option<PathBuf> {
    let path = p.as_ref();
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// True when running inside the Windows Subsystem for Linux.
pub fn is_wsl() -> bool {
    if !cfg!(target_os = "linux") {
        return false;
    }

    fs::read_to_string("/proc/version")
        .map(|v| v.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}

/// Translate a Windows path (`C:\osu!`) into its WSL mount point using the
/// `wslpath` tool.
pub fn wsl_path(path: &str) -> io::Result<PathBuf> {
    let output = Command::new("wslpath")
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("wslpath could not convert '{}'", path),
        ));
    }

    let converted = String::from_utf8_lossy(&output.stdout);
    Ok(PathBuf::from(converted.trim_end_matches('\n')))
}
