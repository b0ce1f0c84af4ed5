use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";
const DEFAULT_LOG_FILE: &str = "./logs/local-osu.log";

/// Where and how verbosely to log, from `TRACING_LEVEL` and `LOG_FILE_PATH`.
#[derive(Debug, PartialEq)]
struct LogSettings {
    filter: String,
    directory: PathBuf,
    file_name: OsString,
}

impl LogSettings {
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let filter = lookup("TRACING_LEVEL")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let path = PathBuf::from(
            lookup("LOG_FILE_PATH")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        );

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("local-osu.log"));

        Self {
            filter,
            directory,
            file_name,
        }
    }
}

/// Pretty console output plus a plain-text log file. The returned guard
/// flushes the file writer on drop, so hold it until `main` returns.
pub fn init_logger() -> impl Drop {
    let settings = LogSettings::from_env();

    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        &settings.directory,
        &settings.file_name,
    ));

    let console = fmt::layer()
        .with_writer(std::io::stdout)
        .pretty()
        .with_file(false)
        .without_time()
        .with_ansi(true);
    let file = fmt::layer().with_writer(file_writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(EnvFilter::new(&settings.filter))
        .init();

    debug!(
        "Logging at '{}' to {}",
        settings.filter,
        settings.directory.join(&settings.file_name).display()
    );

    guard
}
