use std::ffi::OsString;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILE: &str = "logs/tabstat.log";

/// Where the rolling JSON log goes.
///
/// Read from `LOG_FILE_PATH`, typically set in a `.env` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub file_name: OsString,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let path = std::env::var("LOG_FILE_PATH").ok();
        Self::from_path(path.as_deref())
    }

    pub fn from_path(path: Option<&str>) -> Self {
        let path = PathBuf::from(path.filter(|p| !p.trim().is_empty()).unwrap_or(DEFAULT_LOG_FILE));

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_name = path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("tabstat.log"));

        Self { dir, file_name }
    }
}

/// Builds a log filter from the directives in environment variable `var`,
/// falling back to `default` when it is unset or empty.
pub fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
    filter_from(std::env::var(var).ok().as_deref(), default)
}

fn filter_from(directives: Option<&str>, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .parse_lossy(directives.unwrap_or_default())
}
