use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

/// `RUST_LOG` wins over `level`; an unparsable level falls back to the default.
pub(crate) fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

pub(crate) fn init_logging(path: Option<&Path>, level: &str) -> Option<PathBuf> {
    let path = path?;
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && fs::create_dir_all(dir).is_err() {
            return None;
        }
    }
    let file = File::create(path).ok()?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(file_layer)
        .try_init()
        .ok()?;
    Some(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_directives() {
        let filter = EnvFilter::try_new("info,solarscope::frame=debug").unwrap();
        let s = filter.to_string();
        assert!(s.contains("info"));
        assert!(s.contains("solarscope::frame=debug"));
    }

    #[test]
    fn test_bad_level_falls_back() {
        // only meaningful when RUST_LOG is unset in the test environment
        if std::env::var_os("RUST_LOG").is_none() {
            let s = env_filter("solarscope=loud").to_string();
            assert!(s.contains(DEFAULT_LOG_LEVEL));
        }
    }

    #[test]
    fn test_no_path_means_no_logging() {
        assert_eq!(init_logging(None, DEFAULT_LOG_LEVEL), None);
    }
}
