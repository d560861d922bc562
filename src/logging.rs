//! Structured logging for the CLI and the HTTP server (stderr).

use tracing_subscriber::{fmt, EnvFilter};

/// Used when `RUST_LOG` is unset: session and HTTP trace events at info,
/// everything else at warn.
pub const DEFAULT_FILTER: &str = "warn,atm_session=info,atm=info,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact single-line human output
    #[default]
    Compact,
    /// One JSON object per event, fields flattened to the top level
    Json,
}

impl LogFormat {
    /// `--log-json` or `ATM_LOG_JSON` (`1` / `true`) select JSON.
    pub fn resolve(flag: bool, env_value: Option<&str>) -> Self {
        let from_env = env_value
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);
        if flag || from_env { LogFormat::Json } else { LogFormat::Compact }
    }

    pub fn from_env(flag: bool) -> Self { Self::resolve(flag, std::env::var("ATM_LOG_JSON").ok().as_deref()) }
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. `false` if one was already installed.
pub fn init_logging(format: LogFormat) -> bool {
    let builder = fmt().with_env_filter(env_filter()).with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Json => builder.json().flatten_event(true).with_current_span(false).try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_selection() {
        assert_eq!(LogFormat::resolve(false, None), LogFormat::Compact);
        assert_eq!(LogFormat::resolve(true, None), LogFormat::Json);
        assert_eq!(LogFormat::resolve(false, Some("1")), LogFormat::Json);
        assert_eq!(LogFormat::resolve(false, Some(" TRUE ")), LogFormat::Json);
        assert_eq!(LogFormat::resolve(false, Some("0")), LogFormat::Compact);
    }

    #[test]
    fn default_filter_is_valid() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn second_install_is_refused() {
        init_logging(LogFormat::Json);
        assert!(!init_logging(LogFormat::Compact));
    }
}
