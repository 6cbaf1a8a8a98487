use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::settings::{LogFormat, LoggingConfig};
use crate::config::sources::ServiceConfig;


#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "trace",
            LogLevel::DEBUG => "debug",
            LogLevel::INFO => "info",
            LogLevel::WARN => "warn",
            LogLevel::ERROR => "error",
        }
    }
}

/// Resolve the effective logging config: CLI level first, then the config file,
/// then `info` in the format picked by `LOG_FORMAT`.
pub fn effective_config(service_config: &ServiceConfig, arg_log_level: Option<LogLevel>) -> LoggingConfig {
    let configured = service_config.settings.logging.as_ref();
    let level = arg_log_level
        .map(|level| level.as_str().to_owned())
        .or_else(|| configured.map(|config| config.level.to_owned()))
        .unwrap_or_else(|| "info".to_owned());
    let format = configured
        .map(|config| config.format.to_owned())
        .unwrap_or_else(LogFormat::from_env);

    LoggingConfig::new(level, format)
}

pub async fn run(service_config: &ServiceConfig, arg_log_level: Option<LogLevel>) -> anyhow::Result<()> {
    init_logging(&effective_config(service_config, arg_log_level));
    Ok(())
}


/// Initialize tracing with the desired config.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Base layer: filter + writer
    let registry = tracing_subscriber::registry().with(env_filter);

    // Choose format layer
    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true) // flattens fields, good for CRI log parsers
                .with_ansi(false); // CRI parsers dislike ANSI color codes

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::proc_loader::parse_config;
    use serial_test::serial;

    #[test]
    #[serial]
    fn format_falls_back_to_environment_without_logging_block() {
        std::env::set_var("LOG_FORMAT", "json");
        let mut config = parse_config("settings: {}\n".to_owned()).unwrap();
        config.settings.logging = None;
        let effective = effective_config(&config, None);
        std::env::remove_var("LOG_FORMAT");

        assert_eq!(effective.level, "info");
        assert_eq!(effective.format, LogFormat::Json);
    }

    #[test]
    fn cli_level_overrides_config() {
        let config = parse_config("settings:\n  logging:\n    level: warn\n    format: json\n".to_owned()).unwrap();
        let effective = effective_config(&config, Some(LogLevel::DEBUG));
        assert_eq!(effective.level, "debug");
        assert_eq!(effective.format, LogFormat::Json);

        let effective = effective_config(&config, None);
        assert_eq!(effective.level, "warn");
    }
}
