use crate::config::{AppConfig, Environment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// What the subscriber needs to know, derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub environment: Environment,
    pub level: String,
    pub directory: String,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            environment: config.environment,
            level: config.log_level.clone(),
            directory: "logs".to_string(),
            format: if config.environment.is_production() {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
        }
    }

    /// Filter used when `RUST_LOG` is unset.
    pub fn default_directives(&self) -> String {
        format!(
            "hospital_portal={},tower_http=debug,axum=debug",
            self.level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_logs_json() {
        let config = AppConfig {
            environment: Environment::Production,
            log_level: "warn".to_string(),
            ..AppConfig::default()
        };
        let settings = LogSettings::from_config(&config);
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(
            settings.default_directives(),
            "hospital_portal=warn,tower_http=debug,axum=debug"
        );
    }
}
