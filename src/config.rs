//! Application configuration read from environment variables (`.env` supported).

use crate::error::ConfigError;

const DEFAULT_JWT_SECRET: &str = "local-development-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Hosted backend connection: project URL and public (anon) API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// `None` selects the in-memory backend.
    pub backend: Option<BackendConfig>,
    pub allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            host: "127.0.0.1".to_string(),
            port: 3001,
            log_level: "debug".to_string(),
            backend: None,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            seed_demo_data: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let environment = match get("ENVIRONMENT").as_deref() {
            Some("production") => Environment::Production,
            Some("development") | None => Environment::Development,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "ENVIRONMENT",
                    value: other.to_string(),
                })
            }
        };

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => defaults.port,
        };

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| {
            if environment.is_production() {
                "info".to_string()
            } else {
                "debug".to_string()
            }
        });

        let url = get("BACKEND_URL").or_else(|| get("SUPABASE_URL"));
        let anon_key = get("BACKEND_ANON_KEY").or_else(|| get("SUPABASE_ANON_KEY"));
        let backend = match (url, anon_key) {
            (Some(url), Some(anon_key)) => Some(BackendConfig { url, anon_key }),
            _ if environment.is_production() => return Err(ConfigError::MissingBackend),
            _ => None,
        };

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| get("FRONTEND_ORIGIN").map(|o| vec![o]))
            .unwrap_or(defaults.allowed_origins);

        let seed_demo_data = match get("SEED_DEMO_DATA").as_deref() {
            Some("0") | Some("false") | Some("no") => false,
            Some("1") | Some("true") | Some("yes") | None => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SEED_DEMO_DATA",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            environment,
            host: get("HOST").unwrap_or(defaults.host),
            port,
            log_level,
            backend,
            allowed_origins,
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            seed_demo_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_uses_development_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.log_level, "debug");
        assert!(cfg.backend.is_none());
        assert!(cfg.seed_demo_data);
        assert_eq!(cfg.allowed_origins.len(), 2);
    }

    #[test]
    fn test_supabase_aliases_configure_backend() {
        let cfg = config(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(
            cfg.backend,
            Some(BackendConfig {
                url: "https://abc.supabase.co".to_string(),
                anon_key: "anon".to_string(),
            })
        );
    }

    #[test]
    fn test_production_requires_backend() {
        let err = config(&[("ENVIRONMENT", "production")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackend));
    }

    #[test]
    fn test_production_defaults_to_info_logging() {
        let cfg = config(&[
            ("ENVIRONMENT", "production"),
            ("BACKEND_URL", "https://abc.supabase.co"),
            ("BACKEND_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn test_allowed_origins_split_and_fall_back_to_frontend_origin() {
        let cfg = config(&[("ALLOWED_ORIGINS", "https://a.test, https://b.test,")]).unwrap();
        assert_eq!(cfg.allowed_origins, vec!["https://a.test", "https://b.test"]);

        let cfg = config(&[("ALLOWED_ORIGINS", " , "), ("FRONTEND_ORIGIN", "https://c.test")])
            .unwrap();
        assert_eq!(cfg.allowed_origins, vec!["https://c.test"]);
    }

    #[test]
    fn test_seed_flag_parses() {
        assert!(!config(&[("SEED_DEMO_DATA", "false")]).unwrap().seed_demo_data);
        assert!(config(&[("SEED_DEMO_DATA", "maybe")]).is_err());
    }
}
