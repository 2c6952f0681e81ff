//! Application configuration loaded from environment variables.

use std::env;

/// HTTP header carrying the session token.
pub const AUTH_HEADER: &str = "Authorization";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_ADMIN_EMAIL: &str = "admin@repairdesk.local";
    pub const DEV_ADMIN_PASSWORD: &str = "dev-admin-password-do-not-use";
    pub const DEV_EVENT_CAPACITY: usize = 1000;
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Bootstrap admin account email (seeded at startup when set)
    pub admin_email: Option<String>,
    /// Bootstrap admin account password
    pub admin_password: Option<String>,
    /// Capacity of the per-collection change-event channels
    pub event_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development) every variable has a
    /// sensible default; only RUST_ENV is required. In production mode the
    /// bootstrap admin credentials must not match the development defaults.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `RD_HOST`: Server host (default: 127.0.0.1)
    /// - `RD_PORT`: Server port (default: 8080)
    /// - `RD_ADMIN_EMAIL`: Bootstrap admin account email (optional in production)
    /// - `RD_ADMIN_PASSWORD`: Bootstrap admin account password
    /// - `RD_EVENT_CAPACITY`: Change-event channel capacity (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("RD_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("RD_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("RD_PORT must be a valid port number"))?;

        // Admin bootstrap credentials are defaulted in development only
        let (admin_email, admin_password) = if environment.is_development() {
            (
                Some(
                    env::var("RD_ADMIN_EMAIL")
                        .unwrap_or_else(|_| defaults::DEV_ADMIN_EMAIL.to_string()),
                ),
                Some(
                    env::var("RD_ADMIN_PASSWORD")
                        .unwrap_or_else(|_| defaults::DEV_ADMIN_PASSWORD.to_string()),
                ),
            )
        } else {
            (env::var("RD_ADMIN_EMAIL").ok(), env::var("RD_ADMIN_PASSWORD").ok())
        };

        let event_capacity = env::var("RD_EVENT_CAPACITY")
            .unwrap_or_else(|_| defaults::DEV_EVENT_CAPACITY.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue("RD_EVENT_CAPACITY must be a valid number"))?;

        let config = Config {
            environment,
            host,
            port,
            admin_email,
            admin_password,
            event_capacity,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Some(ref password) = self.admin_password {
            if password == defaults::DEV_ADMIN_PASSWORD {
                errors.push(
                    "RD_ADMIN_PASSWORD is using the development default. Set a secure password or remove it."
                        .to_string(),
                );
            }
        }

        if self.admin_email.is_some() && self.admin_password.is_none() {
            errors.push("RD_ADMIN_EMAIL is set but RD_ADMIN_PASSWORD is missing.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config() -> Config {
        Config {
            environment: Environment::Development,
            host: "0.0.0.0".to_string(),
            port: 3000,
            admin_email: Some(defaults::DEV_ADMIN_EMAIL.to_string()),
            admin_password: Some(defaults::DEV_ADMIN_PASSWORD.to_string()),
            event_capacity: 1000,
        }
    }

    #[test]
    fn test_bind_address() {
        let config = dev_config();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::parse("development"),
            Some(Environment::Development)
        );
        assert_eq!(Environment::parse("dev"), Some(Environment::Development));
        assert_eq!(
            Environment::parse("production"),
            Some(Environment::Production)
        );
        assert_eq!(Environment::parse("prod"), Some(Environment::Production));
        assert_eq!(Environment::parse("invalid"), None);
    }

    #[test]
    fn test_production_validation_fails_with_dev_defaults() {
        let config = Config {
            environment: Environment::Production,
            ..dev_config()
        };

        let result = config.validate_production();
        assert!(result.is_err());
    }

    #[test]
    fn test_production_validation_passes_with_proper_config() {
        let config = Config {
            environment: Environment::Production,
            host: "0.0.0.0".to_string(),
            port: 8080,
            admin_email: Some("ops@example.com".to_string()),
            admin_password: Some("a-long-unique-secret".to_string()),
            event_capacity: 1000,
        };

        assert!(config.validate_production().is_ok());
    }
}
