//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use rollcall::db::DatabaseConfig;
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Administrator credentials
    pub admin: AdminConfig,
    /// Attendance marking policy knobs
    pub policy: PolicyConfig,
}

/// Administrator credentials, checked on the admin login endpoint
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Admin login ID (required)
    pub admin_id: String,
    /// Admin password (required)
    pub admin_password: String,
}

/// Attendance marking policy configuration
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Whether claims must carry device coordinates
    pub require_location: bool,
    /// Geofence radius in meters
    pub geofence_radius_m: f64,
    /// Device cooldown in minutes
    pub device_cooldown_minutes: i64,
    /// Length of generated OTP codes
    pub otp_code_length: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        // Bind address
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(|| {
                "127.0.0.1:8000"
                    .parse()
                    .expect("Default bind address is valid")
            });

        // Database configuration
        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "postgres://postgres@localhost/rollcall_db".to_string());

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 100),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 5),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 5),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
        };

        // Admin credentials (REQUIRED)
        let admin_id = std::env::var("ADMIN_ID").map_err(|_| ConfigError::MissingRequired {
            var: "ADMIN_ID".to_string(),
            hint: "Set the administrator login ID, e.g. ADMIN_ID=admin".to_string(),
        })?;

        let admin_password =
            std::env::var("ADMIN_PASSWORD").map_err(|_| ConfigError::MissingRequired {
                var: "ADMIN_PASSWORD".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let admin = AdminConfig {
            admin_id,
            admin_password,
        };

        let policy = PolicyConfig {
            require_location: parse_env_or("REQUIRE_LOCATION", true),
            geofence_radius_m: parse_env_or("GEOFENCE_RADIUS_M", 100.0),
            device_cooldown_minutes: parse_env_or("DEVICE_COOLDOWN_MINUTES", 50),
            otp_code_length: parse_env_or("OTP_CODE_LENGTH", 6),
        };

        Ok(ServerConfig {
            bind,
            database,
            admin,
            policy,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.admin_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "ADMIN_ID".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.admin.admin_password.len() < 8 {
            return Err(ConfigError::Invalid {
                var: "ADMIN_PASSWORD".to_string(),
                reason: "Must be at least 8 characters".to_string(),
            });
        }

        if self.policy.geofence_radius_m <= 0.0 {
            return Err(ConfigError::Invalid {
                var: "GEOFENCE_RADIUS_M".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.policy.device_cooldown_minutes < 0 {
            return Err(ConfigError::Invalid {
                var: "DEVICE_COOLDOWN_MINUTES".to_string(),
                reason: "Must not be negative".to_string(),
            });
        }

        if !(4..=12).contains(&self.policy.otp_code_length) {
            return Err(ConfigError::Invalid {
                var: "OTP_CODE_LENGTH".to_string(),
                reason: "Must be between 4 and 12".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8000".parse().unwrap(),
            database: DatabaseConfig {
                database_url: "test".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_secs: 5,
                idle_timeout_secs: 300,
                max_lifetime_secs: 1800,
            },
            admin: AdminConfig {
                admin_id: "admin".to_string(),
                admin_password: "a".repeat(16),
            },
            policy: PolicyConfig {
                require_location: true,
                geofence_radius_m: 100.0,
                device_cooldown_minutes: 50,
                otp_code_length: 6,
            },
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "ADMIN_PASSWORD".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ADMIN_PASSWORD"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_config_validation_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_admin_password() {
        let mut config = valid_config();
        config.admin.admin_password = "short".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_radius_zero() {
        let mut config = valid_config();
        config.policy.geofence_radius_m = 0.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_code_length_out_of_range() {
        let mut config = valid_config();
        config.policy.otp_code_length = 2;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
