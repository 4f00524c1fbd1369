//! Runtime configuration, read from environment variables.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 1440;
/// One year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

/// Credentials for the admin account seeded at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// `true` when `JWT_SECRET` was unset and the dev secret is in use.
    pub insecure_jwt_secret: bool,
    pub token_ttl: Duration,
    /// Mount point of the JSON API; empty means the root.
    pub api_prefix: String,
    pub storage: StorageConfig,
    pub cors_origins: CorsOrigins,
    pub bootstrap_admin: Option<AdminBootstrap>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("insecure_jwt_secret", &self.insecure_jwt_secret)
            .field("token_ttl_minutes", &self.token_ttl.num_minutes())
            .field("api_prefix", &self.api_prefix)
            .field("storage", &self.storage_kind())
            .field("cors_origins", &self.cors_origins)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            insecure_jwt_secret: true,
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            storage: StorageConfig::InMemory,
            cors_origins: CorsOrigins::Any,
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let (jwt_secret, insecure_jwt_secret) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let ttl_minutes = match get("TOKEN_TTL_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| (1..=MAX_TOKEN_TTL_MINUTES).contains(m))
                .ok_or_else(|| {
                    ConfigError::invalid(
                        "TOKEN_TTL_MINUTES",
                        format!("expected an integer between 1 and {MAX_TOKEN_TTL_MINUTES}"),
                    )
                })?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let api_prefix =
            normalize_prefix(get("API_PREFIX").as_deref().unwrap_or(DEFAULT_API_PREFIX))?;

        let persistent = match get("USE_PERSISTENT_STORES") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::invalid("USE_PERSISTENT_STORES", "expected true or false")
            })?,
            None => false,
        };
        let storage = if persistent {
            let database_url =
                get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
                Some(raw) => raw
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        ConfigError::invalid(
                            "DATABASE_MAX_CONNECTIONS",
                            "expected a positive integer",
                        )
                    })?,
                None => DEFAULT_MAX_CONNECTIONS,
            };
            StorageConfig::Postgres {
                database_url,
                max_connections,
            }
        } else {
            StorageConfig::InMemory
        };

        let cors_origins = match get("CORS_ORIGINS") {
            None => CorsOrigins::Any,
            Some(raw) if raw.trim() == "*" => CorsOrigins::Any,
            Some(raw) => CorsOrigins::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        };

        let bootstrap_admin = match (
            get("BOOTSTRAP_ADMIN_USERNAME"),
            get("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_USERNAME")),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            insecure_jwt_secret,
            token_ttl: Duration::minutes(ttl_minutes),
            api_prefix,
            storage,
            cors_origins,
            bootstrap_admin,
        })
    }

    pub fn storage_kind(&self) -> &'static str {
        match self.storage {
            StorageConfig::InMemory => "in_memory",
            StorageConfig::Postgres { .. } => "postgres",
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn normalize_prefix(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if !trimmed.starts_with('/') {
        return Err(ConfigError::invalid("API_PREFIX", "must start with '/'"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.insecure_jwt_secret);
        assert_eq!(cfg.token_ttl, Duration::hours(24));
        assert_eq!(cfg.api_prefix, "/api");
        assert_eq!(cfg.storage, StorageConfig::InMemory);
        assert_eq!(cfg.cors_origins, CorsOrigins::Any);
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn persistent_storage_requires_database_url() {
        let err = config(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/outpost"),
        ])
        .unwrap();
        assert_eq!(cfg.storage_kind(), "postgres");
    }

    #[test]
    fn rejects_bad_numbers_and_prefixes() {
        assert!(matches!(
            config(&[("TOKEN_TTL_MINUTES", "0")]),
            Err(ConfigError::Invalid { var: "TOKEN_TTL_MINUTES", .. })
        ));
        assert!(matches!(
            config(&[("TOKEN_TTL_MINUTES", "10000000000000")]),
            Err(ConfigError::Invalid { var: "TOKEN_TTL_MINUTES", .. })
        ));
        let too_long = (MAX_TOKEN_TTL_MINUTES + 1).to_string();
        assert!(matches!(
            config(&[("TOKEN_TTL_MINUTES", too_long.as_str())]),
            Err(ConfigError::Invalid { var: "TOKEN_TTL_MINUTES", .. })
        ));
        let longest = MAX_TOKEN_TTL_MINUTES.to_string();
        let cfg = config(&[("TOKEN_TTL_MINUTES", longest.as_str())]).unwrap();
        assert_eq!(cfg.token_ttl, Duration::days(365));
        assert!(matches!(
            config(&[("API_PREFIX", "api")]),
            Err(ConfigError::Invalid { var: "API_PREFIX", .. })
        ));
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
    }

    #[test]
    fn prefix_and_origins_are_normalized() {
        let cfg = config(&[
            ("API_PREFIX", "/v1/"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(cfg.api_prefix, "/v1");
        assert_eq!(
            cfg.cors_origins,
            CorsOrigins::List(vec!["http://a.test".into(), "http://b.test".into()])
        );
        assert!(!cfg.insecure_jwt_secret);
    }

    #[test]
    fn half_configured_bootstrap_admin_is_an_error() {
        let err = config(&[("BOOTSTRAP_ADMIN_USERNAME", "root")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = config(&[
            ("JWT_SECRET", "top-secret"),
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "hunter2"),
        ])
        .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("top-secret"));
        assert!(!dbg.contains("hunter2"));
    }
}
