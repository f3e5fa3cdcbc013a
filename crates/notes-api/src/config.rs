//! # Configuration
//!
//! [`AppConfig`] is built once at startup from the environment and then
//! passed around by value. Nothing reads the environment afterwards.
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `8080` |
//! | `NOTES_JWT_SECRET` | random per process |
//! | `NOTES_ACCESS_TOKEN_TTL_SECS` | `300` |
//! | `NOTES_REFRESH_TOKEN_TTL_SECS` | `86400` |
//! | `NOTES_PAGE_SIZE` | `10` |
//! | `NOTES_USERS` | empty (`user:password,...`) |
//! | `NOTES_METRICS_ENABLED` | `true` |
//! | `NOTES_LOG_FORMAT` | `text` |
//! | `DATABASE_URL` | unset (in-memory only) |

use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use crate::auth::{JwtSecret, UserDirectory};

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: usize = 100;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ACCESS_TTL_SECS: i64 = 300;
const DEFAULT_REFRESH_TTL_SECS: i64 = 86_400;
const DEFAULT_PAGE_SIZE: usize = 10;

/// Configuration that prevents startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got \"{value}\"")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} must be positive")]
    NotPositive { var: &'static str },

    #[error("NOTES_PAGE_SIZE must be between 1 and {}, got {}", MAX_PAGE_SIZE, .0)]
    PageSizeOutOfRange(usize),

    #[error("NOTES_JWT_SECRET must be at least {} bytes", JwtSecret::MIN_LEN)]
    WeakSecret,

    /// Never echoes the entry, which may contain a password.
    #[error("NOTES_USERS entry {index} is not a valid `user:password` pair")]
    InvalidUserEntry { index: usize },

    #[error("NOTES_LOG_FORMAT must be \"text\" or \"json\", got \"{0}\"")]
    InvalidLogFormat(String),
}

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Application configuration.
///
/// `Debug` never prints the signing secret or credentials.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// HS256 signing secret.
    pub jwt_secret: JwtSecret,
    /// Whether `jwt_secret` was generated because none was configured.
    pub jwt_secret_ephemeral: bool,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Notes per list page.
    pub page_size: usize,
    /// Credential directory for the token endpoint.
    pub users: UserDirectory,
    /// Mount `/metrics` and the metrics middleware.
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
    /// Postgres connection string. `None` runs without persistence.
    pub database_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_secret_ephemeral", &self.jwt_secret_ephemeral)
            .field("access_token_ttl_secs", &self.access_token_ttl.num_seconds())
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl.num_seconds())
            .field("page_size", &self.page_size)
            .field("users", &self.users.len())
            .field("metrics_enabled", &self.metrics_enabled)
            .field("log_format", &self.log_format)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            jwt_secret: JwtSecret::generate(),
            jwt_secret_ephemeral: true,
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh_token_ttl: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            users: UserDirectory::new(),
            metrics_enabled: true,
            log_format: LogFormat::Text,
            database_url: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_number::<u16>(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);

        let access_token_ttl = parse_ttl(&lookup, "NOTES_ACCESS_TOKEN_TTL_SECS")?
            .unwrap_or(Duration::seconds(DEFAULT_ACCESS_TTL_SECS));
        let refresh_token_ttl = parse_ttl(&lookup, "NOTES_REFRESH_TOKEN_TTL_SECS")?
            .unwrap_or(Duration::seconds(DEFAULT_REFRESH_TTL_SECS));

        let page_size =
            parse_number::<usize>(&lookup, "NOTES_PAGE_SIZE")?.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::PageSizeOutOfRange(page_size));
        }

        let (jwt_secret, jwt_secret_ephemeral) = match lookup("NOTES_JWT_SECRET") {
            Some(raw) if !raw.is_empty() => {
                (JwtSecret::new(raw.into_bytes()).ok_or(ConfigError::WeakSecret)?, false)
            }
            _ => (JwtSecret::generate(), true),
        };

        let users = match lookup("NOTES_USERS") {
            Some(raw) => parse_users(&raw)?,
            None => UserDirectory::new(),
        };

        let metrics_enabled = lookup("NOTES_METRICS_ENABLED")
            .map(|v| v.trim().to_ascii_lowercase() != "false")
            .unwrap_or(true);

        let log_format = match lookup("NOTES_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            port,
            jwt_secret,
            jwt_secret_ephemeral,
            access_token_ttl,
            refresh_token_ttl,
            page_size,
            users,
            metrics_enabled,
            log_format,
            database_url,
        })
    }
}

fn parse_number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { var, value }),
    }
}

fn parse_ttl(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    match parse_number::<i64>(lookup, var)? {
        None => Ok(None),
        Some(secs) if secs > 0 => Ok(Some(Duration::seconds(secs))),
        Some(_) => Err(ConfigError::NotPositive { var }),
    }
}

/// Parse `user:password,user2:password2`. Passwords may contain `:`.
fn parse_users(raw: &str) -> Result<UserDirectory, ConfigError> {
    let mut users = UserDirectory::new();
    for (index, entry) in raw.split(',').enumerate() {
        if entry.trim().is_empty() {
            continue;
        }
        let (username, password) = entry
            .split_once(':')
            .ok_or(ConfigError::InvalidUserEntry { index })?;
        if password.is_empty() {
            return Err(ConfigError::InvalidUserEntry { index });
        }
        users
            .add(username, password)
            .map_err(|_| ConfigError::InvalidUserEntry { index })?;
    }
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.access_token_ttl, Duration::seconds(300));
        assert_eq!(config.refresh_token_ttl, Duration::seconds(86_400));
        assert!(config.jwt_secret_ephemeral);
        assert!(config.metrics_enabled);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.users.is_empty());
        assert!(config.database_url.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("NOTES_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("NOTES_ACCESS_TOKEN_TTL_SECS", "60"),
            ("NOTES_REFRESH_TOKEN_TTL_SECS", "120"),
            ("NOTES_PAGE_SIZE", "25"),
            ("NOTES_USERS", "alice:pw:with:colons, bob:hunter2"),
            ("NOTES_METRICS_ENABLED", "false"),
            ("NOTES_LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert!(!config.jwt_secret_ephemeral);
        assert_eq!(config.access_token_ttl, Duration::seconds(60));
        assert_eq!(config.refresh_token_ttl, Duration::seconds(120));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.users.len(), 2);
        assert!(config.users.authenticate("alice", "pw:with:colons").is_ok());
        assert!(config.users.authenticate("bob", "hunter2").is_ok());
        assert!(!config.metrics_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn page_size_bounds() {
        assert_eq!(
            config_from(&[("NOTES_PAGE_SIZE", "0")]).unwrap_err(),
            ConfigError::PageSizeOutOfRange(0)
        );
        assert_eq!(
            config_from(&[("NOTES_PAGE_SIZE", "101")]).unwrap_err(),
            ConfigError::PageSizeOutOfRange(101)
        );
        assert!(config_from(&[("NOTES_PAGE_SIZE", "100")]).is_ok());
    }

    #[test]
    fn rejects_bad_numbers_and_ttls() {
        assert!(matches!(
            config_from(&[("PORT", "eighty")]).unwrap_err(),
            ConfigError::NotANumber { var: "PORT", .. }
        ));
        assert_eq!(
            config_from(&[("NOTES_ACCESS_TOKEN_TTL_SECS", "0")]).unwrap_err(),
            ConfigError::NotPositive { var: "NOTES_ACCESS_TOKEN_TTL_SECS" }
        );
    }

    #[test]
    fn rejects_weak_secret() {
        assert_eq!(
            config_from(&[("NOTES_JWT_SECRET", "short")]).unwrap_err(),
            ConfigError::WeakSecret
        );
    }

    #[test]
    fn user_entry_errors_do_not_echo_passwords() {
        let err = config_from(&[("NOTES_USERS", "alice:ok,bobhunter2")]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidUserEntry { index: 1 });
        assert!(!err.to_string().contains("hunter2"));
        assert!(config_from(&[("NOTES_USERS", "alice:")]).is_err());
    }

    #[test]
    fn database_url_is_read_and_redacted() {
        let url = "postgres://notes:s3cret@db:5432/notes";
        let config = config_from(&[("DATABASE_URL", url)]).unwrap();
        assert_eq!(config.database_url.as_deref(), Some(url));
        assert!(!format!("{config:?}").contains("s3cret"));

        let blank = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(blank.database_url.is_none());
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(matches!(
            config_from(&[("NOTES_LOG_FORMAT", "xml")]).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = config_from(&[("NOTES_JWT_SECRET", "0123456789abcdef0123456789abcdef")])
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("0123456789abcdef"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
