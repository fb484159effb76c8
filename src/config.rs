use chrono::{Duration, Utc};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set")]
    MissingSigningKey,

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    /// Value shown by `GET /config`.
    pub display_secret: String,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub views_dir: PathBuf,
    /// Token lifetime; always small enough to add to the current time.
    pub token_ttl: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("upload_dir", &self.upload_dir)
            .field("views_dir", &self.views_dir)
            .field("token_ttl_hours", &self.token_ttl.num_hours())
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::MissingSigningKey)?;

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: v,
            })?,
            None => 8080,
        };

        let token_ttl = match get("TOKEN_TTL_HOURS") {
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .and_then(Duration::try_hours)
                .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
                .ok_or(ConfigError::Invalid {
                    name: "TOKEN_TTL_HOURS",
                    value: v,
                })?,
            None => Duration::hours(72),
        };

        Ok(Self {
            jwt_secret,
            display_secret: get("SECRET").unwrap_or_else(|| "defaultsecret".to_string()),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            views_dir: get("VIEWS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./views")),
            token_ttl,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
