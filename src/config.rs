/*
 * Responsibility
 * - Environment / .env configuration (listen addr, CORS, upstream authorizer)
 * - Validation of required values (startup fails on missing/invalid)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        let value = std::env::var("APP_ENV").unwrap_or_default();
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Where the filter finds the namespace value it forwards to the authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceSource {
    /// No namespace signal is forwarded.
    None,
    /// `Namespace` field of a JSON request body.
    Body,
    /// `namespace` query parameter of the request URL.
    QueryParam,
}

impl FromStr for NamespaceSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "body" => Ok(Self::Body),
            "query" => Ok(Self::QueryParam),
            _ => Err(ConfigError::Invalid("AUTH_NAMESPACE_SOURCE")),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_upstream_url: Url,
    pub auth_upstream_timeout: Duration,
    pub auth_pass_body: bool,
    pub auth_namespace_source: NamespaceSource,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        // The authorizer endpoint is mandatory: this service exists to gate
        // requests on it, so a gateway without one is a misconfiguration.
        let auth_upstream_url = std::env::var("AUTH_UPSTREAM_URL")
            .map_err(|_| ConfigError::Missing("AUTH_UPSTREAM_URL"))?;
        let auth_upstream_url =
            Url::parse(&auth_upstream_url).map_err(|_| ConfigError::Invalid("AUTH_UPSTREAM_URL"))?;

        let auth_upstream_timeout = std::env::var("AUTH_UPSTREAM_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(5_000));

        let auth_pass_body = std::env::var("AUTH_PASS_BODY")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let auth_namespace_source = match std::env::var("AUTH_NAMESPACE_SOURCE") {
            Ok(v) => v.parse()?,
            Err(_) => NamespaceSource::None,
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            auth_upstream_url,
            auth_upstream_timeout,
            auth_pass_body,
            auth_namespace_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_source_parses_known_values() {
        assert_eq!(
            "none".parse::<NamespaceSource>().unwrap(),
            NamespaceSource::None
        );
        assert_eq!(
            "body".parse::<NamespaceSource>().unwrap(),
            NamespaceSource::Body
        );
        assert_eq!(
            "Query".parse::<NamespaceSource>().unwrap(),
            NamespaceSource::QueryParam
        );
    }

    #[test]
    fn namespace_source_defaults_to_none_on_empty() {
        assert_eq!(
            "".parse::<NamespaceSource>().unwrap(),
            NamespaceSource::None
        );
    }

    #[test]
    fn namespace_source_rejects_unknown_values() {
        assert!("header".parse::<NamespaceSource>().is_err());
    }
}
