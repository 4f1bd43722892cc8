/*
 * Responsibility
 * - load settings from env vars (LDAP endpoint, service bind, TLS paths)
 * - validate at startup (missing/invalid config fails the boot, not a request)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use std::{env, fmt};

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
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

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // TLS material for the inbound listener (the API server requires https)
    pub tls_cert_path: String,
    pub tls_key_path: String,

    pub ldap_url: String,
    // Service identity the webhook binds as; never derived from the request
    pub ldap_bind_dn: String,
    pub ldap_bind_password: String,
    pub ldap_search_base: String,
    // Multi-valued attribute read as group membership
    pub ldap_group_attr: String,
    pub ldap_timeout: Duration,

    pub request_timeout: Duration,
}

// An unset var falls back to the default; a set-but-unparsable var fails the
// boot instead of silently running with the default.
fn parse_or_default<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or_default("PORT", env::var("PORT").ok(), 8443)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let tls_cert_path =
            env::var("TLS_CERT_PATH").map_err(|_| ConfigError::Missing("TLS_CERT_PATH"))?;
        let tls_key_path =
            env::var("TLS_KEY_PATH").map_err(|_| ConfigError::Missing("TLS_KEY_PATH"))?;

        let ldap_url = env::var("LDAP_URL").map_err(|_| ConfigError::Missing("LDAP_URL"))?;
        let parsed = Url::parse(&ldap_url).map_err(|_| ConfigError::Invalid("LDAP_URL"))?;
        if parsed.scheme() != "ldap" && parsed.scheme() != "ldaps" {
            return Err(ConfigError::Invalid("LDAP_URL"));
        }

        let ldap_bind_dn =
            env::var("LDAP_BIND_DN").map_err(|_| ConfigError::Missing("LDAP_BIND_DN"))?;
        let ldap_bind_password = env::var("LDAP_BIND_PASSWORD")
            .map_err(|_| ConfigError::Missing("LDAP_BIND_PASSWORD"))?;
        let ldap_search_base =
            env::var("LDAP_SEARCH_BASE").map_err(|_| ConfigError::Missing("LDAP_SEARCH_BASE"))?;

        let ldap_group_attr = env::var("LDAP_GROUP_ATTR").unwrap_or_else(|_| "ou".to_string());

        let ldap_timeout = Duration::from_secs(parse_or_default(
            "LDAP_TIMEOUT_SECONDS",
            env::var("LDAP_TIMEOUT_SECONDS").ok(),
            10,
        )?);

        let request_timeout = Duration::from_secs(parse_or_default(
            "REQUEST_TIMEOUT_SECONDS",
            env::var("REQUEST_TIMEOUT_SECONDS").ok(),
            30,
        )?);

        Ok(Config {
            addr,
            app_env,
            tls_cert_path,
            tls_key_path,
            ldap_url,
            ldap_bind_dn,
            ldap_bind_password,
            ldap_search_base,
            ldap_group_attr,
            ldap_timeout,
            request_timeout,
        })
    }
}
