//! Process configuration, read from environment variables.

use std::net::SocketAddr;

use anyhow::Context;
use chrono::Duration;

use taskboard_auth::{DEFAULT_SESSION_TTL_SECS, PasswordHasher};

const DEV_JWT_SECRET: &str = "dev-secret";

/// Upper bound for `SESSION_TTL_SECS` (ten years).
const MAX_SESSION_TTL_SECS: i64 = 10 * 365 * 86_400;

/// Runtime configuration for the API process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
    pub mail_from: String,
    /// SMTP relay URL; mail is only logged when unset.
    pub smtp_url: Option<String>,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            bcrypt_cost: PasswordHasher::default().cost(),
            mail_from: "no-reply@taskboard.local".to_string(),
            smtp_url: None,
            use_persistent_stores: false,
            database_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match lookup("BIND_ADDR") {
            Some(v) => v
                .parse()
                .with_context(|| format!("BIND_ADDR is not a socket address: {v}"))?,
            None => defaults.bind_addr,
        };

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            defaults.jwt_secret.clone()
        });

        let session_ttl = match lookup("SESSION_TTL_SECS") {
            Some(v) => {
                let secs: i64 = v
                    .parse()
                    .with_context(|| format!("SESSION_TTL_SECS is not an integer: {v}"))?;
                anyhow::ensure!(
                    (1..=MAX_SESSION_TTL_SECS).contains(&secs),
                    "SESSION_TTL_SECS must be within 1..={MAX_SESSION_TTL_SECS}"
                );
                Duration::seconds(secs)
            }
            None => defaults.session_ttl,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(v) => {
                let cost: u32 = v
                    .parse()
                    .with_context(|| format!("BCRYPT_COST is not an integer: {v}"))?;
                anyhow::ensure!((4..=31).contains(&cost), "BCRYPT_COST must be within 4..=31");
                cost
            }
            None => defaults.bcrypt_cost,
        };

        let use_persistent_stores = match lookup("USE_PERSISTENT_STORES") {
            Some(v) => v
                .parse::<bool>()
                .with_context(|| format!("USE_PERSISTENT_STORES is not a bool: {v}"))?,
            None => false,
        };

        let database_url = lookup("DATABASE_URL");
        if use_persistent_stores {
            anyhow::ensure!(
                database_url.is_some(),
                "DATABASE_URL must be set when USE_PERSISTENT_STORES=true"
            );
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            session_ttl,
            bcrypt_cost,
            mail_from: lookup("MAIL_FROM").unwrap_or(defaults.mail_from),
            smtp_url: lookup("SMTP_URL"),
            use_persistent_stores,
            database_url,
        })
    }
}
