//! Environment configuration.
//!
//! Required settings fail startup when absent. Optional collaborators
//! (object storage, email, NATS) degrade to disabled with a warning so a
//! bare `DATABASE_URL` + `ADMIN_TOKEN` is enough for local development.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::Context;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub admin_token: String,
    pub catalog_timeout_secs: u64,
    pub storage: Option<StorageConfig>,
    pub email: Option<EmailConfig>,
    pub admin_notify_email: Option<String>,
    pub nats_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub url: String,
    pub key: String,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        // No committed fallback: the admin surface stays locked unless a
        // token is explicitly provisioned.
        let admin_token = env::var("ADMIN_TOKEN").context("ADMIN_TOKEN must be set")?;
        anyhow::ensure!(!admin_token.trim().is_empty(), "ADMIN_TOKEN must not be empty");

        let storage = match (env::var("STORAGE_URL").ok(), env::var("STORAGE_KEY").ok()) {
            (Some(url), Some(key)) => Some(StorageConfig { url, key }),
            (None, None) => {
                warn!("STORAGE_URL/STORAGE_KEY not set, receipt and media uploads disabled");
                None
            }
            _ => {
                warn!("STORAGE_URL and STORAGE_KEY must both be set, uploads disabled");
                None
            }
        };

        let email = match (env::var("EMAIL_API_URL").ok(), env::var("EMAIL_API_KEY").ok()) {
            (Some(api_url), Some(api_key)) => Some(EmailConfig {
                api_url,
                api_key,
                from: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "DopeTech Nepal <orders@dopetechnp.com>".to_string()),
            }),
            (None, None) => {
                warn!("EMAIL_API_URL/EMAIL_API_KEY not set, order emails disabled");
                None
            }
            _ => {
                warn!("EMAIL_API_URL and EMAIL_API_KEY must both be set, order emails disabled");
                None
            }
        };

        let admin_notify_email = env::var("ADMIN_NOTIFY_EMAIL").ok();
        if email.is_some() && admin_notify_email.is_none() {
            warn!("ADMIN_NOTIFY_EMAIL not set, admin order notifications disabled");
        }

        Ok(Self {
            database_url,
            port: parse_or("PORT", 8083),
            admin_token,
            catalog_timeout_secs: parse_or("CATALOG_TIMEOUT_SECS", 10),
            storage,
            email,
            admin_notify_email,
            nats_url: env::var("NATS_URL").ok(),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    let Ok(raw) = env::var(key) else { return default };
    match raw.parse() {
        Ok(value) => value,
        Err(err) => {
            warn!("invalid {key} value {raw:?}: {err}, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Unique variable names per case so parallel tests cannot clash.
    #[test]
    fn test_parse_or_falls_back_when_unset_or_invalid() {
        assert_eq!(parse_or("DOPETECH_TEST_UNSET_PORT", 8083u16), 8083);

        env::set_var("DOPETECH_TEST_BAD_PORT", "not-a-number");
        assert_eq!(parse_or("DOPETECH_TEST_BAD_PORT", 8083u16), 8083);
    }

    #[test]
    fn test_parse_or_reads_valid_values() {
        env::set_var("DOPETECH_TEST_GOOD_PORT", "9090");
        assert_eq!(parse_or("DOPETECH_TEST_GOOD_PORT", 8083u16), 9090);

        env::set_var("DOPETECH_TEST_TIMEOUT", "25");
        assert_eq!(parse_or("DOPETECH_TEST_TIMEOUT", 10u64), 25);
    }
}
