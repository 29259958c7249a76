use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

const DEFAULT_UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub max_results: u64,
    pub image_dir: PathBuf,
    pub image_base_url: String,
    pub placeholder_image_url: String,
    pub admin_password: Option<String>,
    pub session_secret: Option<String>,
    pub login_attempts_per_minute: u32,
    pub upload_max_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so tests do not
    /// have to touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 =
            lookup("PORT").unwrap_or_else(|| "3000".to_string()).parse().context("PORT")?;

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://cinematheque.db?mode=rwc".to_string());

        let max_results: u64 =
            lookup("SEARCH_MAX_RESULTS").and_then(|s| s.parse().ok()).unwrap_or(101);

        let image_dir =
            PathBuf::from(lookup("IMAGE_DIR").unwrap_or_else(|| "./images".to_string()));
        let image_base_url = lookup("IMAGE_BASE_URL").unwrap_or_else(|| "/images".to_string());
        let placeholder_image_url = lookup("PLACEHOLDER_IMAGE_URL")
            .unwrap_or_else(|| "https://placehold.co/600x900?text=No+image".to_string());

        let admin_password = lookup("ADMIN_PASSWORD").filter(|s| !s.trim().is_empty());

        let session_secret = lookup("SESSION_SECRET").filter(|s| !s.is_empty());
        if let Some(secret) = &session_secret {
            if secret.len() < 32 {
                anyhow::bail!("SESSION_SECRET must be at least 32 bytes");
            }
        }

        let login_attempts_per_minute: u32 =
            lookup("LOGIN_ATTEMPTS_PER_MINUTE").and_then(|s| s.parse().ok()).unwrap_or(5);

        let upload_max_bytes: usize = lookup("UPLOAD_MAX_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_UPLOAD_MAX_BYTES);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            max_results,
            image_dir,
            image_base_url,
            placeholder_image_url,
            admin_password,
            session_secret,
            login_attempts_per_minute,
            upload_max_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.max_results, 101);
        assert_eq!(config.image_base_url, "/images");
        assert!(config.admin_password.is_none());
        assert!(config.session_secret.is_none());
        assert_eq!(config.login_attempts_per_minute, 5);
        assert_eq!(config.upload_max_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn upload_limit_is_configurable() {
        let config = config_from(&[("UPLOAD_MAX_BYTES", "1048576")]).unwrap();
        assert_eq!(config.upload_max_bytes, 1024 * 1024);
        let config = config_from(&[("UPLOAD_MAX_BYTES", "big")]).unwrap();
        assert_eq!(config.upload_max_bytes, DEFAULT_UPLOAD_MAX_BYTES);
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn bad_tuning_values_fall_back_to_defaults() {
        let config =
            config_from(&[("SEARCH_MAX_RESULTS", "lots"), ("LOGIN_ATTEMPTS_PER_MINUTE", "-1")])
                .unwrap();
        assert_eq!(config.max_results, 101);
        assert_eq!(config.login_attempts_per_minute, 5);
    }

    #[test]
    fn short_session_secret_is_rejected() {
        assert!(config_from(&[("SESSION_SECRET", "too-short")]).is_err());
        let secret = "x".repeat(32);
        let config = config_from(&[("SESSION_SECRET", secret.as_str())]).unwrap();
        assert_eq!(config.session_secret.as_deref(), Some(secret.as_str()));
    }

    #[test]
    fn blank_admin_password_disables_login() {
        let config = config_from(&[("ADMIN_PASSWORD", "   ")]).unwrap();
        assert!(config.admin_password.is_none());
    }
}
