// src/config.rs
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub allowed_hosts: Vec<String>,
    pub redis_url: String,
    pub storage_dir: PathBuf,
    pub public_base_url: String,
    pub processing_workers: usize,
    pub fetch_timeout: Duration,
    pub max_http_connections: usize,
    pub quality_zero_is_default: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let allowed_hosts = get("ALLOWED_HOSTS", "")
            .split(',')
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        let processing_workers: usize = get("PROCESSING_WORKERS", "1")
            .parse()
            .context("PROCESSING_WORKERS must be a positive integer")?;
        if processing_workers == 0 {
            anyhow::bail!("PROCESSING_WORKERS must be at least 1");
        }

        let fetch_timeout_secs: u64 = get("FETCH_TIMEOUT_SECS", "30")
            .parse()
            .context("FETCH_TIMEOUT_SECS must be an integer")?;

        let max_http_connections: usize = get("MAX_HTTP_CONNECTIONS", "256")
            .parse()
            .context("MAX_HTTP_CONNECTIONS must be an integer")?;

        let quality_zero_is_default = parse_bool(&get("QUALITY_ZERO_IS_DEFAULT", "false"))
            .context("QUALITY_ZERO_IS_DEFAULT must be true or false")?;

        Ok(Self {
            bind_addr: get("BIND_ADDR", "0.0.0.0:3000"),
            allowed_hosts,
            redis_url: get("REDIS_URL", "redis://127.0.0.1:6379"),
            storage_dir: PathBuf::from(get("STORAGE_DIR", "./objects")),
            public_base_url: get("PUBLIC_BASE_URL", "http://localhost:3000/objects")
                .trim_end_matches('/')
                .to_string(),
            processing_workers,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            max_http_connections,
            quality_zero_is_default,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean '{}'", other),
    }
}
