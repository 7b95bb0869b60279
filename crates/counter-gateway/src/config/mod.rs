//! Counter config loader (strict parsing + environment override).
//!
//! Resolution order: YAML file named by `COUNTER_CONFIG` (all defaults when
//! unset), then `REDIS_ADDR` replaces `store.addr`, then validation.

pub mod schema;

use std::fs;

use counter_core::error::{CounterError, Result};

pub use schema::{CounterConfig, ServerSection, StoreBackend, StoreSection};

/// Path of an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "COUNTER_CONFIG";
/// Store address override.
pub const REDIS_ADDR_ENV: &str = "REDIS_ADDR";

pub fn load_from_file(path: &str) -> Result<CounterConfig> {
    let cfg = parse_file(path)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<CounterConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the process configuration from the environment.
pub fn resolve() -> Result<CounterConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).ok();
    let redis_addr = std::env::var(REDIS_ADDR_ENV).ok();
    resolve_with(path.as_deref(), redis_addr.as_deref())
}

/// Same as [`resolve`] with the environment passed in explicitly.
pub fn resolve_with(path: Option<&str>, redis_addr: Option<&str>) -> Result<CounterConfig> {
    let mut cfg = match path.filter(|p| !p.is_empty()) {
        Some(p) => parse_file(p)?,
        None => CounterConfig::default(),
    };

    if let Some(addr) = redis_addr.filter(|a| !a.is_empty()) {
        cfg.store.addr = addr.to_owned();
    }

    cfg.validate()?;
    Ok(cfg)
}

fn parse_file(path: &str) -> Result<CounterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| CounterError::Config(format!("read config {path} failed: {e}")))?;
    parse_str(&s)
}

fn parse_str(s: &str) -> Result<CounterConfig> {
    serde_yaml::from_str(s).map_err(|e| CounterError::Config(format!("invalid yaml: {e}")))
}
