use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use counter_core::error::{CounterError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub store: StoreSection,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            store: StoreSection::default(),
        }
    }
}

impl CounterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CounterError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.store.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_read_header_timeout_ms")]
    pub read_header_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            read_header_timeout_ms: default_read_header_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(100..=60000).contains(&self.read_header_timeout_ms) {
            return Err(CounterError::Config(
                "server.read_header_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if !(10..=600000).contains(&self.request_timeout_ms) {
            return Err(CounterError::Config(
                "server.request_timeout_ms must be between 10 and 600000".into(),
            ));
        }
        Ok(())
    }

    /// Listen address; a bare `:port` binds every interface.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = with_default_host(&self.listen, "0.0.0.0");
        addr.parse().map_err(|e| {
            CounterError::Config(format!("server.listen {:?} is not a socket address: {e}", self.listen))
        })
    }

    pub fn read_header_timeout(&self) -> Duration {
        Duration::from_millis(self.read_header_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Redis => "redis",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_store_addr")]
    pub addr: String,

    #[serde(default = "default_key")]
    pub key: String,

    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    /// Cap on live store connections, idle ones included.
    #[serde(default = "default_max_open")]
    pub max_open: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            addr: default_store_addr(),
            key: default_key(),
            timeout_ms: default_store_timeout_ms(),
            max_idle: default_max_idle(),
            max_open: default_max_open(),
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        let port_ok = self
            .addr
            .rsplit_once(':')
            .is_some_and(|(_, port)| port.parse::<u16>().is_ok_and(|p| p != 0));
        if !port_ok {
            return Err(CounterError::Config(format!(
                "store.addr {:?} must be host:port",
                self.addr
            )));
        }
        if self.key.is_empty() {
            return Err(CounterError::Config("store.key must not be empty".into()));
        }
        if !(10..=60000).contains(&self.timeout_ms) {
            return Err(CounterError::Config(
                "store.timeout_ms must be between 10 and 60000".into(),
            ));
        }
        if !(1..=1024).contains(&self.max_idle) {
            return Err(CounterError::Config(
                "store.max_idle must be between 1 and 1024".into(),
            ));
        }
        if !(1..=4096).contains(&self.max_open) {
            return Err(CounterError::Config(
                "store.max_open must be between 1 and 4096".into(),
            ));
        }
        if self.max_idle > self.max_open {
            return Err(CounterError::Config(
                "store.max_idle must not exceed store.max_open".into(),
            ));
        }
        Ok(())
    }

    /// Address to dial; a bare `:port` means the local host.
    pub fn dial_addr(&self) -> String {
        with_default_host(&self.addr, "127.0.0.1")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn with_default_host(addr: &str, host: &str) -> String {
    if addr.starts_with(':') {
        format!("{host}{addr}")
    } else {
        addr.to_owned()
    }
}

fn default_listen() -> String {
    ":3000".into()
}
fn default_read_header_timeout_ms() -> u64 {
    1000
}
fn default_request_timeout_ms() -> u64 {
    5000
}
fn default_store_addr() -> String {
    ":6379".into()
}
fn default_key() -> String {
    "counter".into()
}
fn default_store_timeout_ms() -> u64 {
    3000
}
fn default_max_idle() -> usize {
    16
}
fn default_max_open() -> usize {
    64
}
