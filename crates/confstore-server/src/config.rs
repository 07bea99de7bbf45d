use std::net::SocketAddr;
use std::path::Path;

use confstore_store::ConsulConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const ENV_BIND_ADDR: &str = "CONFSTORE_BIND_ADDR";
pub const ENV_CONSUL_ADDR: &str = "CONFSTORE_CONSUL_ADDR";
pub const ENV_CONSUL_TOKEN: &str = "CONFSTORE_CONSUL_TOKEN";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// How long open connections may drain after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Preload a small set of example configs and one group at startup.
    pub seed_demo_data: bool,
    pub backend: BackendConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            shutdown_timeout_secs: 10,
            seed_demo_data: false,
            backend: BackendConfig::Memory,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Which repository implementation backs the service. Fixed for the process
/// lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    #[default]
    Memory,
    Consul(ConsulConfig),
}

/// Global token-bucket limit applied to every route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_minute: u32,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 10,
            burst: 1,
        }
    }
}

impl ServerConfig {
    /// Load from an optional TOML file, then apply `CONFSTORE_*` environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply overrides from `lookup`. Setting a Consul address switches the
    /// backend to Consul.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ServerResult<()> {
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("{ENV_BIND_ADDR}={addr:?}: {e}")))?;
        }
        if let Some(address) = lookup(ENV_CONSUL_ADDR) {
            match &mut self.backend {
                BackendConfig::Consul(consul) => consul.address = address,
                BackendConfig::Memory => {
                    self.backend = BackendConfig::Consul(ConsulConfig {
                        address,
                        ..ConsulConfig::default()
                    });
                }
            }
        }
        if let Some(token) = lookup(ENV_CONSUL_TOKEN) {
            if let BackendConfig::Consul(consul) = &mut self.backend {
                consul.token = Some(token);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.backend, BackendConfig::Memory);
        assert!(c.rate_limit.enabled);
        assert_eq!(c.rate_limit.requests_per_minute, 10);
        assert_eq!(c.rate_limit.burst, 1);
        assert_eq!(c.shutdown_timeout_secs, 10);
        assert!(!c.seed_demo_data);
    }

    #[test]
    fn parses_consul_backend_from_toml() {
        let text = r#"
            bind_addr = "127.0.0.1:9000"

            [backend]
            kind = "consul"
            address = "consul:8500"

            [rate_limit]
            enabled = false
        "#;
        let c: ServerConfig = toml::from_str(text).unwrap();
        assert_eq!(c.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        match c.backend {
            BackendConfig::Consul(consul) => {
                assert_eq!(consul.address, "consul:8500");
                assert_eq!(consul.timeout_ms, 5_000);
                assert!(consul.token.is_none());
            }
            other => panic!("unexpected backend: {other:?}"),
        }
        assert!(!c.rate_limit.enabled);
        assert_eq!(c.rate_limit.requests_per_minute, 10);
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed_demo_data = true\nshutdown_timeout_secs = 3").unwrap();
        let c = ServerConfig::from_file(file.path()).unwrap();
        assert!(c.seed_demo_data);
        assert_eq!(c.shutdown_timeout_secs, 3);
        assert_eq!(c.backend, BackendConfig::Memory);
    }

    #[test]
    fn from_file_reports_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = 42").unwrap();
        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn env_consul_addr_switches_backend() {
        let mut c = ServerConfig::default();
        c.apply_env(env(&[
            (ENV_CONSUL_ADDR, "10.0.0.5:8500"),
            (ENV_CONSUL_TOKEN, "secret"),
        ]))
        .unwrap();
        assert_eq!(
            c.backend,
            BackendConfig::Consul(ConsulConfig {
                address: "10.0.0.5:8500".into(),
                token: Some("secret".into()),
                timeout_ms: 5_000,
            })
        );
    }

    #[test]
    fn env_token_alone_keeps_memory_backend() {
        let mut c = ServerConfig::default();
        c.apply_env(env(&[(ENV_CONSUL_TOKEN, "secret")])).unwrap();
        assert_eq!(c.backend, BackendConfig::Memory);
    }

    #[test]
    fn env_bind_addr_must_parse() {
        let mut c = ServerConfig::default();
        let err = c.apply_env(env(&[(ENV_BIND_ADDR, "not-an-addr")])).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));

        c.apply_env(env(&[(ENV_BIND_ADDR, "127.0.0.1:8080")])).unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
    }
}
