//! Service configuration: a JSON file (loaded via `serde_json`) overlaid on
//! built-in defaults. These fields size the engine's hard caps; they are
//! not an escape hatch for raising them past what the engine treats as an
//! invariant violation.

use std::path::Path;

use engine_core::EngineLimits;
use serde::Deserialize;

use crate::error::TransportError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub tcp_listen_addr: String,
    pub multicast_addr: String,
    pub max_symbols: usize,
    pub max_price_levels_per_side: usize,
    pub max_orders_per_price_level: usize,
    pub max_match_iterations: usize,
    pub inbound_queue_capacity: usize,
    pub multicast_queue_capacity: usize,
    /// Symbols to pre-register at startup via `MatchingEngine::register_symbol`,
    /// so their books exist (and count against `max_symbols`) before the
    /// first order naming them arrives.
    pub known_symbols: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> ServiceConfig {
        let limits = EngineLimits::default();
        ServiceConfig {
            tcp_listen_addr: "0.0.0.0:7878".to_string(),
            multicast_addr: "239.1.1.1:30001".to_string(),
            max_symbols: limits.max_symbols,
            max_price_levels_per_side: limits.max_price_levels_per_side,
            max_orders_per_price_level: limits.max_orders_per_price_level,
            max_match_iterations: limits.max_match_iterations,
            inbound_queue_capacity: 65_536,
            multicast_queue_capacity: 65_536,
            known_symbols: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Loads from `path` if given, falling back to defaults when `path` is
    /// `None`. A present-but-unreadable or malformed file is an error; a
    /// simply-absent path is not.
    pub fn load(path: Option<&Path>) -> Result<ServiceConfig, TransportError> {
        match path {
            None => Ok(ServiceConfig::default()),
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let config = serde_json::from_str(&text)?;
                Ok(config)
            }
        }
    }

    pub fn engine_limits(&self) -> EngineLimits {
        EngineLimits {
            max_symbols: self.max_symbols,
            max_price_levels_per_side: self.max_price_levels_per_side,
            max_orders_per_price_level: self.max_orders_per_price_level,
            max_match_iterations: self.max_match_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_engine_limits_defaults() {
        let config = ServiceConfig::default();
        let limits = config.engine_limits();
        assert_eq!(limits, EngineLimits::default());
    }

    #[test]
    fn missing_path_falls_back_to_defaults() {
        let config = ServiceConfig::load(None).unwrap();
        assert_eq!(config.tcp_listen_addr, "0.0.0.0:7878");
    }

    #[test]
    fn loads_partial_overrides_from_json() {
        let dir = std::env::temp_dir();
        let path = dir.join("transport_test_config.json");
        std::fs::write(&path, r#"{"tcp_listen_addr": "127.0.0.1:9000"}"#).unwrap();

        let config = ServiceConfig::load(Some(&path)).unwrap();
        assert_eq!(config.tcp_listen_addr, "127.0.0.1:9000");
        assert_eq!(config.multicast_addr, ServiceConfig::default().multicast_addr);

        std::fs::remove_file(&path).ok();
    }
}
