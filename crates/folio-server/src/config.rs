// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Server settings, read from the environment (after `.env` is applied).

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";

pub const PORT_VAR: &str = "PORT";
pub const UPLOAD_DIR_VAR: &str = "UPLOAD_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

impl ServerConfig {
    /// Read `PORT` and `UPLOAD_DIR` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`. Missing or blank values take their
    /// defaults; an unparsable port is logged and replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(PORT_VAR).filter(|v| !v.trim().is_empty()) {
            match raw.trim().parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(value = %raw, "Invalid PORT, using {DEFAULT_PORT}"),
            }
        }
        if let Some(dir) = lookup(UPLOAD_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.upload_dir = PathBuf::from(dir);
        }

        config
    }

    /// Listen on every interface.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(ServerConfig::from_lookup(lookup(&[])), ServerConfig::default());
    }

    #[test]
    fn reads_port_and_directory() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080"), ("UPLOAD_DIR", "/srv/docs")]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.bind_addr().port(), 8080);
    }

    #[test]
    fn bad_port_falls_back() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "http"), ("UPLOAD_DIR", " ")]));
        assert_eq!(config, ServerConfig::default());
    }
}
