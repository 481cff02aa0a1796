//! Configuration module for Sockrelay
//!
//! This module provides configuration types and parsing for the relay.

mod relay;
mod tcp;

pub use relay::{ListenConfig, RelayConfig, UpstreamConfig, MAX_CREDENTIAL_LEN};
pub use tcp::TcpConfig;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RelayConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> Result<RelayConfig> {
    let config: RelayConfig =
        toml::from_str(content).with_context(|| "Failed to parse configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config_str = r#"
[upstream]
host = "1.2.3.4"
port = 1337
username = "ProxyUsername"
password = "ProxyPassword"
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.upstream.host, "1.2.3.4");
        assert_eq!(config.upstream.port, 1337);
        assert_eq!(config.upstream.username, "ProxyUsername");
        assert_eq!(config.listen.port, 0);
        assert!(config.upstream.connect_timeout.is_none());
        assert_eq!(config.tcp, TcpConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[listen]
bind_addr = "127.0.0.1"
port = 41337

[upstream]
host = "proxy.example.com"
port = 1080
username = "user"
password = "pass"
connect_timeout = 15

[tcp]
nodelay = false
keepalive_secs = 30
keepalive_interval = 10
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.listen.bind_addr.to_string(), "127.0.0.1");
        assert_eq!(config.listen.port, 41337);
        assert_eq!(config.upstream.connect_timeout, Some(15));
        assert!(!config.tcp.nodelay);
        assert_eq!(config.tcp.keepalive_secs, 30);
    }

    #[test]
    fn test_parse_missing_upstream() {
        assert!(parse_config("[listen]\nport = 1\n").is_err());
    }

    #[test]
    fn test_parse_rejects_long_username() {
        let config_str = format!(
            "[upstream]\nhost = \"h\"\nport = 1\nusername = \"{}\"\npassword = \"p\"\n",
            "u".repeat(256)
        );
        let err = parse_config(&config_str).unwrap_err();
        assert!(format!("{:#}", err).contains("username"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[upstream]\nhost = \"10.0.0.1\"\nport = 9050\nusername = \"a\"\npassword = \"b\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.upstream.addr(), "10.0.0.1:9050");
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/sockrelay.toml").unwrap_err();
        assert!(format!("{}", err).contains("Failed to read config file"));
    }
}
