//! 客户端设置
//!
//! 目前只有中继地址，来自命令行的可选 `host:port` 参数。

use anyhow::{Context, Result};
use protocol::NetworkConfig;

/// 解析 `host:port`；缺省时使用默认地址
pub fn network_config(arg: Option<&str>) -> Result<NetworkConfig> {
    let Some(arg) = arg else {
        return Ok(NetworkConfig::default());
    };

    let (host, port) = arg
        .rsplit_once(':')
        .with_context(|| format!("Expected host:port, got {:?}", arg))?;
    if host.is_empty() {
        anyhow::bail!("Missing host in {:?}", arg);
    }
    let port = port
        .parse::<u16>()
        .with_context(|| format!("Invalid port in {:?}", arg))?;

    Ok(NetworkConfig {
        host: host.to_string(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address() {
        assert_eq!(network_config(None).unwrap(), NetworkConfig::default());
    }

    #[test]
    fn test_parse_address() {
        let config = network_config(Some("10.0.0.5:7000")).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 7000);
        assert_eq!(config.addr(), "10.0.0.5:7000");
    }

    #[test]
    fn test_bad_address() {
        assert!(network_config(Some("localhost")).is_err());
        assert!(network_config(Some(":9593")).is_err());
        assert!(network_config(Some("localhost:http")).is_err());
    }
}
