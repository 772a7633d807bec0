//! 中继服务端配置
//!
//! 配置文件为 JSON，缺省字段使用默认值。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use protocol::{DEFAULT_PORT, MAX_CONNECTIONS};
use serde::{Deserialize, Serialize};

/// 中继配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// 监听地址
    pub bind_addr: String,
    /// 同时存活的最大连接数
    pub max_connections: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_connections: MAX_CONNECTIONS,
        }
    }
}

impl RelayConfig {
    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: RelayConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        if config.max_connections == 0 {
            anyhow::bail!("max_connections must be at least 1");
        }
        Ok(config)
    }

    /// 有路径就加载，否则使用默认配置
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:9593");
        assert_eq!(config.max_connections, 20);
        assert_eq!(RelayConfig::from_optional_path(None).unwrap(), config);
    }

    #[test]
    fn test_load_config() {
        let file = write_config(r#"{ "bind_addr": "127.0.0.1:7000", "max_connections": 4 }"#);
        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:7000");
        assert_eq!(config.max_connections, 4);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = write_config(r#"{ "max_connections": 2 }"#);
        let config = RelayConfig::from_optional_path(Some(file.path())).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9593");
        assert_eq!(config.max_connections, 2);
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config("not json");
        assert!(RelayConfig::load(file.path()).is_err());

        let file = write_config(r#"{ "max_connections": 0 }"#);
        assert!(RelayConfig::load(file.path()).is_err());

        let dir = tempfile::tempdir().unwrap();
        assert!(RelayConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
