/// 配置管理

use common::{ConnectionProperties, Error, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// rssdldmng REST 服务
    pub rssdld: ConnectionProperties,

    /// Kodi WebSocket 服务
    pub kodi: ConnectionProperties,

    /// 是否开启调试日志
    pub debug: bool,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rssdld_host = lookup("RSSDLD_HOST").unwrap_or_else(|| "localhost".to_string());
        let rssdld_port = parse_or(&lookup, "RSSDLD_PORT", 8088u16)?;

        let kodi_host = lookup("KODI_HOST").unwrap_or_else(|| "localhost".to_string());
        let kodi_port = parse_or(&lookup, "KODI_PORT", 9090u16)?;
        let kodi_timeout_ms = parse_or(&lookup, "KODI_TIMEOUT_MS", 1000u64)?;

        let mut kodi = ConnectionProperties::new(kodi_host, kodi_port)
            .with_timeout(Duration::from_millis(kodi_timeout_ms));
        if let Some(raw) = lookup("KODI_RESPONSE_TIMEOUT_MS") {
            let ms: u64 = parse_value("KODI_RESPONSE_TIMEOUT_MS", &raw)?;
            kodi = kodi.with_response_timeout(Duration::from_millis(ms));
        }

        let debug = lookup("DEBUG")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            rssdld: ConnectionProperties::new(rssdld_host, rssdld_port),
            kodi,
            debug,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("{}={:?}: {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.rssdld.host, "localhost");
        assert_eq!(cfg.rssdld.port, 8088);
        assert_eq!(cfg.kodi.port, 9090);
        assert_eq!(cfg.kodi.timeout, Duration::from_secs(1));
        assert!(cfg.kodi.response_timeout.is_none());
        assert!(!cfg.debug);
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("KODI_HOST", "htpc"),
            ("KODI_PORT", "9091"),
            ("KODI_TIMEOUT_MS", "200"),
            ("KODI_RESPONSE_TIMEOUT_MS", "5000"),
            ("DEBUG", "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.kodi.host, "htpc");
        assert_eq!(cfg.kodi.port, 9091);
        assert_eq!(cfg.kodi.timeout, Duration::from_millis(200));
        assert_eq!(cfg.kodi.response_timeout, Some(Duration::from_secs(5)));
        assert!(cfg.debug);
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[("RSSDLD_PORT", "http")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("RSSDLD_PORT")));
    }
}
