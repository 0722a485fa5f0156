/// 共享数据模型

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 默认连接等待间隔
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// 连接属性
///
/// 构造后不可变，由持有它的客户端独占。REST 客户端忽略 timeout。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionProperties {
    pub host: String,
    pub port: u16,

    /// 等待连接就绪时每次轮询的间隔
    #[serde(default = "default_timeout", with = "duration_millis")]
    pub timeout: Duration,

    /// 单次调用等待响应的上限，None 表示一直等待
    #[serde(default, with = "option_duration_millis")]
    pub response_timeout: Option<Duration>,
}

impl ConnectionProperties {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
            response_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

mod option_duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let props = ConnectionProperties::new("kodi.local", 9090);
        assert_eq!(props.timeout, DEFAULT_TIMEOUT);
        assert!(props.response_timeout.is_none());
    }

    #[test]
    fn test_deserialize_millis() {
        let props: ConnectionProperties = serde_json::from_value(json!({
            "host": "localhost",
            "port": 9090,
            "timeout": 250,
            "response_timeout": 5000
        }))
        .unwrap();

        assert_eq!(props.timeout, Duration::from_millis(250));
        assert_eq!(props.response_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_deserialize_without_timeouts() {
        let props: ConnectionProperties =
            serde_json::from_value(json!({"host": "h", "port": 1})).unwrap();
        assert_eq!(props.timeout, DEFAULT_TIMEOUT);
        assert_eq!(props.response_timeout, None);
    }
}
