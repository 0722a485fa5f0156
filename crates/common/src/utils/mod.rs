/// 工具函数集合

use std::sync::atomic::{AtomicU64, Ordering};

/// 单调递增的请求 ID 生成器，从 1 开始
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// 获取下一个 ID
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 拼接 REST API 地址: http://{host}:{port}/api{path}
pub fn api_url(host: &str, port: u16, path: &str) -> String {
    format!("http://{}:{}/api{}", host, port, path)
}

/// 拼接 WebSocket 地址: ws://{host}:{port}
pub fn ws_url(host: &str, port: u16) -> String {
    format!("ws://{}:{}", host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator_is_monotonic() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.next_id(), 3);
    }

    #[test]
    fn test_api_url() {
        assert_eq!(api_url("h", 1, "/shows"), "http://h:1/api/shows");
        assert_eq!(
            api_url("localhost", 8088, "/add/Elementary"),
            "http://localhost:8088/api/add/Elementary"
        );
    }

    #[test]
    fn test_ws_url() {
        assert_eq!(ws_url("kodi", 9090), "ws://kodi:9090");
    }
}
