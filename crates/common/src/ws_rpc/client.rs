/// WebSocket RPC 客户端辅助工具

use super::{Incoming, RpcError, RpcResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::debug;

/// RPC 响应等待器
type ResponseWaiter = oneshot::Sender<Result<RpcResponse, RpcError>>;

/// 待响应请求表（request_id -> response_sender）
///
/// 每个在途请求独占一个表项，命中、超时或连接关闭时移除。
#[derive(Clone, Default)]
pub struct PendingRequests {
    inner: Arc<RwLock<HashMap<u64, ResponseWaiter>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册等待响应，返回接收端
    pub async fn register(&self, id: u64) -> oneshot::Receiver<Result<RpcResponse, RpcError>> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.inner.write().await;
        pending.insert(id, tx);
        rx
    }

    /// 用收到的响应唤醒对应的等待器，找不到时返回 false
    pub async fn complete(&self, response: RpcResponse) -> bool {
        let waiter = {
            let mut pending = self.inner.write().await;
            pending.remove(&response.id)
        };
        match waiter {
            Some(waiter) => {
                let _ = waiter.send(Ok(response));
                true
            }
            None => false,
        }
    }

    /// 移除等待器（发送失败或超时）
    pub async fn remove(&self, id: u64) -> bool {
        let mut pending = self.inner.write().await;
        pending.remove(&id).is_some()
    }

    /// 获取待处理请求数量
    pub async fn pending_count(&self) -> usize {
        let pending = self.inner.read().await;
        pending.len()
    }

    /// 清理所有待处理的请求
    pub async fn clear_pending(&self) {
        let mut pending = self.inner.write().await;
        for (id, waiter) in pending.drain() {
            debug!("清理待处理请求: {}", id);
            let _ = waiter.send(Err(RpcError::connection_closed()));
        }
    }
}

/// 消息编解码辅助函数
pub mod codec {
    use super::*;

    /// 解码 WebSocket 文本为 RPC 消息
    pub fn decode_text(text: &str) -> Result<Incoming, RpcError> {
        Incoming::from_json(text).map_err(RpcError::serialization_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws_rpc::RpcErrorCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_complete_wakes_matching_waiter() {
        let pending = PendingRequests::new();
        let rx1 = pending.register(1).await;
        let rx2 = pending.register(2).await;
        assert_eq!(pending.pending_count().await, 2);

        assert!(pending.complete(RpcResponse::success(2, json!("two"))).await);
        assert!(pending.complete(RpcResponse::success(1, json!("one"))).await);

        assert_eq!(rx1.await.unwrap().unwrap().result, Some(json!("one")));
        assert_eq!(rx2.await.unwrap().unwrap().result, Some(json!("two")));
        assert_eq!(pending.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_complete_unknown_id() {
        let pending = PendingRequests::new();
        let _rx = pending.register(1).await;
        assert!(!pending.complete(RpcResponse::success(99, json!(null))).await);
        assert_eq!(pending.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_clear_pending_fails_waiters() {
        let pending = PendingRequests::new();
        let rx = pending.register(5).await;
        pending.clear_pending().await;

        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.code, RpcErrorCode::ConnectionClosed);
        assert_eq!(pending.pending_count().await, 0);
    }

    #[test]
    fn test_codec() {
        let decoded = codec::decode_text(r#"{"id":1,"result":"pong"}"#).unwrap();
        assert!(matches!(decoded, Incoming::Response(ref r) if r.id == 1));

        let err = codec::decode_text("not json").unwrap_err();
        assert_eq!(err.code, RpcErrorCode::SerializationError);
    }
}
