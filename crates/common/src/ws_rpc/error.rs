/// WebSocket RPC 错误定义

use super::message::RpcErrorObject;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 连接等待耗尽时报告的消息
pub const CONNECT_FAILED_MESSAGE: &str = "Could not connect to Kodi!";

/// RPC 错误码
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RpcErrorCode {
    InternalError,
    Timeout,
    ConnectionClosed,
    ConnectionFailed,
    SerializationError,

    /// 服务端在响应中返回的错误
    Remote,
}

impl RpcErrorCode {
    /// 转换为字符串码
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InternalError => "INTERNAL_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::ConnectionClosed => "CONNECTION_CLOSED",
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::Remote => "REMOTE_ERROR",
        }
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// RPC 错误
#[derive(Debug, Clone)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl RpcError {
    /// 创建新的 RPC 错误
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// 内部错误
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }

    /// 超时错误
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Timeout, message)
    }

    /// 连接关闭错误
    pub fn connection_closed() -> Self {
        Self::new(RpcErrorCode::ConnectionClosed, "连接已关闭")
    }

    /// 连接等待耗尽
    pub fn connection_failed() -> Self {
        Self::new(RpcErrorCode::ConnectionFailed, CONNECT_FAILED_MESSAGE)
    }

    /// 序列化错误
    pub fn serialization_error(err: impl fmt::Display) -> Self {
        Self::new(
            RpcErrorCode::SerializationError,
            format!("序列化错误: {}", err),
        )
    }

    /// 服务端返回的错误
    pub fn remote(err: RpcErrorObject) -> Self {
        let mut rpc_err = Self::new(RpcErrorCode::Remote, err.message);
        rpc_err.details = err.data;
        rpc_err
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_error(err)
    }
}

impl From<RpcError> for crate::Error {
    fn from(err: RpcError) -> Self {
        crate::Error::Internal(err.to_string())
    }
}
