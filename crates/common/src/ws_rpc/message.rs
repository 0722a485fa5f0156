/// JSON-RPC 2.0 消息定义

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 协议版本
pub const JSONRPC_VERSION: &str = "2.0";

/// RPC 请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,

    /// 关联 ID
    pub id: u64,

    pub method: String,

    /// 参数（为空时不写出）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    /// 创建请求消息
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// RPC 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,

    pub id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

/// 响应中的错误对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    /// 创建成功响应
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// 创建错误响应
    pub fn failure(id: u64, code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id,
            result: None,
            error: Some(RpcErrorObject {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// 错误对象转为 RpcError，成功时返回 result
    pub fn into_result(self) -> Result<Option<Value>, super::RpcError> {
        match self.error {
            Some(err) => Err(super::RpcError::remote(err)),
            None => Ok(self.result),
        }
    }
}

/// 服务端推送的通知（没有 id）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,

    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// 收到的消息
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Response(RpcResponse),
    Notification(RpcNotification),
}

impl Incoming {
    /// 从 JSON 字符串解析，带 id 的是响应，否则按通知处理
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        let has_id = value.get("id").map(|id| !id.is_null()).unwrap_or(false);
        if has_id {
            Ok(Self::Response(serde_json::from_value(value)?))
        } else {
            Ok(Self::Notification(serde_json::from_value(value)?))
        }
    }
}
