/// WebSocket RPC 模块
/// 
/// JSON-RPC 2.0 消息、错误和请求关联工具

pub mod message;
pub mod error;
pub mod client;

pub use message::{
    Incoming, RpcErrorObject, RpcNotification, RpcRequest, RpcResponse, JSONRPC_VERSION,
};
pub use error::{RpcError, RpcErrorCode, CONNECT_FAILED_MESSAGE};
pub use client::{codec, PendingRequests};
