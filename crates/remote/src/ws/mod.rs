/// WebSocket 客户端模块
/// 
/// 通过 WebSocket 向 Kodi 发送 JSON-RPC 请求

pub mod client;
pub mod socket;

pub use client::{ResponseCallback, RpcSocketClient, SEND_ATTEMPTS};
pub use socket::{ReadyState, RpcSocket, SocketEvent, TungsteniteSocket};
