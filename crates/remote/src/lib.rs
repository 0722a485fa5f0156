/// rssdld remote
/// 
/// rssdldmng REST 客户端和 Kodi JSON-RPC WebSocket 客户端

pub mod cli;
pub mod config;
pub mod rest;
pub mod ws;

pub use rest::RestClient;
pub use ws::RpcSocketClient;
