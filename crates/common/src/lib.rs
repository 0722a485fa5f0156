/// rssdld remote - 公共库
/// 
/// 提供 REST 客户端和 Kodi RPC 客户端共享的类型、错误处理、日志和工具函数

pub mod errors;
pub mod logger;
pub mod models;
pub mod utils;
pub mod ws_rpc;

// 重新导出常用类型
pub use errors::{Error, Result};
pub use logger::{LogLevel, LogSink, Logger, MemorySink};
pub use models::ConnectionProperties;
pub use ws_rpc::{RpcError, RpcErrorCode, RpcRequest, RpcResponse};
