/// 命令行定义

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::{RestClient, RpcSocketClient};

#[derive(Parser, Debug)]
#[command(name = "remote", about = "rssdldmng / Kodi 远程控制")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// 列出正在跟踪的剧集
    Shows,
    /// 最近下载的剧集
    Latest,
    /// 服务端配置
    Config,
    /// 服务状态
    Status,
    /// 添加跟踪的剧集
    Add { name: String },
    /// 移除跟踪的剧集
    Remove { name: String },
    /// 检查 Kodi 是否在线
    Ping,
    /// 调用任意 Kodi JSON-RPC 方法
    Kodi {
        method: String,
        /// JSON 格式的参数
        #[arg(value_parser = parse_json)]
        params: Option<Value>,
    },
}

impl Command {
    /// 是否需要 Kodi 连接
    pub fn needs_kodi(&self) -> bool {
        matches!(self, Self::Ping | Self::Kodi { .. })
    }
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("无效的 JSON 参数: {}", e))
}

/// 执行命令，返回要打印的结果
pub async fn run(
    command: Command,
    rest: &RestClient,
    kodi: Option<&RpcSocketClient>,
) -> anyhow::Result<Value> {
    let result = match command {
        Command::Shows => serde_json::to_value(rest.shows().await?)?,
        Command::Latest => rest.latest().await?,
        Command::Config => rest.config().await?,
        Command::Status => rest.status().await?,
        Command::Add { name } => {
            rest.add_show(&name).await?;
            Value::Null
        }
        Command::Remove { name } => {
            rest.remove_show(&name).await?;
            Value::Null
        }
        Command::Ping => {
            let kodi = kodi.ok_or_else(|| anyhow::anyhow!("Kodi 客户端未初始化"))?;
            kodi.ping().await?.unwrap_or(Value::Null)
        }
        Command::Kodi { method, params } => {
            let kodi = kodi.ok_or_else(|| anyhow::anyhow!("Kodi 客户端未初始化"))?;
            kodi.call(&method, params).await?.into_result()?.unwrap_or(Value::Null)
        }
    };
    Ok(result)
}
