/// rssdld remote
/// 
/// 命令行入口：读取环境配置，调用 rssdldmng REST API 或 Kodi JSON-RPC

use clap::Parser;
use common::Logger;
use remote::cli::{self, Cli};
use remote::config::Config;
use remote::{RestClient, RpcSocketClient};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // 加载配置
    dotenvy::dotenv().ok();
    let cfg = Config::from_env()?;

    // 初始化日志
    // 可以通过环境变量 RUST_LOG 设置日志级别，例如：
    // RUST_LOG=remote=debug remote shows
    // DEBUG=true 时默认级别为 debug，Logger 的 DBG/ERR 输出才可见
    let default_level = if cfg.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
        )
        .init();
    info!("✅ 配置加载成功");

    let logger = Logger::new(cfg.debug);
    let rest = RestClient::new(cfg.rssdld.clone(), logger.clone());

    let kodi = if args.command.needs_kodi() {
        info!("🎯 连接到 Kodi: {}:{}", cfg.kodi.host, cfg.kodi.port);
        let client = RpcSocketClient::connect(cfg.kodi.clone(), logger.clone());
        client
            .set_on_error(|message| eprintln!("{}", message))
            .await;
        Some(client)
    } else {
        None
    };

    let result = cli::run(args.command, &rest, kodi.as_ref()).await;

    if let Some(client) = &kodi {
        client.close();
    }

    let value = result?;
    if !value.is_null() {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    Ok(())
}
