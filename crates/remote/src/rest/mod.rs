/// rssdldmng REST 客户端
///
/// 对 http://{host}:{port}/api{path} 发起 GET/PUT，回调式接口不向调用方报告失败

pub mod transport;

pub use transport::{HttpTransport, ReqwestTransport};

use common::utils::api_url;
use common::{ConnectionProperties, Logger, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// 路径段中保留原样的字符之外全部编码（RFC 3986 unreserved）
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// GET 响应回调
pub type ResponseCallback = Box<dyn FnOnce(Value) + Send + 'static>;

/// REST 客户端
#[derive(Clone)]
pub struct RestClient {
    props: ConnectionProperties,
    logger: Logger,
    transport: Arc<dyn HttpTransport>,
}

impl RestClient {
    /// 使用 reqwest 传输创建客户端
    pub fn new(props: ConnectionProperties, logger: Logger) -> Self {
        Self::with_transport(props, logger, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(
        props: ConnectionProperties,
        logger: Logger,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            props,
            logger,
            transport,
        }
    }

    pub fn props(&self) -> &ConnectionProperties {
        &self.props
    }

    /// 完整请求地址
    pub fn url(&self, path: &str) -> String {
        api_url(&self.props.host, self.props.port, path)
    }

    /// 发起 GET，成功时以响应体调用回调；失败不通知调用方
    pub fn get(&self, path: &str, on_response: Option<ResponseCallback>) -> JoinHandle<()> {
        let client = self.clone();
        let path = path.to_string();
        tokio::spawn(async move {
            match client.fetch(&path).await {
                Ok(body) => {
                    if let Some(callback) = on_response {
                        callback(body);
                    }
                }
                Err(e) => trace!("GET {} 失败: {}", path, e),
            }
        })
    }

    /// 发起 PUT，成功时写一条调试日志；不向调用方返回结果
    pub fn put(&self, path: &str, data: Option<Value>) -> JoinHandle<()> {
        let client = self.clone();
        let path = path.to_string();
        tokio::spawn(async move {
            match client.update(&path, data).await {
                Ok(()) => client.logger.debug("PUT completed"),
                Err(e) => trace!("PUT {} 失败: {}", path, e),
            }
        })
    }

    /// GET 并返回解析后的响应体
    pub async fn fetch(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        debug!("GET {}", url);
        self.transport.get(&url).await
    }

    /// PUT JSON 请求体，data 为空时发送 null
    pub async fn update(&self, path: &str, data: Option<Value>) -> Result<()> {
        let url = self.url(path);
        debug!("PUT {}", url);
        self.transport.put(&url, data.unwrap_or(Value::Null)).await
    }

    // rssdldmng API

    /// 当前配置
    pub async fn config(&self) -> Result<Value> {
        self.fetch("/config").await
    }

    /// 正在跟踪的剧集名
    pub async fn shows(&self) -> Result<Vec<String>> {
        let body = self.fetch("/shows").await?;
        Ok(serde_json::from_value(body)?)
    }

    /// 最近的剧集
    pub async fn latest(&self) -> Result<Value> {
        self.fetch("/latest").await
    }

    pub async fn status(&self) -> Result<Value> {
        self.fetch("/status").await
    }

    /// 添加跟踪的剧集
    pub async fn add_show(&self, name: &str) -> Result<()> {
        self.update(&show_path("add", name), None).await
    }

    /// 移除跟踪的剧集
    pub async fn remove_show(&self, name: &str) -> Result<()> {
        self.update(&show_path("remove", name), None).await
    }
}

/// 剧集名作为单个路径段编码，名称中的 `/` 和 `?` 不会改变路由
fn show_path(action: &str, name: &str) -> String {
    format!("/{}/{}", action, utf8_percent_encode(name, PATH_SEGMENT))
}
