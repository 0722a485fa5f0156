/// HTTP 传输层

use async_trait::async_trait;
use common::{Error, Result};
use serde_json::Value;

/// HTTP 传输
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 发送 GET 请求并解析 JSON 响应体
    async fn get(&self, url: &str) -> Result<Value>;

    /// 发送带 JSON 请求体的 PUT 请求
    async fn put(&self, url: &str, body: Value) -> Result<()>;
}

/// 基于 reqwest 的实现，使用客户端默认超时
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send().await.map_err(network_error)?;
        let response = check_status(response)?;
        response.json::<Value>().await.map_err(network_error)
    }

    async fn put(&self, url: &str, body: Value) -> Result<()> {
        let response = self
            .client
            .put(url)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Http {
            status: status.as_u16(),
        })
    }
}

fn network_error(err: reqwest::Error) -> Error {
    Error::Network(err.to_string())
}
