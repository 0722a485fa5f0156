/// Kodi JSON-RPC WebSocket 客户端
///
/// 每次 send 都先等待连接就绪（有限次轮询），然后按请求 ID 登记等待器。
/// 多个并发调用各自独占一个等待表项，响应乱序到达也能正确分发。

use common::utils::{ws_url, IdGenerator};
use common::ws_rpc::{
    codec, Incoming, PendingRequests, RpcError, RpcRequest, RpcResponse, CONNECT_FAILED_MESSAGE,
};
use common::{ConnectionProperties, Logger};
use serde_json::{json, Value};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::socket::{ReadyState, RpcSocket, SocketEvent, TungsteniteSocket};

/// send 等待连接时的最大重试次数
pub const SEND_ATTEMPTS: u32 = 10;

/// 浏览器在没有关闭帧时报告的关闭码
const ABNORMAL_CLOSURE: u16 = 1006;

/// 单次调用的响应回调
pub type ResponseCallback = Box<dyn FnOnce(Option<Value>) + Send + 'static>;

type ErrorHook = Arc<dyn Fn(&str) + Send + Sync>;
type MessageHook = Arc<dyn Fn(Option<&Value>) + Send + Sync>;
type NotificationHook = Arc<dyn Fn(&str, Option<&Value>) + Send + Sync>;

/// 实例级回调
#[derive(Default)]
struct Hooks {
    on_error: Option<ErrorHook>,
    on_message: Option<MessageHook>,
    on_notification: Option<NotificationHook>,
}

struct Inner {
    props: ConnectionProperties,
    logger: Logger,
    socket: Arc<dyn RpcSocket>,
    pending: PendingRequests,
    hooks: RwLock<Hooks>,
    ids: IdGenerator,
}

/// Kodi RPC 客户端
#[derive(Clone)]
pub struct RpcSocketClient {
    inner: Arc<Inner>,
}

impl RpcSocketClient {
    /// 创建客户端并立即在后台连接 ws://{host}:{port}
    pub fn connect(props: ConnectionProperties, logger: Logger) -> Self {
        let url = ws_url(&props.host, props.port);
        logger.debug(format!("init KodiWSService [connecting to: {}]", url));
        let (socket, events) = TungsteniteSocket::connect(url);
        Self::with_socket(props, logger, socket, events)
    }

    /// 使用给定的套接字及其事件流创建客户端
    pub fn with_socket(
        props: ConnectionProperties,
        logger: Logger,
        socket: Arc<dyn RpcSocket>,
        events: mpsc::UnboundedReceiver<SocketEvent>,
    ) -> Self {
        let client = Self {
            inner: Arc::new(Inner {
                props,
                logger,
                socket,
                pending: PendingRequests::new(),
                hooks: RwLock::new(Hooks::default()),
                ids: IdGenerator::new(),
            }),
        };

        tokio::spawn(Self::run_events(Arc::downgrade(&client.inner), events));
        client
    }

    pub fn props(&self) -> &ConnectionProperties {
        &self.inner.props
    }

    /// 当前连接状态
    pub fn ready_state(&self) -> ReadyState {
        self.inner.socket.ready_state()
    }

    /// 获取待处理请求数量
    pub async fn pending_count(&self) -> usize {
        self.inner.pending.pending_count().await
    }

    /// 连接等待耗尽时调用
    pub async fn set_on_error<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.hooks.write().await.on_error = Some(Arc::new(hook));
    }

    /// 每个匹配的响应都会以 result 调用
    pub async fn set_on_message<F>(&self, hook: F)
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        self.inner.hooks.write().await.on_message = Some(Arc::new(hook));
    }

    /// 服务端推送的通知
    pub async fn set_on_notification<F>(&self, hook: F)
    where
        F: Fn(&str, Option<&Value>) + Send + Sync + 'static,
    {
        self.inner.hooks.write().await.on_notification = Some(Arc::new(hook));
    }

    /// 发起关闭，在途请求会在连接关闭后被清理
    pub fn close(&self) {
        self.inner.socket.close();
    }

    /// 轮询连接状态，每次间隔 props.timeout
    ///
    /// 状态为 Open 时立即返回；Closed 或重试用尽时记录错误并调用 on_error。
    pub async fn wait_for_connection(&self, mut attempts: u32) -> Result<(), RpcError> {
        loop {
            tokio::time::sleep(self.inner.props.timeout).await;

            let state = self.inner.socket.ready_state();
            if state == ReadyState::Open {
                return Ok(());
            }

            if attempts > 0 && state != ReadyState::Closed {
                self.inner.logger.debug("Wait for connection...");
                attempts -= 1;
                continue;
            }

            self.inner.logger.error(CONNECT_FAILED_MESSAGE);
            let on_error = self.inner.hooks.read().await.on_error.clone();
            if let Some(hook) = on_error {
                hook(CONNECT_FAILED_MESSAGE);
            }
            return Err(RpcError::connection_failed());
        }
    }

    /// 发送请求并等待对应 ID 的响应
    ///
    /// 服务端返回的错误不会变成 Err，由调用方检查 `RpcResponse::error`。
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<RpcResponse, RpcError> {
        self.wait_for_connection(SEND_ATTEMPTS).await?;

        let id = self.inner.ids.next_id();
        if self.inner.logger.is_enabled() {
            let shown = params.as_ref().map_or_else(|| "null".to_string(), Value::to_string);
            self.inner
                .logger
                .debug(format!("send method:{}, params: {}", method, shown));
        }
        let text = RpcRequest::new(id, method, params).to_json()?;

        // 先登记再发送，保证响应不会早于等待器到达
        let rx = self.inner.pending.register(id).await;
        if let Err(e) = self.inner.socket.send_text(text) {
            self.inner.pending.remove(id).await;
            return Err(e);
        }

        let outcome = match self.inner.props.response_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.inner.pending.remove(id).await;
                    return Err(RpcError::timeout(format!("请求超时: {} (id={})", method, id)));
                }
            },
            None => rx.await,
        };

        outcome.map_err(|_| RpcError::internal_error("响应通道被关闭"))?
    }

    /// 后台发送请求，匹配的响应到达后依次调用 on_message 和 on_response
    ///
    /// 连接失败、超时或连接关闭时回调不会被调用。
    pub fn send(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        on_response: Option<ResponseCallback>,
    ) -> JoinHandle<()> {
        let client = self.clone();
        let method = method.into();
        tokio::spawn(async move {
            match client.call(&method, params).await {
                Ok(response) => client.deliver(&method, response, on_response).await,
                Err(e) => debug!("调用未完成: method={}, error={}", method, e),
            }
        })
    }

    async fn deliver(
        &self,
        method: &str,
        response: RpcResponse,
        on_response: Option<ResponseCallback>,
    ) {
        if let Some(error) = &response.error {
            self.inner.logger.debug(format!("{} : {}", method, error.message));
        }

        let on_message = self.inner.hooks.read().await.on_message.clone();
        if let Some(hook) = on_message {
            hook(response.result.as_ref());
        }

        if let Some(callback) = on_response {
            callback(response.result);
        }
    }

    /// 处理连接事件，直到事件流结束或客户端被释放
    async fn run_events(inner: Weak<Inner>, mut events: mpsc::UnboundedReceiver<SocketEvent>) {
        while let Some(event) = events.recv().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            Self { inner }.handle_event(event).await;
        }
        debug!("事件任务结束");
    }

    async fn handle_event(&self, event: SocketEvent) {
        match event {
            SocketEvent::Open => {
                self.inner.logger.debug("Connected to Kodi Web Socket");
            }
            SocketEvent::Message(text) => {
                self.handle_text(&text).await;
            }
            SocketEvent::Error(e) => {
                warn!("套接字错误: {}", e);
                self.inner.logger.debug("Socket error");
            }
            SocketEvent::Closed(code) => {
                self.inner.logger.debug(format!(
                    "Closing socket [{}]",
                    code.unwrap_or(ABNORMAL_CLOSURE)
                ));
                self.inner.pending.clear_pending().await;
            }
        }
    }

    /// 处理收到的文本帧
    async fn handle_text(&self, text: &str) {
        match codec::decode_text(text) {
            Ok(Incoming::Response(response)) => {
                let id = response.id;
                if !self.inner.pending.complete(response).await {
                    debug!("未找到对应的待响应请求: {}", id);
                }
            }
            Ok(Incoming::Notification(notification)) => {
                debug!("收到通知: {}", notification.method);
                let on_notification = self.inner.hooks.read().await.on_notification.clone();
                if let Some(hook) = on_notification {
                    hook(&notification.method, notification.params.as_ref());
                }
            }
            Err(e) => warn!("解析消息失败: {}", e),
        }
    }

    // Kodi 方法

    /// JSONRPC.Ping
    pub async fn ping(&self) -> Result<Option<Value>, RpcError> {
        self.call("JSONRPC.Ping", None).await?.into_result()
    }

    /// 当前活动的播放器
    pub async fn active_players(&self) -> Result<Option<Value>, RpcError> {
        self.call("Player.GetActivePlayers", None).await?.into_result()
    }

    /// 播放/暂停
    pub async fn play_pause(&self, player_id: i64) -> Result<Option<Value>, RpcError> {
        self.call("Player.PlayPause", Some(json!({ "playerid": player_id })))
            .await?
            .into_result()
    }

    pub async fn stop(&self, player_id: i64) -> Result<Option<Value>, RpcError> {
        self.call("Player.Stop", Some(json!({ "playerid": player_id })))
            .await?
            .into_result()
    }

    /// 扫描视频库，新下载的剧集入库
    pub async fn scan_video_library(&self) -> Result<Option<Value>, RpcError> {
        self.call("VideoLibrary.Scan", None).await?.into_result()
    }

    /// 在 Kodi 界面弹出通知
    pub async fn show_notification(
        &self,
        title: &str,
        message: &str,
    ) -> Result<Option<Value>, RpcError> {
        self.call(
            "GUI.ShowNotification",
            Some(json!({ "title": title, "message": message })),
        )
        .await?
        .into_result()
    }
}
