/// WebSocket 传输
///
/// 客户端只观察连接状态，不直接修改；收到的消息和连接事件通过通道上报

use common::ws_rpc::RpcError;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// 等待对端完成关闭握手的最长时间
const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// 可原子读写的连接状态
#[derive(Debug, Clone)]
pub struct SharedReadyState(Arc<AtomicU8>);

impl SharedReadyState {
    pub fn new(state: ReadyState) -> Self {
        Self(Arc::new(AtomicU8::new(state as u8)))
    }

    pub fn get(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: ReadyState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// 连接事件
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Open,
    Message(String),
    Error(String),
    Closed(Option<u16>),
}

/// RPC 客户端使用的套接字
pub trait RpcSocket: Send + Sync {
    /// 当前连接状态
    fn ready_state(&self) -> ReadyState;

    /// 发送一帧文本
    fn send_text(&self, text: String) -> Result<(), RpcError>;

    /// 发起关闭
    fn close(&self);
}

enum Outgoing {
    Text(String),
    Close,
}

/// 基于 tokio-tungstenite 的套接字
pub struct TungsteniteSocket {
    state: SharedReadyState,
    sender: mpsc::UnboundedSender<Outgoing>,
}

impl TungsteniteSocket {
    /// 在后台连接到 url，立即返回处于 Connecting 状态的套接字和事件接收端
    pub fn connect(url: impl Into<String>) -> (Arc<Self>, mpsc::UnboundedReceiver<SocketEvent>) {
        let url = url.into();
        let state = SharedReadyState::new(ReadyState::Connecting);
        let (tx, rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::drive(url, state.clone(), rx, event_tx));

        (Arc::new(Self { state, sender: tx }), event_rx)
    }

    /// 连接并运行，直到任一方关闭
    async fn drive(
        url: String,
        state: SharedReadyState,
        mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) {
        let ws_stream = match connect_async(&url).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                error!("连接 {} 失败: {}", url, e);
                state.set(ReadyState::Closed);
                let _ = events.send(SocketEvent::Error(e.to_string()));
                let _ = events.send(SocketEvent::Closed(None));
                return;
            }
        };

        info!("✅ WebSocket 连接成功: {}", url);
        state.set(ReadyState::Open);
        let _ = events.send(SocketEvent::Open);

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let mut close_code = None;
        // 关闭帧已发出或已收到，需要继续读到流结束
        let mut handshake = false;

        loop {
            tokio::select! {
                out = outgoing.recv() => match out {
                    Some(Outgoing::Text(text)) => {
                        if let Err(e) = ws_sender.send(Message::Text(text)).await {
                            error!("发送消息失败: {}", e);
                            let _ = events.send(SocketEvent::Error(e.to_string()));
                            break;
                        }
                    }
                    Some(Outgoing::Close) | None => {
                        state.set(ReadyState::Closing);
                        let frame = CloseFrame {
                            code: CloseCode::Normal,
                            reason: "".into(),
                        };
                        match ws_sender.send(Message::Close(Some(frame))).await {
                            Ok(()) => handshake = true,
                            Err(e) => debug!("发送关闭帧失败: {}", e),
                        }
                        break;
                    }
                },
                inbound = ws_receiver.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(SocketEvent::Message(text));
                    }
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => {
                            let _ = events.send(SocketEvent::Message(text));
                        }
                        Err(e) => warn!("二进制转字符串失败: {}", e),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        state.set(ReadyState::Closing);
                        close_code = frame.map(|f| u16::from(f.code));
                        handshake = true;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("接收消息错误: {}", e);
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                        break;
                    }
                    None => break,
                },
            }
        }

        // 继续读取：主动关闭时等待对端的关闭帧，被动关闭时让 tungstenite 发出排队的回复
        if handshake {
            let drain = async {
                while let Some(inbound) = ws_receiver.next().await {
                    match inbound {
                        Ok(Message::Close(frame)) => {
                            close_code = frame.map(|f| u16::from(f.code));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            debug!("关闭握手中断: {}", e);
                            break;
                        }
                    }
                }
            };
            if tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, drain).await.is_err() {
                warn!("等待关闭握手超时");
            }
        }

        state.set(ReadyState::Closed);
        let _ = events.send(SocketEvent::Closed(close_code));
        debug!("连接任务结束");
    }
}

impl RpcSocket for TungsteniteSocket {
    fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    fn send_text(&self, text: String) -> Result<(), RpcError> {
        if self.ready_state() != ReadyState::Open {
            return Err(RpcError::connection_closed());
        }
        self.sender
            .send(Outgoing::Text(text))
            .map_err(|_| RpcError::connection_closed())
    }

    fn close(&self) {
        if matches!(self.ready_state(), ReadyState::Closing | ReadyState::Closed) {
            return;
        }
        // 连接尚未建立时驱动任务会在建立后立即关闭
        let _ = self.sender.send(Outgoing::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_ready_state() {
        let state = SharedReadyState::new(ReadyState::Connecting);
        let observer = state.clone();
        state.set(ReadyState::Open);
        assert_eq!(observer.get(), ReadyState::Open);
        state.set(ReadyState::Closed);
        assert_eq!(observer.get(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_connect_refused_reports_closed() {
        // 绑定后立即释放端口，保证连接被拒绝
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (socket, mut events) = TungsteniteSocket::connect(format!("ws://127.0.0.1:{}", port));
        assert!(matches!(events.recv().await, Some(SocketEvent::Error(_))));
        assert_eq!(events.recv().await, Some(SocketEvent::Closed(None)));
        assert_eq!(socket.ready_state(), ReadyState::Closed);
        assert!(socket.send_text("{}".into()).is_err());
    }
}
