use async_trait::async_trait;
use futures::StreamExt;
use gridpulse_core::market::error::MarketError;
use gridpulse_core::market::port::{EventStream, NamedEvent, Transport};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, HeaderValue};
use tracing::{info, warn};

/// # Summary
/// WebSocket 传输实现。
///
/// # Invariants
/// - 每个文本帧是一条 JSON 具名事件：`{"event": "...", "data": {...}}`。
/// - 无法解析的帧记录日志后跳过，不中断连接。
/// - 收到 Close 帧或读取出错即视为连接结束。
pub struct WsTransport {
    // 上游地址 (ws:// 或 wss://)
    url: String,
    // 上游凭据，以 Bearer 头发送
    api_key: Option<String>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    /// # Summary
    /// 建立 WebSocket 连接并返回事件流。
    ///
    /// # Logic
    /// 1. 构造握手请求，若配置了凭据则附加 `Authorization` 头。
    /// 2. 完成握手后逐帧解析文本消息为 `NamedEvent`。
    ///
    /// # Returns
    /// 握手失败返回 `MarketError::Transport`。
    async fn open(&self) -> Result<EventStream, MarketError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| MarketError::Transport(e.to_string()))?;
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| MarketError::Transport(e.to_string()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws, _response) = connect_async(request)
            .await
            .map_err(|e| MarketError::Transport(e.to_string()))?;
        info!(url = %self.url, "WebSocket transport connected");

        let stream = async_stream::stream! {
            let mut ws = ws;
            while let Some(message) = ws.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<NamedEvent>(&text) {
                        Ok(event) => yield Ok(event),
                        Err(e) => warn!("Skipping malformed frame: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(MarketError::Transport(e.to_string()));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
