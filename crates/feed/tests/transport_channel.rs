use async_trait::async_trait;
use futures::SinkExt;
use gridpulse_core::market::entity::{ChannelState, DataPoint, Trend};
use gridpulse_core::market::error::MarketError;
use gridpulse_core::market::port::{EventStream, NamedEvent, SubscriptionChannel, Transport};
use gridpulse_core::test_utils::point_at;
use gridpulse_feed::transport::TransportChannel;
use gridpulse_feed::ws::WsTransport;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

type Item = Result<NamedEvent, MarketError>;

/// 由测试脚本驱动的传输，只能打开一次
struct ScriptedTransport {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Item>>>,
}

impl ScriptedTransport {
    fn new() -> (Self, mpsc::UnboundedSender<Item>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self) -> Result<EventStream, MarketError> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| MarketError::Transport("already opened".to_string()))?;
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

struct RefusingTransport;

#[async_trait]
impl Transport for RefusingTransport {
    async fn open(&self) -> Result<EventStream, MarketError> {
        Err(MarketError::Transport("connection refused".to_string()))
    }
}

fn update(seq: i64, value: f64) -> NamedEvent {
    NamedEvent {
        event: "marketUpdate".to_string(),
        data: serde_json::to_value(point_at(seq, value)).unwrap(),
    }
}

fn collect<C: SubscriptionChannel>(channel: &C) -> Arc<Mutex<Vec<DataPoint>>> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    channel.subscribe(Arc::new(move |p: &DataPoint| sink.lock().unwrap().push(p.clone())));
    received
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_forwards_matching_events_in_order() -> anyhow::Result<()> {
    let (transport, tx) = ScriptedTransport::new();
    let channel = TransportChannel::new(transport, "marketUpdate");
    let received = collect(&channel);

    channel.connect().await?;
    assert_eq!(channel.state(), ChannelState::Connected);

    tx.send(Ok(update(0, 71.0)))?;
    tx.send(Ok(NamedEvent {
        event: "heartbeat".to_string(),
        data: serde_json::json!({}),
    }))?;
    tx.send(Ok(NamedEvent {
        event: "marketUpdate".to_string(),
        data: serde_json::json!({ "value": "not a point" }),
    }))?;
    tx.send(Ok(update(1, 72.5)))?;

    wait_until(|| received.lock().unwrap().len() >= 2).await;
    let values: Vec<f64> = received.lock().unwrap().iter().map(|p| p.value).collect();
    assert_eq!(values, vec![71.0, 72.5]);
    assert_eq!(channel.state(), ChannelState::Connected);
    Ok(())
}

#[tokio::test]
async fn test_points_violating_invariants_are_skipped() -> anyhow::Result<()> {
    let (transport, tx) = ScriptedTransport::new();
    let channel = TransportChannel::new(transport, "marketUpdate");
    let received = collect(&channel);
    channel.connect().await?;

    let broken = [
        DataPoint {
            value: -50.0,
            volume: -10.0,
            change: -3.0,
            volatility: -1.0,
            trend: Trend::Up,
            ..point_at(0, 1.0)
        },
        DataPoint {
            volume: -1.0,
            ..point_at(1, 60.0)
        },
        DataPoint {
            volatility: -0.5,
            ..point_at(2, 60.0)
        },
        // 涨跌幅 2% 却标记为持平
        DataPoint {
            change: 2.0,
            trend: Trend::Stable,
            ..point_at(3, 60.0)
        },
    ];
    for point in &broken {
        tx.send(Ok(NamedEvent {
            event: "marketUpdate".to_string(),
            data: serde_json::to_value(point)?,
        }))?;
    }
    tx.send(Ok(update(5, 61.0)))?;

    wait_until(|| !received.lock().unwrap().is_empty()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let values: Vec<f64> = received.lock().unwrap().iter().map(|p| p.value).collect();
    assert_eq!(values, vec![61.0]);
    assert_eq!(channel.state(), ChannelState::Connected);
    Ok(())
}

#[tokio::test]
async fn test_disconnect_during_delivery_skips_remaining_handlers() -> anyhow::Result<()> {
    let (transport, tx) = ScriptedTransport::new();
    let channel = Arc::new(TransportChannel::new(transport, "marketUpdate"));

    let first = collect(channel.as_ref());
    let weak: Weak<TransportChannel<ScriptedTransport>> = Arc::downgrade(&channel);
    channel.subscribe(Arc::new(move |_: &DataPoint| {
        if let Some(channel) = weak.upgrade() {
            futures::executor::block_on(channel.disconnect());
        }
    }));
    let last = collect(channel.as_ref());

    channel.connect().await?;
    tx.send(Ok(update(0, 30.0)))?;

    wait_until(|| channel.state() == ChannelState::Disconnected).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(first.lock().unwrap().len(), 1);
    assert!(last.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stream_end_falls_back_to_disconnected() -> anyhow::Result<()> {
    let (transport, tx) = ScriptedTransport::new();
    let channel = TransportChannel::new(transport, "marketUpdate");

    channel.connect().await?;
    drop(tx);

    wait_until(|| channel.state() == ChannelState::Disconnected).await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
    Ok(())
}

#[tokio::test]
async fn test_stream_error_falls_back_to_disconnected() -> anyhow::Result<()> {
    let (transport, tx) = ScriptedTransport::new();
    let channel = TransportChannel::new(transport, "marketUpdate");
    let received = collect(&channel);

    channel.connect().await?;
    tx.send(Err(MarketError::Transport("reset by peer".to_string())))?;
    tx.send(Ok(update(0, 10.0))).ok();

    wait_until(|| channel.state() == ChannelState::Disconnected).await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(received.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_open_failure_is_reported_and_leaves_channel_disconnected() {
    let channel = TransportChannel::new(RefusingTransport, "marketUpdate");

    let result = channel.connect().await;
    assert!(matches!(result, Err(MarketError::Transport(_))));
    assert_eq!(channel.state(), ChannelState::Disconnected);
}

#[tokio::test]
async fn test_connect_while_connected_does_not_reopen() -> anyhow::Result<()> {
    let (transport, _tx) = ScriptedTransport::new();
    let channel = TransportChannel::new(transport, "marketUpdate");

    channel.connect().await?;
    // 第二次打开会失败，幂等的 connect 不应触达传输
    channel.connect().await?;
    assert_eq!(channel.state(), ChannelState::Connected);
    Ok(())
}

#[tokio::test]
async fn test_no_delivery_after_disconnect() -> anyhow::Result<()> {
    let (transport, tx) = ScriptedTransport::new();
    let channel = TransportChannel::new(transport, "marketUpdate");
    let received = collect(&channel);

    channel.connect().await?;
    tx.send(Ok(update(0, 5.0)))?;
    wait_until(|| received.lock().unwrap().len() == 1).await;

    channel.disconnect().await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
    tx.send(Ok(update(1, 6.0))).ok();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(received.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_websocket_transport_end_to_end() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let seen_auth = Arc::new(Mutex::new(None::<String>));
    let seen_auth_server = seen_auth.clone();

    let frames = vec![
        serde_json::to_string(&update(0, 40.0))?,
        "not json".to_string(),
        serde_json::to_string(&NamedEvent {
            event: "heartbeat".to_string(),
            data: serde_json::json!(null),
        })?,
        serde_json::to_string(&update(1, 41.0))?,
    ];

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let auth = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            *seen_auth_server.lock().unwrap() = auth;
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(tcp, callback)
            .await
            .unwrap();
        for frame in frames {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        ws.close(None).await.ok();
    });

    let transport = WsTransport::new(format!("ws://{addr}"), Some("secret".to_string()));
    let channel = TransportChannel::new(transport, "marketUpdate");
    let received = collect(&channel);

    channel.connect().await?;
    wait_until(|| channel.state() == ChannelState::Disconnected).await;
    server.await?;

    let values: Vec<f64> = received.lock().unwrap().iter().map(|p| p.value).collect();
    assert_eq!(values, vec![40.0, 41.0]);
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_eq!(seen_auth.lock().unwrap().as_deref(), Some("Bearer secret"));
    Ok(())
}

#[tokio::test]
async fn test_websocket_transport_unreachable_host() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = WsTransport::new(format!("ws://{addr}"), None);
    let channel = TransportChannel::new(transport, "marketUpdate");
    assert!(channel.connect().await.is_err());
    assert_eq!(channel.state(), ChannelState::Disconnected);
}
