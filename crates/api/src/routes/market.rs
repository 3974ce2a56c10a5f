//! # 行情路由控制器
//!
//! 实现 `/api/v1/market` 路径下的 REST 与 WebSocket 接口。

use std::sync::Arc;

use axum::Json;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{Path, State};
use axum::response::Response;
use gridpulse_core::market::entity::{DataPoint, Series};
use gridpulse_market::service::MarketDataService;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiResponse, CacheClearedResponse, CatalogResponse, LiveEvent, WindowResponse};

// 单个会话待发送更新的上限
const LIVE_QUEUE_CAPACITY: usize = 128;

/// 列出可查询的品种与时间区间
#[utoipa::path(
    get,
    path = "/api/v1/market/categories",
    tag = "行情 (Market)",
    responses(
        (status = 200, description = "目录获取成功", body = ApiResponse<CatalogResponse>)
    )
)]
pub async fn list_categories() -> Json<ApiResponse<CatalogResponse>> {
    Json(ApiResponse::ok(CatalogResponse::full()))
}

/// 获取历史序列
///
/// 同一品种与区间在缓存清理前始终返回同一份序列。
#[utoipa::path(
    get,
    path = "/api/v1/market/series/{category}/{range}",
    tag = "行情 (Market)",
    params(
        ("category" = String, Path, description = "品种标记，如 crude-oil"),
        ("range" = String, Path, description = "区间标记：1D, 1W, 1M, 3M, 1Y, ALL")
    ),
    responses(
        (status = 200, description = "序列获取成功", body = ApiResponse<Series>),
        (status = 400, description = "品种或区间非法", body = crate::types::ApiErrorResponse)
    )
)]
pub async fn get_series(
    State(state): State<AppState>,
    Path((category, range)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Series>>, ApiError> {
    let series = state.service.get_series(&category, &range).await?;
    Ok(Json(ApiResponse::ok(series.as_ref().clone())))
}

/// 当前实时滚动窗口快照
#[utoipa::path(
    get,
    path = "/api/v1/market/window",
    tag = "行情 (Market)",
    responses(
        (status = 200, description = "窗口快照", body = ApiResponse<WindowResponse>)
    )
)]
pub async fn get_window(State(state): State<AppState>) -> Json<ApiResponse<WindowResponse>> {
    Json(ApiResponse::ok(WindowResponse {
        channel_state: state.service.channel_state(),
        points: state.service.live_window(),
    }))
}

/// 清空历史序列缓存
#[utoipa::path(
    delete,
    path = "/api/v1/market/cache",
    tag = "运维 (Ops)",
    responses(
        (status = 200, description = "缓存已清空", body = ApiResponse<CacheClearedResponse>),
        (status = 500, description = "缓存后端故障")
    )
)]
pub async fn clear_cache(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CacheClearedResponse>>, ApiError> {
    let evicted = state.service.clear_cache().await?;
    Ok(Json(ApiResponse::ok(CacheClearedResponse { evicted })))
}

/// 实时行情推送 (WebSocket)
///
/// 每条实时更新以 `{"event": "marketUpdate", "data": {...}}` 文本帧推送。
#[utoipa::path(
    get,
    path = "/api/v1/market/live",
    tag = "行情 (Market)",
    responses(
        (status = 101, description = "升级为 WebSocket，之后推送 LiveEvent 帧", body = LiveEvent)
    )
)]
pub async fn live(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| stream_live(socket, state.service))
}

/// # Summary
/// 单个 WebSocket 会话的推送循环。
///
/// # Logic
/// 1. 注册实时回调，回调只把最新一条转入会话专属的有界队列，不在回调中做 IO。
/// 2. 循环转发队列中的更新，直到客户端关闭或写入失败。
/// 3. 队列写满说明客户端跟不上推送速率，以 1013 关闭帧结束会话。
/// 4. 退出时注销回调。
///
/// # Invariants
/// - 客户端收到的更新是推送序列的无缺口前缀，不丢帧也不合并。
async fn stream_live(mut socket: WebSocket, service: Arc<MarketDataService>) {
    let (tx, mut rx) = mpsc::channel::<DataPoint>(LIVE_QUEUE_CAPACITY);
    let overflow = Arc::new(Notify::new());
    let lagging = overflow.clone();
    let subscription = service.subscribe_live(Arc::new(move |window: &[DataPoint]| {
        if let Some(latest) = window.last() {
            match tx.try_send(latest.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => lagging.notify_one(),
                // 会话已结束
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }));
    debug!(subscription = subscription.id(), "Live session opened");

    loop {
        tokio::select! {
            biased;
            _ = overflow.notified() => {
                warn!(
                    subscription = subscription.id(),
                    capacity = LIVE_QUEUE_CAPACITY,
                    "Live client fell behind, closing session"
                );
                let frame = CloseFrame {
                    code: close_code::AGAIN,
                    reason: "live queue overflow".into(),
                };
                socket.send(Message::Close(Some(frame))).await.ok();
                break;
            }
            Some(point) = rx.recv() => {
                let frame = match serde_json::to_string(&LiveEvent::market_update(point)) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Failed to encode live update: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    subscription.unsubscribe();
    debug!(subscription = subscription.id(), "Live session closed");
}
