//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`，而是由 `crates/app` 的组合根持有并调用。

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use gridpulse_market::service::MarketDataService;

use crate::routes::market;

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - `service` 取自组合根的 `ServiceRegistry`，进程内只有这一个实例。
#[derive(Clone)]
pub struct AppState {
    /// 行情服务门面
    pub service: Arc<MarketDataService>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GridPulse 行情 API",
        version = "0.1.0",
        description = "能源行情模拟与分发服务：历史序列查询、实时推送与缓存运维。",
        license(name = "MIT")
    ),
    tags(
        (name = "行情 (Market)", description = "历史序列、滚动窗口与实时推送"),
        (name = "运维 (Ops)", description = "缓存管理")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// 构建完整的路由树（含 Swagger UI 与 CORS）。
pub fn build_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(market::list_categories))
        .routes(routes!(market::get_series))
        .routes(routes!(market::get_window))
        .routes(routes!(market::clear_cache))
        .routes(routes!(market::live))
        .with_state(state)
        .split_for_parts();

    // 开发阶段允许所有来源
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// 在已绑定的监听器上提供服务，`shutdown` 完成后优雅退出。
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// 绑定地址并启动 HTTP 监听。
///
/// # Arguments
/// * `state` - 由组合根注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:8080"`
/// * `shutdown` - 完成时触发优雅停机
pub async fn start_server<F>(state: AppState, bind_addr: &str, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("GridPulse API server listening on {}", bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);

    serve(listener, state, shutdown).await
}
