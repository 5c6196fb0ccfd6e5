use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use imgfleet_infrastructure::InMemoryDispatcherChannel;

use crate::handlers::{
    health::health_check,
    tasks::{get_progress, pull_task, report_statistics},
};

/// API应用状态
///
/// 所有处理器共用同一个协调器通道，请求最终进入协调器唯一的处理循环。
#[derive(Clone)]
pub struct AppState {
    pub channel: InMemoryDispatcherChannel,
}

impl AppState {
    pub fn new(channel: InMemoryDispatcherChannel) -> Self {
        Self { channel }
    }
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/tasks/pull", post(pull_task))
        .route("/api/v1/statistics", post(report_statistics))
        .route("/api/v1/progress", get(get_progress))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
