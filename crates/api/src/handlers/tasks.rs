use axum::{extract::State, http::StatusCode, Json};
use tracing::debug;

use imgfleet_core::{
    DispatchProgress, DispatcherChannel, PullRequest, StatisticsReport, TaskAssignment,
};

use crate::{error::ApiResult, response::ApiResponse, routes::AppState};

/// 拉取下一个任务；被协调器忽略的请求返回 409
pub async fn pull_task(
    State(state): State<AppState>,
    Json(request): Json<PullRequest>,
) -> ApiResult<Json<TaskAssignment>> {
    debug!("HTTP 拉取请求: worker {}", request.worker_id);
    let assignment = state.channel.pull_task(request).await?;
    Ok(Json(assignment))
}

pub async fn report_statistics(
    State(state): State<AppState>,
    Json(report): Json<StatisticsReport>,
) -> ApiResult<(StatusCode, ApiResponse<()>)> {
    let worker_id = report.worker_id.clone();
    state.channel.report_statistics(report).await?;
    Ok((
        StatusCode::ACCEPTED,
        ApiResponse::success_empty_with_message(format!("已接收 worker {worker_id} 的统计")),
    ))
}

pub async fn get_progress(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<DispatchProgress>> {
    let progress = state.channel.progress().await?;
    Ok(ApiResponse::success(progress))
}
