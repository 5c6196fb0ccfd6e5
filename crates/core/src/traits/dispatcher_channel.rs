//! 协调器通道接口
//!
//! worker 通过 `DispatcherChannel` 与协调器交互，不关心底层是进程内通道
//! 还是 HTTP。无论哪种传输，请求最终都变成 `CoordinatorRequest` 进入协调器
//! 唯一的请求处理循环，按到达顺序逐个处理。

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::{
    models::{DispatchProgress, PullRequest, StatisticsReport, TaskAssignment},
    FleetResult,
};

/// worker 侧看到的协调器
#[async_trait]
pub trait DispatcherChannel: Send + Sync {
    /// 请求下一个任务；收到 `Terminate` 后不得再次调用
    async fn pull_task(&self, request: PullRequest) -> FleetResult<TaskAssignment>;

    /// 终止后上报本地统计，每个 worker 恰好一次
    async fn report_statistics(&self, report: StatisticsReport) -> FleetResult<()>;
}

/// 送入协调器循环的请求
///
/// 被忽略的请求（例如已终止 worker 的重复拉取）不会收到回复：
/// 协调器直接丢弃 `reply`，调用方看到的是通道关闭。
#[derive(Debug)]
pub enum CoordinatorRequest {
    Pull {
        request: PullRequest,
        reply: oneshot::Sender<TaskAssignment>,
    },
    Report {
        report: StatisticsReport,
        reply: oneshot::Sender<()>,
    },
    Progress {
        reply: oneshot::Sender<DispatchProgress>,
    },
}

impl CoordinatorRequest {
    pub fn pull(request: PullRequest) -> (Self, oneshot::Receiver<TaskAssignment>) {
        let (reply, rx) = oneshot::channel();
        (Self::Pull { request, reply }, rx)
    }

    pub fn report(report: StatisticsReport) -> (Self, oneshot::Receiver<()>) {
        let (reply, rx) = oneshot::channel();
        (Self::Report { report, reply }, rx)
    }

    pub fn progress() -> (Self, oneshot::Receiver<DispatchProgress>) {
        let (reply, rx) = oneshot::channel();
        (Self::Progress { reply }, rx)
    }
}
