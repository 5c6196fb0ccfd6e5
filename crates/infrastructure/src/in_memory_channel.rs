use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use imgfleet_core::{
    CoordinatorRequest, DispatchProgress, DispatcherChannel, FleetError, FleetResult, PullRequest,
    StatisticsReport, TaskAssignment,
};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// 创建协调器请求通道
///
/// 发送端可以任意克隆，分给每个 worker 或 HTTP 处理器；接收端交给
/// `DispatcherService`。每个请求带一个 oneshot 回复端，因此每个调用方
/// 在同一时刻最多只有一个未完成的请求。
pub fn coordinator_channel(
    capacity: usize,
) -> (InMemoryDispatcherChannel, mpsc::Receiver<CoordinatorRequest>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (InMemoryDispatcherChannel { sender }, receiver)
}

/// 基于 tokio 通道的进程内传输
#[derive(Debug, Clone)]
pub struct InMemoryDispatcherChannel {
    sender: mpsc::Sender<CoordinatorRequest>,
}

impl InMemoryDispatcherChannel {
    async fn submit(&self, request: CoordinatorRequest) -> FleetResult<()> {
        self.sender
            .send(request)
            .await
            .map_err(|_| FleetError::Channel("协调器已停止接收请求".to_string()))
    }

    /// 查询当前分发进度
    pub async fn progress(&self) -> FleetResult<DispatchProgress> {
        let (request, reply) = CoordinatorRequest::progress();
        self.submit(request).await?;
        reply
            .await
            .map_err(|_| FleetError::Channel("协调器未返回进度".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[async_trait]
impl DispatcherChannel for InMemoryDispatcherChannel {
    async fn pull_task(&self, request: PullRequest) -> FleetResult<TaskAssignment> {
        let worker_id = request.worker_id.clone();
        let (request, reply) = CoordinatorRequest::pull(request);
        self.submit(request).await?;
        debug!("worker {} 已发送拉取请求", worker_id);
        reply.await.map_err(|_| {
            FleetError::protocol_violation(format!("协调器忽略了 worker {worker_id} 的拉取请求"))
        })
    }

    async fn report_statistics(&self, report: StatisticsReport) -> FleetResult<()> {
        let worker_id = report.worker_id.clone();
        let (request, reply) = CoordinatorRequest::report(report);
        self.submit(request).await?;
        reply.await.map_err(|_| {
            FleetError::protocol_violation(format!("协调器拒绝了 worker {worker_id} 的统计上报"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgfleet_core::{RunStatistics, Task, WorkerId};

    #[tokio::test]
    async fn test_pull_roundtrip() {
        let (channel, mut receiver) = coordinator_channel(4);

        let server = tokio::spawn(async move {
            match receiver.recv().await {
                Some(CoordinatorRequest::Pull { request, reply }) => {
                    assert_eq!(request.worker_id, WorkerId::new("1"));
                    reply.send(TaskAssignment::Assigned(Task::light("a.bmp"))).unwrap();
                }
                other => panic!("unexpected request: {other:?}"),
            }
        });

        let assignment = channel
            .pull_task(PullRequest::new(WorkerId::new("1")))
            .await
            .unwrap();
        assert_eq!(assignment, TaskAssignment::Assigned(Task::light("a.bmp")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_reply_is_protocol_violation() {
        let (channel, mut receiver) = coordinator_channel(4);

        tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                drop(request);
            }
        });

        let err = channel
            .report_statistics(StatisticsReport::new(WorkerId::new("1"), RunStatistics::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::ProtocolViolation(_)));
    }

    #[tokio::test]
    async fn test_closed_receiver_is_channel_error() {
        let (channel, receiver) = coordinator_channel(4);
        drop(receiver);

        assert!(channel.is_closed());
        let err = channel
            .pull_task(PullRequest::new(WorkerId::new("1")))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::Channel(_)));
    }
}
