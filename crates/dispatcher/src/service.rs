use std::future::Future;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use imgfleet_core::{CoordinatorRequest, FinalReport, FleetError, FleetResult};

use crate::coordinator::Coordinator;
use crate::statistics::{ReportOutcome, StatisticsAggregator};

/// 协调器唯一的请求处理循环
///
/// 所有传输层送来的请求按到达顺序逐个处理。全部 worker 终止并上报后
/// 计算最终报告并返回。
pub struct DispatcherService {
    coordinator: Coordinator,
    aggregator: StatisticsAggregator,
    started: Instant,
}

impl DispatcherService {
    pub fn new(coordinator: Coordinator) -> Self {
        let aggregator = StatisticsAggregator::new(coordinator.roster());
        Self {
            coordinator,
            aggregator,
            started: Instant::now(),
        }
    }

    /// 指定计时起点，报告中的耗时从该时刻算起（缺省为构造时刻）
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    pub async fn run(self, requests: mpsc::Receiver<CoordinatorRequest>) -> FleetResult<FinalReport> {
        self.run_until(requests, std::future::pending::<()>()).await
    }

    pub async fn run_until<F>(
        mut self,
        mut requests: mpsc::Receiver<CoordinatorRequest>,
        shutdown: F,
    ) -> FleetResult<FinalReport>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "协调器启动: {} 个输入文件, {} 个 worker",
            self.coordinator.file_count(),
            self.coordinator.roster().len()
        );

        while !self.is_finished() {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(request) => self.handle(request),
                    None => {
                        return Err(FleetError::Channel(
                            "请求通道在运行完成前关闭".to_string(),
                        ));
                    }
                },
                _ = &mut shutdown => {
                    warn!("收到关闭信号，分发中止");
                    return Err(FleetError::Internal("分发在完成前被关闭".to_string()));
                }
            }
        }

        let elapsed = self.started.elapsed();
        let totals = self.aggregator.finish();
        let report = FinalReport::from_totals(&totals, elapsed);
        info!(
            "运行完成: 耗时 {:.2}s, 生成 {} 张图片",
            report.elapsed_seconds, report.images_generated
        );
        Ok(report)
    }

    fn is_finished(&self) -> bool {
        self.coordinator.is_complete() && self.aggregator.is_complete()
    }

    fn handle(&mut self, request: CoordinatorRequest) {
        match request {
            CoordinatorRequest::Pull { request, reply } => {
                let outcome = self.coordinator.handle_pull_request(&request.worker_id);
                // 被忽略的请求直接丢弃 reply
                if let Some(assignment) = outcome.into_assignment() {
                    if reply.send(assignment).is_err() {
                        warn!("worker {} 在收到回复前断开，已分配的任务不会重发", request.worker_id);
                    }
                }
            }
            CoordinatorRequest::Report { report, reply } => {
                let terminated = self.coordinator.is_terminated(&report.worker_id);
                if self.aggregator.accept(report, terminated) == ReportOutcome::Accepted {
                    let _ = reply.send(());
                }
            }
            CoordinatorRequest::Progress { reply } => {
                let snapshot = self.coordinator.snapshot(self.aggregator.reported());
                debug!(
                    "进度: 轻量 {}/{}, 模糊 {}/{}, 已终止 {}/{}",
                    snapshot.light_claimed,
                    snapshot.total_files,
                    snapshot.blur_claimed,
                    snapshot.total_files,
                    snapshot.terminated_workers.len(),
                    snapshot.roster_size
                );
                let _ = reply.send(snapshot);
            }
        }
    }
}
