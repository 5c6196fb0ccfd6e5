use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use imgfleet_core::{
    DefaultExecutorRegistry, DispatcherChannel, ExecutorRegistry, FleetError, FleetResult,
    PullRequest, RunStatistics, StatisticsReport, Task, TaskAssignment, TaskExecutor, WorkerId,
};
use imgfleet_imaging::KernelSize;

use crate::executors::{BlurFilterExecutor, LightFilterExecutor};

/// Worker 状态机：Requesting -> Executing -> Requesting -> ... -> Terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Requesting,
    Executing,
    Terminated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Requesting => f.write_str("requesting"),
            WorkerState::Executing => f.write_str("executing"),
            WorkerState::Terminated => f.write_str("terminated"),
        }
    }
}

/// Worker服务构建器
pub struct WorkerServiceBuilder {
    worker_id: WorkerId,
    channel: Arc<dyn DispatcherChannel>,
    executors: Vec<Arc<dyn TaskExecutor>>,
}

impl WorkerServiceBuilder {
    pub fn new(worker_id: WorkerId, channel: Arc<dyn DispatcherChannel>) -> Self {
        Self {
            worker_id,
            channel,
            executors: Vec::new(),
        }
    }

    /// 注册任务执行器
    pub fn register_executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        info!("注册任务执行器: {} ({})", executor.name(), executor.kind());
        self.executors.push(executor);
        self
    }

    /// 注册轻量滤镜与模糊执行器
    pub fn with_image_executors<P: Into<PathBuf>>(self, output_dir: P, kernel: KernelSize) -> Self {
        let output_dir = output_dir.into();
        self.register_executor(Arc::new(LightFilterExecutor::new(output_dir.clone())))
            .register_executor(Arc::new(BlurFilterExecutor::new(output_dir, kernel)))
    }

    pub async fn build(self) -> FleetResult<WorkerService> {
        let mut registry = DefaultExecutorRegistry::new();
        registry.register_batch(self.executors).await?;
        Ok(WorkerService {
            worker_id: self.worker_id,
            channel: self.channel,
            registry: Arc::new(registry),
        })
    }
}

/// 拉取式 worker 循环
pub struct WorkerService {
    worker_id: WorkerId,
    channel: Arc<dyn DispatcherChannel>,
    registry: Arc<DefaultExecutorRegistry>,
}

impl WorkerService {
    pub fn builder(worker_id: WorkerId, channel: Arc<dyn DispatcherChannel>) -> WorkerServiceBuilder {
        WorkerServiceBuilder::new(worker_id, channel)
    }

    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    /// 循环拉取并执行任务，收到终止信号后上报本地统计并返回
    ///
    /// 单个任务的图像错误只记录日志，任务视为已消费；通道或协议错误直接返回。
    pub async fn run(&self) -> FleetResult<RunStatistics> {
        let mut stats = RunStatistics::default();
        let mut state = WorkerState::Requesting;
        info!("[worker {}] 启动", self.worker_id);

        while state != WorkerState::Terminated {
            debug!("[worker {}] 状态: {}", self.worker_id, state);
            let assignment = self
                .channel
                .pull_task(PullRequest::new(self.worker_id.clone()))
                .await?;

            state = match assignment {
                TaskAssignment::Assigned(task) => {
                    state = WorkerState::Executing;
                    debug!("[worker {}] 状态: {}", self.worker_id, state);
                    self.execute(&task, &mut stats).await?;
                    WorkerState::Requesting
                }
                TaskAssignment::Terminate => WorkerState::Terminated,
            };
        }

        info!(
            "[worker {}] 已终止: 读取 {} 字节, 写入 {} 字节, 生成 {} 张图片",
            self.worker_id, stats.bytes_read, stats.bytes_written, stats.images_generated
        );
        self.channel
            .report_statistics(StatisticsReport::new(self.worker_id.clone(), stats))
            .await?;
        Ok(stats)
    }

    async fn execute(&self, task: &Task, stats: &mut RunStatistics) -> FleetResult<()> {
        let Some(executor) = self.registry.get(task.kind).await else {
            warn!("[worker {}] 没有 {} 任务的执行器，跳过 {}", self.worker_id, task.kind, task.path);
            return Ok(());
        };

        match executor.execute(task).await {
            Ok(delta) => {
                *stats += delta;
                info!(
                    "[worker {}] 完成 {} 任务: {} (生成 {} 张图片)",
                    self.worker_id, task.kind, task.path, delta.images_generated
                );
                Ok(())
            }
            Err(e) if e.is_task_local() => {
                error!("[worker {}] 任务 {} 失败: {}", self.worker_id, task, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
