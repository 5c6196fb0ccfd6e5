use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use imgfleet_api::{create_routes, AppState};
use imgfleet_config::AppConfig;
use imgfleet_core::{FinalReport, RunStatistics, WorkerId};
use imgfleet_dispatcher::{BlurExclusionPolicy, Coordinator, DispatcherService, FileList};
use imgfleet_imaging::KernelSize;
use imgfleet_infrastructure::{
    coordinator_channel, InMemoryDispatcherChannel, DEFAULT_CHANNEL_CAPACITY,
};
use imgfleet_worker::{HttpDispatcherClient, WorkerService};
use tokio::{
    net::TcpListener,
    sync::{broadcast, oneshot},
    task::{JoinHandle, JoinSet},
};
use tracing::{error, info, warn};

const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// 应用运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// 仅运行协调器及其HTTP接口
    Dispatcher,
    /// 仅运行一个远程Worker
    Worker,
    /// 协调器与全部Worker运行在同一进程
    All,
}

impl FromStr for AppMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dispatcher" => Ok(AppMode::Dispatcher),
            "worker" => Ok(AppMode::Worker),
            "all" => Ok(AppMode::All),
            _ => Err(anyhow::anyhow!("不支持的运行模式: {s}")),
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppMode::Dispatcher => f.write_str("dispatcher"),
            AppMode::Worker => f.write_str("worker"),
            AppMode::All => f.write_str("all"),
        }
    }
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    kernel: KernelSize,
}

impl Application {
    /// 创建新的应用实例，模糊核在任何分发开始前校验
    pub fn new(config: AppConfig, mode: AppMode) -> Result<Self> {
        info!("初始化应用程序，模式: {}", mode);
        let kernel = config.imaging.kernel().context("模糊核大小无效")?;

        Ok(Self {
            config,
            mode,
            kernel,
        })
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    /// 运行应用程序，直到本次运行完成或收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {}", self.mode);

        match self.mode {
            AppMode::Dispatcher => {
                let report = self.run_dispatcher(shutdown_rx).await?;
                self.write_report(&report).await?;
            }
            AppMode::Worker => {
                self.run_worker(shutdown_rx).await?;
            }
            AppMode::All => {
                let report = self.run_all_components(shutdown_rx).await?;
                self.write_report(&report).await?;
            }
        }

        Ok(())
    }

    /// 运行Dispatcher模式
    async fn run_dispatcher(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<FinalReport> {
        let bind_address = &self.config.dispatcher.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;

        self.serve(listener, shutdown_rx).await
    }

    /// 在给定的监听器上提供分发协议，全部Worker终止并上报后停止HTTP服务
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<FinalReport> {
        let started = Instant::now();
        let coordinator = self.build_coordinator()?;
        let (channel, requests) = coordinator_channel(DEFAULT_CHANNEL_CAPACITY);
        let app = create_routes(AppState::new(channel.clone()));

        let local_addr = listener.local_addr().context("读取监听地址失败")?;
        info!("Dispatcher HTTP服务监听: {}", local_addr);

        let (server_stop_tx, server_stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_stop_rx.await;
                })
                .await
        });
        let progress = spawn_progress_logger(channel);

        let result = DispatcherService::new(coordinator)
            .started_at(started)
            .run_until(requests, async move {
                let _ = shutdown_rx.recv().await;
            })
            .await;

        progress.abort();
        let _ = server_stop_tx.send(());
        match server.await {
            Ok(Ok(())) => info!("Dispatcher HTTP服务已停止"),
            Ok(Err(e)) => error!("Dispatcher HTTP服务错误: {}", e),
            Err(e) => error!("Dispatcher HTTP服务任务异常: {}", e),
        }

        result.context("分发未能完成")
    }

    /// 运行Worker模式
    async fn run_worker(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<RunStatistics> {
        let worker = &self.config.worker;
        info!("启动Worker {}，协调器地址: {}", worker.worker_id, worker.dispatcher_url);

        let client = HttpDispatcherClient::new(
            &worker.dispatcher_url,
            Duration::from_secs(worker.request_timeout_seconds),
        )?;
        let service = WorkerService::builder(WorkerId::new(worker.worker_id.as_str()), Arc::new(client))
            .with_image_executors(worker.output_dir.as_str(), self.kernel)
            .build()
            .await?;

        tokio::select! {
            result = service.run() => {
                let statistics = result.context("Worker运行失败")?;
                info!(
                    "Worker {} 已退出: 生成 {} 张图片",
                    worker.worker_id, statistics.images_generated
                );
                Ok(statistics)
            }
            _ = shutdown_rx.recv() => {
                warn!("Worker {} 在收到终止信号前被关闭", worker.worker_id);
                Err(anyhow::anyhow!("Worker {} 被中断", worker.worker_id))
            }
        }
    }

    /// 运行所有组件：协调器与名册中的每个Worker共用进程内通道
    async fn run_all_components(
        &self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<FinalReport> {
        // 计时包含输入目录扫描
        let started = Instant::now();
        let coordinator = self.build_coordinator()?;
        let roster: Vec<WorkerId> = coordinator.roster().iter().cloned().collect();
        let (channel, requests) = coordinator_channel(DEFAULT_CHANNEL_CAPACITY);

        let dispatcher = tokio::spawn(
            DispatcherService::new(coordinator)
                .started_at(started)
                .run_until(requests, async move {
                    let _ = shutdown_rx.recv().await;
                }),
        );

        let output_dir = self.config.worker.output_dir.as_str();
        let mut workers = JoinSet::new();
        for worker_id in roster {
            let service = WorkerService::builder(worker_id.clone(), Arc::new(channel.clone()))
                .with_image_executors(output_dir, self.kernel)
                .build()
                .await?;
            workers.spawn(async move { (worker_id, service.run().await) });
        }
        let progress = spawn_progress_logger(channel);

        while let Some(joined) = workers.join_next().await {
            let failure = match joined {
                Ok((worker_id, Ok(statistics))) => {
                    info!(
                        "Worker {} 已退出: 生成 {} 张图片",
                        worker_id, statistics.images_generated
                    );
                    continue;
                }
                Ok((worker_id, Err(e))) => {
                    anyhow::Error::new(e).context(format!("Worker {worker_id} 运行失败"))
                }
                Err(e) => anyhow::Error::new(e).context("Worker任务异常退出"),
            };

            workers.abort_all();
            progress.abort();
            // 协调器先停止时，Worker的通道错误只是它的后果
            if dispatcher.is_finished() {
                dispatcher.await.context("协调器任务异常退出")??;
            } else {
                dispatcher.abort();
            }
            return Err(failure);
        }

        progress.abort();
        let report = dispatcher.await.context("协调器任务异常退出")??;
        Ok(report)
    }

    fn build_coordinator(&self) -> Result<Coordinator> {
        let dispatcher = &self.config.dispatcher;
        let files = FileList::discover(
            Path::new(&dispatcher.input_dir),
            dispatcher.max_files,
            dispatcher.max_path_len,
        )
        .with_context(|| format!("扫描输入目录失败: {}", dispatcher.input_dir))?;
        info!(
            "发现 {} 个输入文件，模糊核 {}x{}",
            files.len(),
            self.kernel,
            self.kernel
        );

        let roster = dispatcher.workers.iter().cloned().map(WorkerId::from).collect();
        let policy = BlurExclusionPolicy::new(dispatcher.blur_excluded_workers.iter().cloned());
        let coordinator = Coordinator::new(files, roster, policy, dispatcher.max_workers)?;
        Ok(coordinator)
    }

    async fn write_report(&self, report: &FinalReport) -> Result<()> {
        let path = &self.config.dispatcher.report_path;
        tokio::fs::write(path, report.render_text())
            .await
            .with_context(|| format!("写入报告失败: {path}"))?;

        let json = serde_json::to_string(report).context("序列化最终报告失败")?;
        info!("最终报告已写入 {}: {}", path, json);
        Ok(())
    }
}

/// 定期记录分发进度，协调器停止后退出
fn spawn_progress_logger(channel: InMemoryDispatcherChannel) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PROGRESS_LOG_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Ok(progress) = channel.progress().await else {
                break;
            };
            info!(
                "分发进度: 轻量 {}/{}，模糊 {}/{}，已终止 {}/{} 个Worker",
                progress.light_claimed,
                progress.total_files,
                progress.blur_claimed,
                progress.total_files,
                progress.terminated_workers.len(),
                progress.roster_size
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_mode_parse() {
        assert_eq!("dispatcher".parse::<AppMode>().unwrap(), AppMode::Dispatcher);
        assert_eq!("worker".parse::<AppMode>().unwrap(), AppMode::Worker);
        assert_eq!("all".parse::<AppMode>().unwrap(), AppMode::All);
        assert!("api".parse::<AppMode>().is_err());
        assert_eq!(AppMode::All.to_string(), "all");
    }

    #[test]
    fn test_invalid_kernel_rejected_at_construction() {
        let mut config = AppConfig::default();
        config.imaging.kernel_size = 56;
        assert!(Application::new(config, AppMode::All).is_err());
    }
}
