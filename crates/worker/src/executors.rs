//! 任务执行器
//!
//! 轻量执行器把五种轻量滤镜作为一个任务组并发执行并全部等待；
//! 模糊执行器在阻塞线程池里跑一次可分离模糊。任何一个输出失败，
//! 整个任务都不计入统计。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, error};

use imgfleet_core::{FleetError, FleetResult, RunStatistics, Task, TaskExecutor, TaskKind};
use imgfleet_imaging::{
    blur_file, blur_suffix, output_path, probe_image_size, ImagingError, KernelSize, LightFilter,
};

async fn ensure_output_dir(dir: &Path) -> FleetResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| FleetError::from(ImagingError::io(dir, e)))
}

fn join_error(err: tokio::task::JoinError) -> FleetError {
    FleetError::TaskExecution(format!("滤镜线程异常退出: {err}"))
}

fn expect_kind(task: &Task, kind: TaskKind) -> FleetResult<()> {
    if task.kind != kind {
        return Err(FleetError::TaskExecution(format!(
            "执行器只处理 {kind} 任务，收到 {task}"
        )));
    }
    Ok(())
}

pub struct LightFilterExecutor {
    output_dir: PathBuf,
}

impl LightFilterExecutor {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl TaskExecutor for LightFilterExecutor {
    fn name(&self) -> &str {
        "light-filters"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Light
    }

    async fn execute(&self, task: &Task) -> FleetResult<RunStatistics> {
        expect_kind(task, TaskKind::Light)?;
        ensure_output_dir(&self.output_dir).await?;

        let input = PathBuf::from(&task.path);
        let size = {
            let input = input.clone();
            tokio::task::spawn_blocking(move || probe_image_size(input))
                .await
                .map_err(join_error)??
        };

        let mut group = JoinSet::new();
        for filter in LightFilter::ALL {
            let input = input.clone();
            let output = output_path(&self.output_dir, &input, filter.suffix());
            group.spawn_blocking(move || filter.apply_file(&input, &output).map(|_| filter));
        }

        let mut first_error = None;
        while let Some(joined) = group.join_next().await {
            match joined.map_err(join_error) {
                Ok(Ok(filter)) => debug!("{} 完成滤镜 {}", task.path, filter),
                Ok(Err(e)) => {
                    error!("{} 的滤镜失败: {}", task.path, e);
                    first_error.get_or_insert(FleetError::from(e));
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let mut stats = RunStatistics::default();
        stats.record_light(size as u64);
        Ok(stats)
    }
}

pub struct BlurFilterExecutor {
    output_dir: PathBuf,
    kernel: KernelSize,
}

impl BlurFilterExecutor {
    pub fn new<P: Into<PathBuf>>(output_dir: P, kernel: KernelSize) -> Self {
        Self {
            output_dir: output_dir.into(),
            kernel,
        }
    }

    pub fn kernel(&self) -> KernelSize {
        self.kernel
    }
}

#[async_trait]
impl TaskExecutor for BlurFilterExecutor {
    fn name(&self) -> &str {
        "box-blur"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Blur
    }

    async fn execute(&self, task: &Task) -> FleetResult<RunStatistics> {
        expect_kind(task, TaskKind::Blur)?;
        ensure_output_dir(&self.output_dir).await?;

        let input = PathBuf::from(&task.path);
        let output = output_path(&self.output_dir, &input, &blur_suffix(self.kernel));
        let kernel = self.kernel;
        let geometry = tokio::task::spawn_blocking(move || blur_file(&input, &output, kernel))
            .await
            .map_err(join_error)??;

        let mut stats = RunStatistics::default();
        stats.record_blur(geometry.image_byte_size() as u64);
        Ok(stats)
    }
}
