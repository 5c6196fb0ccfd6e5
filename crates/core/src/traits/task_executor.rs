//! 任务执行器接口
//!
//! 每种 `TaskKind` 对应一个执行器。执行器负责读取输入、写出全部输出，
//! 并在任务完整成功时返回该任务的统计增量。失败的任务不计入统计。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    models::{RunStatistics, Task, TaskKind},
    FleetResult,
};

#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// 执行器名称
    fn name(&self) -> &str;

    /// 负责的任务类别
    fn kind(&self) -> TaskKind;

    /// 执行任务，返回本任务的统计增量
    async fn execute(&self, task: &Task) -> FleetResult<RunStatistics>;
}

/// 执行器注册表
#[async_trait]
pub trait ExecutorRegistry: Send + Sync {
    async fn register(&mut self, executor: Arc<dyn TaskExecutor>) -> FleetResult<()>;

    async fn get(&self, kind: TaskKind) -> Option<Arc<dyn TaskExecutor>>;

    async fn contains(&self, kind: TaskKind) -> bool;

    async fn count(&self) -> usize;

    async fn list_executors(&self) -> HashMap<TaskKind, String>;
}
