//! 图像处理集群的共享核心
//!
//! 包含任务与统计模型、分发协议消息、错误分类，以及 worker 与协调器
//! 之间的通道接口和执行器接口。

pub mod errors;
pub mod executor_registry;
pub mod models;
pub mod traits;

pub use errors::*;
pub use executor_registry::*;
pub use models::{
    AssignmentCounts, DispatchProgress, FinalReport, PullRequest, RunStatistics, StatisticsReport, Task,
    TaskAssignment, TaskKind, WorkerId,
};
pub use traits::{CoordinatorRequest, DispatcherChannel, ExecutorRegistry, TaskExecutor};
