//! 任务协调器
//!
//! 文件发现、领取游标、模糊排除策略、终止集合、统计汇总，
//! 以及把这些组合起来的请求处理循环。

pub mod coordinator;
pub mod cursor;
pub mod file_list;
pub mod policy;
pub mod service;
pub mod statistics;
pub mod termination;

pub use coordinator::{Coordinator, IgnoreReason, PullOutcome};
pub use cursor::WorkQueueCursor;
pub use file_list::FileList;
pub use policy::BlurExclusionPolicy;
pub use service::DispatcherService;
pub use statistics::{RejectReason, ReportOutcome, StatisticsAggregator};
pub use termination::WorkerTerminationSet;
