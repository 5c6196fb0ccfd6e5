use serde::{Deserialize, Serialize};

use super::{RunStatistics, Task, WorkerId};

/// Worker 请求下一个任务
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub worker_id: WorkerId,
}

impl PullRequest {
    pub fn new(worker_id: WorkerId) -> Self {
        Self { worker_id }
    }
}

/// 协调器对拉取请求的回复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaskAssignment {
    Assigned(Task),
    Terminate,
}

impl TaskAssignment {
    pub fn is_terminate(&self) -> bool {
        matches!(self, TaskAssignment::Terminate)
    }
}

/// Worker 终止后上报的最终统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub worker_id: WorkerId,
    pub statistics: RunStatistics,
}

impl StatisticsReport {
    pub fn new(worker_id: WorkerId, statistics: RunStatistics) -> Self {
        Self {
            worker_id,
            statistics,
        }
    }
}
