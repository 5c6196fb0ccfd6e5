use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{TaskKind, WorkerId};

/// 单个 worker 已领取的任务数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCounts {
    pub light: usize,
    pub blur: usize,
}

impl AssignmentCounts {
    pub fn record(&mut self, kind: TaskKind) {
        match kind {
            TaskKind::Light => self.light += 1,
            TaskKind::Blur => self.blur += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.light + self.blur
    }
}

/// 分发进度快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchProgress {
    pub total_files: usize,
    pub light_claimed: usize,
    pub blur_claimed: usize,
    pub roster_size: usize,
    pub terminated_workers: Vec<WorkerId>,
    pub reported_workers: usize,
    pub assignments: BTreeMap<WorkerId, AssignmentCounts>,
    pub complete: bool,
}

impl DispatchProgress {
    pub fn light_remaining(&self) -> usize {
        self.total_files.saturating_sub(self.light_claimed)
    }

    pub fn blur_remaining(&self) -> usize {
        self.total_files.saturating_sub(self.blur_claimed)
    }
}
