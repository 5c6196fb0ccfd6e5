use std::collections::BTreeSet;

use imgfleet_core::WorkerId;

/// 已收到终止信号的 worker 集合，只增不减
#[derive(Debug, Clone, Default)]
pub struct WorkerTerminationSet {
    terminated: BTreeSet<WorkerId>,
}

impl WorkerTerminationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 首次加入时返回 true
    pub fn insert(&mut self, worker_id: WorkerId) -> bool {
        self.terminated.insert(worker_id)
    }

    pub fn contains(&self, worker_id: &WorkerId) -> bool {
        self.terminated.contains(worker_id)
    }

    pub fn len(&self) -> usize {
        self.terminated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminated.is_empty()
    }

    pub fn covers<'a, I>(&self, roster: I) -> bool
    where
        I: IntoIterator<Item = &'a WorkerId>,
    {
        roster.into_iter().all(|id| self.contains(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerId> {
        self.terminated.iter()
    }
}
