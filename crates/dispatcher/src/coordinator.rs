//! 任务协调器
//!
//! 拥有文件列表、两个游标、终止集合和每个 worker 的领取计数，对外只暴露
//! `handle_pull_request`。轻量队列优先；轻量耗尽后按排除策略分配模糊任务；
//! 两者都没有可分配的任务时终止该 worker。

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use imgfleet_core::{
    AssignmentCounts, DispatchProgress, FleetError, FleetResult, Task, TaskAssignment, WorkerId,
};

use crate::cursor::WorkQueueCursor;
use crate::file_list::FileList;
use crate::policy::BlurExclusionPolicy;
use crate::termination::WorkerTerminationSet;

/// 拉取请求被忽略的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// worker 已收到过终止信号
    AlreadyTerminated,
    /// worker 不在本次运行的名册中
    UnknownWorker,
}

/// 处理一次拉取请求的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    Assigned(Task),
    Terminated,
    /// 协议违规，不回复
    Ignored(IgnoreReason),
}

impl PullOutcome {
    /// 需要发回 worker 的回复；被忽略的请求没有回复
    pub fn into_assignment(self) -> Option<TaskAssignment> {
        match self {
            PullOutcome::Assigned(task) => Some(TaskAssignment::Assigned(task)),
            PullOutcome::Terminated => Some(TaskAssignment::Terminate),
            PullOutcome::Ignored(_) => None,
        }
    }
}

pub struct Coordinator {
    files: FileList,
    light: WorkQueueCursor,
    blur: WorkQueueCursor,
    policy: BlurExclusionPolicy,
    roster: BTreeSet<WorkerId>,
    terminated: WorkerTerminationSet,
    assignments: BTreeMap<WorkerId, AssignmentCounts>,
}

impl Coordinator {
    pub fn new(
        files: FileList,
        roster: Vec<WorkerId>,
        policy: BlurExclusionPolicy,
        max_workers: usize,
    ) -> FleetResult<Self> {
        if roster.is_empty() {
            return Err(FleetError::config_error("worker 名册不能为空"));
        }
        if roster.len() > max_workers {
            return Err(FleetError::capacity_exceeded("worker", max_workers, roster.len()));
        }

        let roster_len = roster.len();
        let roster: BTreeSet<WorkerId> = roster.into_iter().collect();
        if roster.len() != roster_len {
            return Err(FleetError::config_error("worker 名册包含重复的标识"));
        }

        if !files.is_empty() && roster.iter().all(|id| !policy.allows_blur(id)) {
            warn!("名册中所有 worker 都被排除在模糊任务之外，模糊输出将不会生成");
        }

        let len = files.len();
        Ok(Self {
            files,
            light: WorkQueueCursor::new(len),
            blur: WorkQueueCursor::new(len),
            policy,
            roster,
            terminated: WorkerTerminationSet::new(),
            assignments: BTreeMap::new(),
        })
    }

    pub fn handle_pull_request(&mut self, worker_id: &WorkerId) -> PullOutcome {
        if !self.roster.contains(worker_id) {
            warn!("忽略未登记 worker {} 的拉取请求", worker_id);
            return PullOutcome::Ignored(IgnoreReason::UnknownWorker);
        }
        if self.terminated.contains(worker_id) {
            warn!("忽略已终止 worker {} 的重复拉取请求", worker_id);
            return PullOutcome::Ignored(IgnoreReason::AlreadyTerminated);
        }

        if let Some(task) = self.claim_light() {
            return self.assign(worker_id, task);
        }
        if self.policy.allows_blur(worker_id) {
            if let Some(task) = self.claim_blur() {
                return self.assign(worker_id, task);
            }
        }

        self.terminated.insert(worker_id.clone());
        info!(
            "worker {} 已终止 ({}/{})",
            worker_id,
            self.terminated.len(),
            self.roster.len()
        );
        PullOutcome::Terminated
    }

    fn claim_light(&self) -> Option<Task> {
        let index = self.light.claim()?;
        self.files.get(index).map(Task::light)
    }

    fn claim_blur(&self) -> Option<Task> {
        let index = self.blur.claim()?;
        self.files.get(index).map(Task::blur)
    }

    fn assign(&mut self, worker_id: &WorkerId, task: Task) -> PullOutcome {
        debug!("分配任务 {} 给 worker {}", task, worker_id);
        self.assignments
            .entry(worker_id.clone())
            .or_default()
            .record(task.kind);
        PullOutcome::Assigned(task)
    }

    /// 名册中的每个 worker 都已终止
    pub fn is_complete(&self) -> bool {
        self.terminated.covers(&self.roster)
    }

    pub fn is_terminated(&self, worker_id: &WorkerId) -> bool {
        self.terminated.contains(worker_id)
    }

    pub fn roster(&self) -> &BTreeSet<WorkerId> {
        &self.roster
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn snapshot(&self, reported_workers: usize) -> DispatchProgress {
        DispatchProgress {
            total_files: self.files.len(),
            light_claimed: self.light.claimed(),
            blur_claimed: self.blur.claimed(),
            roster_size: self.roster.len(),
            terminated_workers: self.terminated.iter().cloned().collect(),
            reported_workers,
            assignments: self.assignments.clone(),
            complete: self.is_complete(),
        }
    }
}
