use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use imgfleet_core::{RunStatistics, StatisticsReport, WorkerId};

/// 统计上报被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownWorker,
    /// worker 尚未收到终止信号
    NotTerminated,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Accepted,
    Rejected(RejectReason),
}

/// 汇总各 worker 的最终统计；每个已终止的 worker 恰好接受一次
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    expected: BTreeSet<WorkerId>,
    reports: BTreeMap<WorkerId, RunStatistics>,
}

impl StatisticsAggregator {
    pub fn new<'a, I>(roster: I) -> Self
    where
        I: IntoIterator<Item = &'a WorkerId>,
    {
        Self {
            expected: roster.into_iter().cloned().collect(),
            reports: BTreeMap::new(),
        }
    }

    pub fn accept(&mut self, report: StatisticsReport, terminated: bool) -> ReportOutcome {
        let StatisticsReport {
            worker_id,
            statistics,
        } = report;

        let reason = if !self.expected.contains(&worker_id) {
            Some(RejectReason::UnknownWorker)
        } else if !terminated {
            Some(RejectReason::NotTerminated)
        } else if self.reports.contains_key(&worker_id) {
            Some(RejectReason::Duplicate)
        } else {
            None
        };

        if let Some(reason) = reason {
            warn!("拒绝 worker {} 的统计上报: {:?}", worker_id, reason);
            return ReportOutcome::Rejected(reason);
        }

        info!(
            "收到 worker {} 的统计: 读取 {} 字节, 写入 {} 字节, 生成 {} 张图片",
            worker_id, statistics.bytes_read, statistics.bytes_written, statistics.images_generated
        );
        self.reports.insert(worker_id, statistics);
        ReportOutcome::Accepted
    }

    pub fn reported(&self) -> usize {
        self.reports.len()
    }

    pub fn is_complete(&self) -> bool {
        self.reports.len() == self.expected.len()
    }

    /// 所有上报之和，只在运行结束时计算一次
    pub fn finish(self) -> RunStatistics {
        self.reports
            .into_values()
            .fold(RunStatistics::default(), |mut total, stats| {
                total += stats;
                total
            })
    }
}
