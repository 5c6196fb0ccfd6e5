use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::models::TaskKind;

/// 一个轻量任务产出的图片数
pub const LIGHT_OUTPUTS_PER_TASK: u64 = 5;

/// 统计三元组，全部单调不减
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub images_generated: u64,
}

impl RunStatistics {
    pub fn new(bytes_read: u64, bytes_written: u64, images_generated: u64) -> Self {
        Self {
            bytes_read,
            bytes_written,
            images_generated,
        }
    }

    /// 记入一个完成的轻量任务：读一次，写五次
    pub fn record_light(&mut self, image_size: u64) {
        self.bytes_read += image_size;
        self.bytes_written += LIGHT_OUTPUTS_PER_TASK * image_size;
        self.images_generated += LIGHT_OUTPUTS_PER_TASK;
    }

    /// 记入一个完成的模糊任务：读一次，写一次
    pub fn record_blur(&mut self, image_size: u64) {
        self.bytes_read += image_size;
        self.bytes_written += image_size;
        self.images_generated += 1;
    }

    pub fn record(&mut self, kind: TaskKind, image_size: u64) {
        match kind {
            TaskKind::Light => self.record_light(image_size),
            TaskKind::Blur => self.record_blur(image_size),
        }
    }

    pub fn merge(&mut self, other: &RunStatistics) {
        self.bytes_read += other.bytes_read;
        self.bytes_written += other.bytes_written;
        self.images_generated += other.images_generated;
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes_read + self.bytes_written
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for RunStatistics {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_light_and_blur() {
        let mut stats = RunStatistics::default();
        stats.record_light(100);
        stats.record(TaskKind::Blur, 100);
        assert_eq!(stats, RunStatistics::new(200, 600, 6));
        assert_eq!(stats.total_bytes(), 800);
    }

    #[test]
    fn test_merge_is_componentwise() {
        let mut a = RunStatistics::new(1, 2, 3);
        a += RunStatistics::new(10, 20, 30);
        assert_eq!(a, RunStatistics::new(11, 22, 33));
        assert!(!a.is_empty());
        assert!(RunStatistics::default().is_empty());
    }
}
