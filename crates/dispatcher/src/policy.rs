use std::collections::HashSet;

use imgfleet_core::WorkerId;

/// 模糊任务排除策略：集合内的 worker 只领取轻量任务
#[derive(Debug, Clone, Default)]
pub struct BlurExclusionPolicy {
    excluded: HashSet<WorkerId>,
}

impl BlurExclusionPolicy {
    pub fn new<I, W>(excluded: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<WorkerId>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows_blur(&self, worker_id: &WorkerId) -> bool {
        !self.excluded.contains(worker_id)
    }

    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion() {
        let policy = BlurExclusionPolicy::new(["10", "11"]);
        assert!(!policy.allows_blur(&WorkerId::new("10")));
        assert!(!policy.allows_blur(&WorkerId::new("11")));
        assert!(policy.allows_blur(&WorkerId::new("1")));
        assert!(BlurExclusionPolicy::default().allows_blur(&WorkerId::new("10")));
    }
}
