use std::sync::atomic::{AtomicUsize, Ordering};

/// 单调递增的领取游标
///
/// 每个下标最多交给一个请求者；到达列表长度后该队列在本次运行中永久耗尽。
#[derive(Debug)]
pub struct WorkQueueCursor {
    next: AtomicUsize,
    len: usize,
}

impl WorkQueueCursor {
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    /// 领取下一个下标，队列耗尽时返回 `None`
    pub fn claim(&self) -> Option<usize> {
        let len = self.len;
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < len).then_some(current + 1)
            })
            .ok()
    }

    /// 已领取的数量
    pub fn claimed(&self) -> usize {
        self.next.load(Ordering::Acquire)
    }

    pub fn is_exhausted(&self) -> bool {
        self.claimed() >= self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_claims_in_order_then_exhausts() {
        let cursor = WorkQueueCursor::new(3);
        assert_eq!(cursor.claim(), Some(0));
        assert_eq!(cursor.claim(), Some(1));
        assert_eq!(cursor.claim(), Some(2));
        assert_eq!(cursor.claim(), None);
        assert_eq!(cursor.claim(), None);
        assert_eq!(cursor.claimed(), 3);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_empty_cursor_is_exhausted() {
        let cursor = WorkQueueCursor::new(0);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.claim(), None);
    }

    #[test]
    fn test_concurrent_claims_never_repeat() {
        let cursor = Arc::new(WorkQueueCursor::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cursor = cursor.clone();
                std::thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(index) = cursor.claim() {
                        claimed.push(index);
                    }
                    claimed
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for index in handle.join().unwrap() {
                assert!(seen.insert(index), "index {index} claimed twice");
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(cursor.claimed(), 1000);
    }
}
