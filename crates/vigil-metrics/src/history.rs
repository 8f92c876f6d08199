use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// 定长指标历史，最新的在前，超出容量时淘汰最旧的
pub struct MetricHistory<T> {
    items: RwLock<VecDeque<T>>,
    capacity: usize,
}

impl<T: Clone> MetricHistory<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// 按保留时长与采集间隔计算容量
    pub fn for_retention(retention: Duration, poll_interval: Duration, buffer: usize) -> Self {
        Self::new(Self::capacity_for(retention, poll_interval, buffer))
    }

    /// `ceil(retention / interval) + buffer`
    pub fn capacity_for(retention: Duration, poll_interval: Duration, buffer: usize) -> usize {
        let interval_secs = poll_interval.as_secs().max(1);
        let samples = retention.as_secs().div_ceil(interval_secs);
        (samples as usize).saturating_add(buffer).max(1)
    }

    pub fn push(&self, item: T) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.push_front(item);
        items.truncate(self.capacity);
    }

    /// 返回当前内容的副本，最新的在前
    pub fn snapshot_all(&self) -> Vec<T> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<T> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.front().cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
