#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub live_workers: usize,
    pub idle_workers: usize,
    pub queued_items: usize,
    pub active_items: usize,
    pub total_dispatched: usize,
    pub completed_items: usize,
    pub failed_items: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.live_workers == 0 {
            return 0.0;
        }
        self.active_items as f64 / self.live_workers as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        self.queued_items as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_items + self.failed_items;
        if total == 0 {
            return 1.0;
        }
        self.completed_items as f64 / total as f64
    }
}
