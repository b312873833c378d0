/// Decides which simulation ticks refresh the render set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderThrottle {
    interval: u64,
}

impl RenderThrottle {
    pub fn for_node_count(nodes: usize) -> Self {
        let interval = match nodes {
            0..500 => 1,
            500..2_000 => 3,
            2_000..5_000 => 5,
            _ => 10,
        };
        Self { interval }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// True for the first tick and every `interval`th after it.
    pub fn should_render(&self, tick: u64) -> bool {
        tick <= 1 || tick % self.interval == 0
    }
}
