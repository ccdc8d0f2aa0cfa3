use crate::registry::Outcome;
use std::time::Duration;

/// What one crawl task found out about one instance.
#[derive(Debug, Clone)]
pub struct InstanceResult {
    pub id: String,
    pub depth: usize,
    pub following_count: usize,
    pub followers_count: usize,
    /// Identifiers this task scheduled that nobody had seen before.
    pub discovered: usize,
    /// Set when `/following` worked but `/followers` did not. The instance
    /// still counts as alive.
    pub followers_error: Option<String>,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl InstanceResult {
    pub fn new(id: String, depth: usize) -> Self {
        Self {
            id,
            depth,
            following_count: 0,
            followers_count: 0,
            discovered: 0,
            followers_error: None,
            outcome: Outcome::Unresolved,
            elapsed: Duration::from_secs(0),
        }
    }

    pub fn with_outcome(mut self, outcome: Outcome, elapsed: Duration) -> Self {
        self.outcome = outcome;
        self.elapsed = elapsed;
        self
    }
}
