//! Interpreter configuration.

/// Resource limits for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Tick-counted operations allowed per run.
    pub tick_limit: usize,
    /// Maximum number of simultaneously active frames.
    pub max_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            tick_limit: 30_000,
            max_depth: 50,
        }
    }
}

impl VmConfig {
    pub fn with_tick_limit(mut self, tick_limit: usize) -> Self {
        self.tick_limit = tick_limit;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
