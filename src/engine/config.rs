//! Iterator configuration

/// Configuration parameters for one iterator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EngineConfig {
    /// Maximum items in flight at once. Zero parks the iteration until raised.
    pub concurrency: usize,

    /// Label attached to every log record of this iterator.
    pub name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            name: "iter".to_string(),
        }
    }
}

impl EngineConfig {
    /// Default configuration: one item at a time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the log label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
