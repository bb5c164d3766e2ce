//! Model configuration.

/// Configuration for a [`GraphModel`](crate::GraphModel).
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Whether property changes must happen inside a transaction.
    pub transactional: bool,

    /// Number of committed transactions kept for undo (0 = no history).
    pub max_undo_depth: usize,

    /// Number of events kept by the change journal for polling.
    pub journal_capacity: usize,

    /// Whether to activate entities for read as soon as they are registered.
    pub activate_on_register: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            transactional: true,
            max_undo_depth: 100,
            journal_capacity: 10_000,
            activate_on_register: false,
        }
    }
}

impl ModelConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the model is transactional.
    #[must_use]
    pub const fn transactional(mut self, value: bool) -> Self {
        self.transactional = value;
        self
    }

    /// Sets the undo history depth.
    #[must_use]
    pub const fn max_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo_depth = depth;
        self
    }

    /// Sets the change journal capacity.
    #[must_use]
    pub const fn journal_capacity(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity;
        self
    }

    /// Sets whether registration activates entities eagerly.
    #[must_use]
    pub const fn activate_on_register(mut self, value: bool) -> Self {
        self.activate_on_register = value;
        self
    }
}
