// src/core/logging.rs
use log::Level;

/// Where a log line comes from: `[camera:<id> cycle=N attempt=M]`.
///
/// Workers interleave freely, so every line a session emits carries enough to
/// attribute it without reading the surrounding output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub component: &'static str,
    pub instance_id: String,
    pub cycle: Option<u64>,
    pub attempt: Option<u64>,
}

impl LogContext {
    pub fn new(component: &'static str, instance_id: impl Into<String>) -> Self {
        Self {
            component,
            instance_id: instance_id.into(),
            cycle: None,
            attempt: None,
        }
    }

    pub fn in_cycle(mut self, cycle: u64) -> Self {
        self.cycle = (cycle > 0).then_some(cycle);
        self
    }

    pub fn with_attempt(mut self, attempt: u64) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn prefix(&self) -> String {
        let mut prefix = format!("[{}:{}", self.component, self.instance_id);
        if let Some(cycle) = self.cycle {
            prefix.push_str(&format!(" cycle={}", cycle));
        }
        if let Some(attempt) = self.attempt {
            prefix.push_str(&format!(" attempt={}", attempt));
        }
        prefix.push(']');
        prefix
    }
}

/// Prefixed logging for anything that acts on behalf of one instance.
pub trait ComponentLogger {
    fn log_context(&self) -> LogContext;

    // Context is only built when the level is enabled.
    fn log_at(&self, level: Level, message: &str) {
        if log::log_enabled!(level) {
            log::log!(level, "{} {}", self.log_context().prefix(), message);
        }
    }

    fn debug(&self, message: &str) {
        self.log_at(Level::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.log_at(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log_at(Level::Error, message);
    }
}
