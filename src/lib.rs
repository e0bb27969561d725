// src/lib.rs
pub mod config;
pub mod core;
pub mod crawler;
pub mod monitoring;
pub mod pool;
pub mod report;
pub mod scheduler;
pub mod shutdown;
pub mod sources;
#[cfg(test)]
mod testing;

// Re-export the main types
pub use crawler::{Fingerprint, PollOutcome, SourceSession};
pub use scheduler::CycleScheduler;
pub use shutdown::ShutdownFlag;
pub use sources::SourceDescriptor;
