// src/crawler/mod.rs

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::core::{FetchError, PersistError};
use crate::sources::SourceDescriptor;

/// One network retrieval for one source. No retries; the next cycle is the retry.
pub trait FrameFetch: Send {
    fn fetch(&mut self, source_id: &str) -> Result<Vec<u8>, FetchError>;
}

/// Durable storage for novel frames of a single source.
pub trait FrameSink: Send {
    fn persist(
        &mut self,
        source: &SourceDescriptor,
        frame: &FrameRecord,
    ) -> Result<PersistedFrame, PersistError>;

    fn location(&self) -> &Path;
}

/// A fetched payload on its way through one poll.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub payload: Vec<u8>,
    pub fingerprint: Fingerprint,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFrame {
    pub filename: String,
    pub image_path: PathBuf,
    pub metadata_path: PathBuf,
    pub bytes: usize,
}

#[derive(Debug)]
pub enum PollOutcome {
    Saved(PersistedFrame),
    DuplicateSkipped { consecutive: u64 },
    FetchFailed(FetchError),
    /// Fetched fine but could not be written; counts as a failed attempt.
    PersistFailed(PersistError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Saved,
    DuplicateSkipped,
    FetchFailed,
}

impl PollOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            PollOutcome::Saved(_) => OutcomeKind::Saved,
            PollOutcome::DuplicateSkipped { .. } => OutcomeKind::DuplicateSkipped,
            PollOutcome::FetchFailed(_) | PollOutcome::PersistFailed(_) => {
                OutcomeKind::FetchFailed
            }
        }
    }

    pub fn fetched(&self) -> bool {
        !matches!(self, PollOutcome::FetchFailed(_))
    }
}

pub mod dedup;
pub mod fetcher;
pub mod session;
pub mod store;

pub use dedup::{DedupGate, Fingerprint, fingerprint};
pub use fetcher::HttpFetcher;
pub use session::{SessionStats, SourceSession};
pub use store::{FrameMetadata, FsFrameStore};
