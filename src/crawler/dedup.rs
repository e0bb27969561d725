// src/crawler/dedup.rs
use std::fmt;

use sha2::{Digest, Sha256};

/// Length of the digest prefix embedded in frame filenames.
pub const SHORT_LEN: usize = 8;

/// SHA-256 of a frame's raw bytes, kept as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(payload: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn fingerprint(payload: &[u8]) -> Fingerprint {
    Fingerprint::of(payload)
}

/// Per-source novelty check against the last *saved* frame.
///
/// `previous` only moves forward through [`DedupGate::accept`], which the session calls
/// after the frame is on disk. Duplicates and failed saves leave it untouched.
#[derive(Debug, Default)]
pub struct DedupGate {
    previous: Option<Fingerprint>,
    consecutive_duplicates: u64,
}

impl DedupGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_duplicate(&mut self, digest: &Fingerprint) -> bool {
        if self.previous.as_ref() == Some(digest) {
            self.consecutive_duplicates += 1;
            true
        } else {
            self.consecutive_duplicates = 0;
            false
        }
    }

    pub fn accept(&mut self, digest: Fingerprint) {
        self.previous = Some(digest);
    }

    pub fn previous(&self) -> Option<&Fingerprint> {
        self.previous.as_ref()
    }

    pub fn consecutive_duplicates(&self) -> u64 {
        self.consecutive_duplicates
    }
}
