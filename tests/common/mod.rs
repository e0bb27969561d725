// tests/common/mod.rs
// Helpers shared by the integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use trafficam_crawler::core::FetchError;
use trafficam_crawler::crawler::FrameFetch;

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("trafficam-crawler-it").join(format!(
        "{}-{}-{}",
        name,
        std::process::id(),
        SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Regular files directly inside `dir`, sorted.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Camera that answers from a fixed list, optionally slowly.
pub struct Replay {
    replies: VecDeque<Result<Vec<u8>, FetchError>>,
    delay: Duration,
}

impl Replay {
    pub fn frames(frames: &[&[u8]]) -> Self {
        Self {
            replies: frames.iter().map(|f| Ok(f.to_vec())).collect(),
            delay: Duration::ZERO,
        }
    }

    pub fn timeouts(count: usize) -> Self {
        Self {
            replies: (0..count)
                .map(|_| Err(FetchError::Timeout { timeout_ms: 60_000 }))
                .collect(),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl FrameFetch for Replay {
    fn fetch(&mut self, _source_id: &str) -> Result<Vec<u8>, FetchError> {
        std::thread::sleep(self.delay);
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::network("no more replies")))
    }
}
