use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::{FetchError, PersistError};
use crate::crawler::{FrameFetch, FrameRecord, FrameSink, PersistedFrame};
use crate::sources::SourceDescriptor;

/// Tracks how many fetches run at once, across every fetcher sharing it.
#[derive(Debug, Default, Clone)]
pub struct ConcurrencyProbe {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }
}

/// Replays a fixed sequence of fetch results, then reports a network error.
pub struct ScriptedFetcher {
    script: VecDeque<Result<Vec<u8>, FetchError>>,
    delay: Duration,
    probe: Option<ConcurrencyProbe>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        Self {
            script: script.into(),
            delay: Duration::ZERO,
            probe: None,
        }
    }

    pub fn payloads<'a>(payloads: impl IntoIterator<Item = &'a [u8]>) -> Self {
        Self::new(payloads.into_iter().map(|p| Ok(p.to_vec())).collect())
    }

    pub fn timeouts(count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|_| Err(FetchError::Timeout { timeout_ms: 60_000 }))
                .collect(),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_probe(mut self, probe: ConcurrencyProbe) -> Self {
        self.probe = Some(probe);
        self
    }
}

impl FrameFetch for ScriptedFetcher {
    fn fetch(&mut self, _source_id: &str) -> Result<Vec<u8>, FetchError> {
        if let Some(probe) = &self.probe {
            probe.enter();
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let result = self
            .script
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::network("script exhausted")));
        if let Some(probe) = &self.probe {
            probe.leave();
        }
        result
    }
}

/// Sink whose disk is always full.
pub struct FailingSink {
    dir: PathBuf,
}

impl FailingSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl FrameSink for FailingSink {
    fn persist(
        &mut self,
        _source: &SourceDescriptor,
        frame: &FrameRecord,
    ) -> Result<PersistedFrame, PersistError> {
        Err(PersistError::Image {
            path: self.dir.join(frame.fingerprint.short()),
            source: std::io::Error::other("no space left on device"),
        })
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}
