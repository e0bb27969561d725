// src/crawler/session.rs
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::{
    DedupGate, Fingerprint, FrameFetch, FrameRecord, FrameSink, FsFrameStore, HttpFetcher,
    PollOutcome,
};
use crate::config::FetchConfig;
use crate::core::{ComponentLogger, LogContext, timestamp};
use crate::sources::SourceDescriptor;

/// Cumulative counters for one source. Written only by its own session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub attempts: u64,
    pub successful_fetches: u64,
    pub failed_fetches: u64,
    pub persist_failures: u64,
    pub duplicates_skipped: u64,
    pub frames_saved: u64,
    pub started_at: DateTime<Utc>,
}

impl SessionStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            attempts: 0,
            successful_fetches: 0,
            failed_fetches: 0,
            persist_failures: 0,
            duplicates_skipped: 0,
            frames_saved: 0,
            started_at,
        }
    }

    /// Attempts that ended with the frame saved or recognised as unchanged.
    pub fn completed(&self) -> u64 {
        self.frames_saved + self.duplicates_skipped
    }

    pub fn success_rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            return None;
        }
        Some(self.completed() as f64 / self.attempts as f64 * 100.0)
    }
}

/// Everything needed to poll one camera: identity, fetcher, dedup state, store, stats.
///
/// The scheduler hands a session to exactly one worker per cycle, so none of
/// this state is shared and nothing here needs a lock.
pub struct SourceSession {
    source: SourceDescriptor,
    fetcher: Box<dyn FrameFetch>,
    sink: Box<dyn FrameSink>,
    gate: DedupGate,
    stats: SessionStats,
    cycle: u64,
}

impl SourceSession {
    pub fn new(
        source: SourceDescriptor,
        fetcher: Box<dyn FrameFetch>,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        Self {
            source,
            fetcher,
            sink,
            gate: DedupGate::new(),
            stats: SessionStats::new(Utc::now()),
            cycle: 0,
        }
    }

    /// HTTP fetcher plus filesystem store under `output_root/<id>/`.
    pub fn open(
        source: SourceDescriptor,
        output_root: &Path,
        fetch: &FetchConfig,
    ) -> io::Result<Self> {
        let store = FsFrameStore::new(output_root, &source.id, &fetch.default_extension)?;
        let session = Self::new(
            source,
            Box::new(HttpFetcher::new(fetch)),
            Box::new(store),
        );
        session.debug(&format!(
            "initialized '{}' → {}",
            session.display_name(),
            session.output_dir().display()
        ));
        Ok(session)
    }

    /// Tags the following attempts' log lines with the scheduler's cycle number.
    pub fn enter_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    pub fn poll_once(&mut self) -> PollOutcome {
        self.stats.attempts += 1;

        let payload = match self.fetcher.fetch(&self.source.id) {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.failed_fetches += 1;
                if e.is_timeout() {
                    self.debug(&format!("⏱ {}", e));
                } else {
                    self.debug(&format!("✗ {}", e));
                }
                return PollOutcome::FetchFailed(e);
            }
        };
        self.stats.successful_fetches += 1;

        let digest = Fingerprint::of(&payload);
        if self.gate.is_duplicate(&digest) {
            self.stats.duplicates_skipped += 1;
            let consecutive = self.gate.consecutive_duplicates();
            self.debug(&format!("⊗ duplicate #{} (skipped)", consecutive));
            return PollOutcome::DuplicateSkipped { consecutive };
        }

        let frame = FrameRecord {
            payload,
            fingerprint: digest,
            captured_at: Utc::now(),
        };

        match self.sink.persist(&self.source, &frame) {
            Ok(saved) => {
                self.gate.accept(frame.fingerprint);
                self.stats.frames_saved += 1;
                self.debug(&format!("✓ saved {} ({} bytes)", saved.filename, saved.bytes));
                PollOutcome::Saved(saved)
            }
            Err(e) => {
                self.stats.persist_failures += 1;
                self.error(&format!("persist failed: {}", e));
                PollOutcome::PersistFailed(e)
            }
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source.id
    }

    /// Falls back to the id when the registry had no name.
    pub fn display_name(&self) -> &str {
        if self.source.name.is_empty() {
            &self.source.id
        } else {
            &self.source.name
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.sink.location()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn previous_fingerprint(&self) -> Option<&Fingerprint> {
        self.gate.previous()
    }

    pub fn consecutive_duplicates(&self) -> u64 {
        self.gate.consecutive_duplicates()
    }

    pub fn summary_line(&self, now: &DateTime<Utc>) -> String {
        let s = &self.stats;
        let rate = s
            .success_rate()
            .map(|r| format!("{:5.1}%", r))
            .unwrap_or_else(|| "    -".to_string());
        format!(
            "{} | attempts={:4} ok={:3} fail={:3} saved={:3} dups={:3} rate={} uptime={}",
            self.source.id,
            s.attempts,
            s.completed(),
            s.failed_fetches + s.persist_failures,
            s.frames_saved,
            s.duplicates_skipped,
            rate,
            timestamp::format_uptime(&s.started_at, now)
        )
    }
}

impl ComponentLogger for SourceSession {
    fn log_context(&self) -> LogContext {
        LogContext::new("camera", self.source.id.as_str())
            .in_cycle(self.cycle)
            .with_attempt(self.stats.attempts)
    }
}
