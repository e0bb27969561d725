// src/report.rs
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::info;

use crate::core::timestamp;
use crate::crawler::{OutcomeKind, PollOutcome, SessionStats, SourceSession};

/// Attempts and outcomes summed over a set of polls.
///
/// `ok + fail == attempts`; a frame that was fetched but could not be written
/// counts as `fail`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub attempts: u64,
    pub ok: u64,
    pub fail: u64,
    pub saved: u64,
    pub dups: u64,
}

impl Tally {
    pub fn record(&mut self, outcome: &PollOutcome) {
        self.attempts += 1;
        match outcome.kind() {
            OutcomeKind::Saved => {
                self.ok += 1;
                self.saved += 1;
            }
            OutcomeKind::DuplicateSkipped => {
                self.ok += 1;
                self.dups += 1;
            }
            OutcomeKind::FetchFailed => self.fail += 1,
        }
    }

    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a PollOutcome>) -> Self {
        let mut tally = Tally::default();
        for outcome in outcomes {
            tally.record(outcome);
        }
        tally
    }

    pub fn from_stats(stats: &SessionStats) -> Self {
        Tally {
            attempts: stats.attempts,
            ok: stats.frames_saved + stats.duplicates_skipped,
            fail: stats.failed_fetches + stats.persist_failures,
            saved: stats.frames_saved,
            dups: stats.duplicates_skipped,
        }
    }

    pub fn add(&mut self, other: &Tally) {
        self.attempts += other.attempts;
        self.ok += other.ok;
        self.fail += other.fail;
        self.saved += other.saved;
        self.dups += other.dups;
    }
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub sources: usize,
    pub tally: Tally,
}

impl CycleReport {
    pub fn line(&self) -> String {
        format!(
            "cycle {} done in {:.1}s. cameras={} attempts={} ok={} fail={} saved={} dups={}",
            self.cycle,
            self.duration.as_secs_f64(),
            self.sources,
            self.tally.attempts,
            self.tally.ok,
            self.tally.fail,
            self.tally.saved,
            self.tally.dups
        )
    }
}

/// Point-in-time copy of one session, safe to hand to other threads.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub id: String,
    pub name: String,
    pub stats: SessionStats,
    pub consecutive_duplicates: u64,
    pub summary: String,
}

impl SourceSnapshot {
    pub fn capture(session: &SourceSession, now: &DateTime<Utc>) -> Self {
        Self {
            id: session.source_id().to_string(),
            name: session.display_name().to_string(),
            stats: session.stats().clone(),
            consecutive_duplicates: session.consecutive_duplicates(),
            summary: session.summary_line(now),
        }
    }
}

/// What the scheduler hands back when it stops.
#[derive(Debug, Clone)]
pub struct FleetSummary {
    pub cycles: u64,
    pub totals: Tally,
    pub sources: Vec<SourceSnapshot>,
}

impl FleetSummary {
    pub fn capture(cycles: u64, sessions: &[SourceSession]) -> Self {
        let now = Utc::now();
        let sources: Vec<SourceSnapshot> = sessions
            .iter()
            .map(|s| SourceSnapshot::capture(s, &now))
            .collect();
        let mut totals = Tally::default();
        for source in &sources {
            totals.add(&Tally::from_stats(&source.stats));
        }
        Self {
            cycles,
            totals,
            sources,
        }
    }

    pub fn source(&self, id: &str) -> Option<&SourceSnapshot> {
        self.sources.iter().find(|s| s.id == id)
    }
}

pub fn log_cycle_start(cycle: u64, started_at: &DateTime<Utc>) {
    info!("[cycle {}] start {}", cycle, timestamp::iso_utc(started_at));
}

pub fn log_cycle(report: &CycleReport, sessions: &[SourceSession], limit: usize) {
    info!("{}", report.line());
    if limit == 0 || sessions.is_empty() {
        return;
    }

    let now = Utc::now();
    info!("per-camera summary (first {}):", limit.min(sessions.len()));
    for session in sessions.iter().take(limit) {
        info!("  {}", session.summary_line(&now));
    }
}

pub fn log_final(summary: &FleetSummary, limit: usize) {
    let t = &summary.totals;
    info!(
        "final stats after {} cycles: cameras={} attempts={} ok={} fail={} saved={} dups={}",
        summary.cycles,
        summary.sources.len(),
        t.attempts,
        t.ok,
        t.fail,
        t.saved,
        t.dups
    );
    for source in summary.sources.iter().take(limit) {
        info!("  {}", source.summary);
    }
    if summary.sources.len() > limit {
        info!("  ... {} more cameras", summary.sources.len() - limit);
    }
}
