// src/scheduler.rs
use std::time::Instant;

use chrono::Utc;
use log::info;

use crate::config::SchedulerSettings;
use crate::crawler::SourceSession;
use crate::monitoring::{FleetStatus, StatusBoard};
use crate::pool::WorkerPool;
use crate::report::{self, CycleReport, FleetSummary, SourceSnapshot, Tally};
use crate::shutdown::ShutdownFlag;

/// Runs "poll every source once" cycles until shutdown (or `max_cycles`).
///
/// Owns all sessions. A cycle lends each session to exactly one pool job and
/// does not return until every job is done, so no source is polled twice at once.
pub struct CycleScheduler {
    sessions: Vec<SourceSession>,
    pool: WorkerPool,
    settings: SchedulerSettings,
    shutdown: ShutdownFlag,
    board: Option<StatusBoard>,
    cycles: u64,
}

impl CycleScheduler {
    pub fn new(
        sessions: Vec<SourceSession>,
        settings: SchedulerSettings,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            pool: WorkerPool::new(settings.workers),
            sessions,
            settings,
            shutdown,
            board: None,
            cycles: 0,
        }
    }

    pub fn with_status_board(mut self, board: StatusBoard) -> Self {
        self.board = Some(board);
        self
    }

    pub fn run(&mut self) -> FleetSummary {
        info!(
            "[scheduler] starting loop: {} cameras, interval={}s, workers={}",
            self.sessions.len(),
            self.settings.interval.as_secs(),
            self.pool.size()
        );

        while !self.shutdown.is_requested() {
            let report = self.run_cycle();
            report::log_cycle(&report, &self.sessions, self.settings.summary_limit);

            if self
                .settings
                .max_cycles
                .is_some_and(|max| self.cycles >= max)
            {
                info!("[scheduler] reached max_cycles={}", self.cycles);
                break;
            }

            let wait = self.settings.interval.saturating_sub(report.duration);
            if !wait.is_zero() {
                info!("[scheduler] waiting {:.1}s until next cycle", wait.as_secs_f64());
            }
            if !self.shutdown.sleep_sliced(wait, self.settings.sleep_slice) {
                break;
            }
        }

        info!("[scheduler] stopping after {} cycles", self.cycles);
        let summary = FleetSummary::capture(self.cycles, &self.sessions);
        report::log_final(&summary, self.settings.final_summary_limit);
        summary
    }

    /// One full cycle. Blocks until every session reached a terminal outcome.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let started_at = Utc::now();
        let start = Instant::now();
        report::log_cycle_start(self.cycles, &started_at);

        let cycle = self.cycles;
        let outcomes = self.pool.run_all(self.sessions.iter_mut(), |session| {
            session.enter_cycle(cycle);
            session.poll_once()
        });

        let report = CycleReport {
            cycle: self.cycles,
            started_at,
            duration: start.elapsed(),
            sources: self.sessions.len(),
            tally: Tally::from_outcomes(&outcomes),
        };
        self.publish(report.tally);
        report
    }

    fn publish(&self, last_cycle: Tally) {
        let Some(board) = &self.board else {
            return;
        };
        let now = Utc::now();
        board.publish(FleetStatus {
            cycles: self.cycles,
            last_cycle: Some(last_cycle),
            sources: self
                .sessions
                .iter()
                .map(|s| SourceSnapshot::capture(s, &now))
                .collect(),
        });
    }

    pub fn sessions(&self) -> &[SourceSession] {
        &self.sessions
    }
}
