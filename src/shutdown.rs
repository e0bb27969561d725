// src/shutdown.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cooperative stop flag shared by the signal handler, the scheduler and the
/// health endpoint. Only read at safe points; in-flight fetches are never cut.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the request that actually flipped the flag.
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// SIGINT and SIGTERM both mean "finish the current cycle, then stop".
    pub fn install_signal_handler(&self) -> Result<(), ctrlc::Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            if flag.request() {
                log::info!("[shutdown] stop signal received; finishing current cycle then exiting");
            }
        })
    }

    /// Sleeps `total` in `slice` steps, checking the flag before each step.
    /// Returns `false` if shutdown was requested before the full wait elapsed.
    pub fn sleep_sliced(&self, total: Duration, slice: Duration) -> bool {
        let deadline = Instant::now() + total;
        loop {
            if self.is_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(slice.min(deadline - now));
        }
    }
}
