// src/pool.rs
use crossbeam::channel;

/// Fixed-size set of worker threads that drains one batch of jobs.
///
/// Each batch runs inside `std::thread::scope`, so `run_all` returns only after
/// every job has finished, and jobs may borrow (`&mut`) from the caller.
/// Surplus jobs queue on the channel instead of spawning more threads.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Results come back in submission order.
    pub fn run_all<T, R, F>(&self, items: impl IntoIterator<Item = T>, job: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let (job_tx, job_rx) = channel::unbounded::<(usize, T)>();
        let mut count = 0;
        for (idx, item) in items.into_iter().enumerate() {
            // receiver is alive for the whole call
            let _ = job_tx.send((idx, item));
            count += 1;
        }
        drop(job_tx);

        if count == 0 {
            return Vec::new();
        }

        let (done_tx, done_rx) = channel::unbounded::<(usize, R)>();
        let workers = self.size.min(count);
        let job = &job;

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let done = done_tx.clone();
                scope.spawn(move || {
                    for (idx, item) in jobs.iter() {
                        let _ = done.send((idx, job(item)));
                    }
                });
            }
        });
        drop(done_tx);

        let mut slots: Vec<Option<R>> = (0..count).map(|_| None).collect();
        for (idx, result) in done_rx.try_iter() {
            slots[idx] = Some(result);
        }
        slots.into_iter().flatten().collect()
    }
}
