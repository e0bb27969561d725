pub mod mocks;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::utc_ms_now;

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("trafficam-crawler-tests").join(format!(
        "{}-{}-{}-{}",
        name,
        std::process::id(),
        utc_ms_now(),
        SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}

/// Regular files (not directories) directly inside `dir`, sorted by name.
pub fn files_in(dir: &std::path::Path) -> Vec<String> {
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
