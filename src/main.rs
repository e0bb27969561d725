// src/main.rs

use std::path::Path;

use anyhow::Context;
use log::info;

use trafficam_crawler::config;
use trafficam_crawler::crawler::SourceSession;
use trafficam_crawler::monitoring::{self, StatusBoard};
use trafficam_crawler::sources;
use trafficam_crawler::{CycleScheduler, ShutdownFlag};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // ------------------------------------------------------------
    // Config
    // ------------------------------------------------------------
    let cfg_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".into());

    let cfg = config::load(&cfg_path)?;
    let settings = cfg.validate()?;
    info!("[trafficam] loaded {}", cfg_path);

    let cameras = sources::load_sources(Path::new(&cfg.crawler.cameras_file))?;
    info!(
        "[trafficam] {} cameras from {}",
        cameras.len(),
        cfg.crawler.cameras_file
    );

    // ------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------
    let output_root = cfg.output_dir();
    let mut sessions = Vec::with_capacity(cameras.len());
    for camera in cameras {
        let id = camera.id.clone();
        let session = SourceSession::open(camera, &output_root, &cfg.fetch)
            .with_context(|| format!("creating output directory for camera {}", id))?;
        sessions.push(session);
    }
    info!("[trafficam] output → {}", output_root.display());

    // ------------------------------------------------------------
    // Graceful shutdown
    // ------------------------------------------------------------
    let shutdown = ShutdownFlag::new();
    shutdown.install_signal_handler()?;

    // ------------------------------------------------------------
    // Monitoring
    // ------------------------------------------------------------
    let board = StatusBoard::new();
    if let Some(m) = &cfg.monitoring {
        monitoring::start_monitoring_server(&m.bind, board.clone(), shutdown.clone())?;
    }

    // ------------------------------------------------------------
    // Main loop
    // ------------------------------------------------------------
    info!("[trafficam] running – Ctrl+C to stop");

    let mut scheduler =
        CycleScheduler::new(sessions, settings, shutdown).with_status_board(board);
    let summary = scheduler.run();

    info!(
        "[trafficam] stopped after {} cycles, {} frames saved",
        summary.cycles, summary.totals.saved
    );
    Ok(())
}
