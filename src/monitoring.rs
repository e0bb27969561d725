use std::fmt::Write;
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::report::{SourceSnapshot, Tally};
use crate::shutdown::ShutdownFlag;

#[derive(Debug, Clone, Default)]
pub struct FleetStatus {
    pub cycles: u64,
    pub last_cycle: Option<Tally>,
    pub sources: Vec<SourceSnapshot>,
}

/// Latest per-cycle snapshot, written by the scheduler and read by the HTTP thread.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<FleetStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, status: FleetStatus) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = status;
        }
    }

    pub fn snapshot(&self) -> FleetStatus {
        self.inner
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub fn start_monitoring_server(
    bind: &str,
    board: StatusBoard,
    shutdown: ShutdownFlag,
) -> anyhow::Result<()> {
    let server = Server::http(bind).map_err(|e| anyhow::anyhow!(e))?;
    log::info!("[monitoring] server on {}", bind);

    thread::Builder::new()
        .name("monitoring".into())
        .spawn(move || serve(server, board, shutdown))?;

    Ok(())
}

fn serve(server: Server, board: StatusBoard, shutdown: ShutdownFlag) {
    for req in server.incoming_requests() {
        let response = match (req.method(), req.url()) {
            (&Method::Get, "/health") => {
                let (status, body) = if shutdown.is_requested() {
                    (503, "stopping")
                } else {
                    (200, "ok")
                };
                text_response(body.to_string(), status, "text/plain")
            }
            (&Method::Get, "/metrics") => text_response(
                build_metrics(&board.snapshot()),
                200,
                "text/plain; version=0.0.4",
            ),
            _ => Response::from_string(String::new()).with_status_code(StatusCode(404)),
        };
        let _ = req.respond(response);
    }
}

fn text_response(
    body: String,
    status: u16,
    content_type: &str,
) -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_string(body).with_status_code(StatusCode(status));
    match Header::from_bytes("Content-Type", content_type) {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

pub fn build_metrics(status: &FleetStatus) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# HELP trafficam_cycles_total Completed polling cycles.");
    let _ = writeln!(output, "# TYPE trafficam_cycles_total counter");
    let _ = writeln!(output, "trafficam_cycles_total {}", status.cycles);

    let counters: [(&str, &str, fn(&SourceSnapshot) -> u64); 6] = [
        ("trafficam_attempts_total", "Poll attempts per camera.", |s| {
            s.stats.attempts
        }),
        (
            "trafficam_fetch_success_total",
            "Fetches that returned a plausible image.",
            |s| s.stats.successful_fetches,
        ),
        (
            "trafficam_fetch_failures_total",
            "Fetches that timed out, errored or returned no image.",
            |s| s.stats.failed_fetches,
        ),
        (
            "trafficam_persist_failures_total",
            "Novel frames that could not be written.",
            |s| s.stats.persist_failures,
        ),
        (
            "trafficam_duplicates_total",
            "Frames skipped as identical to the last saved one.",
            |s| s.stats.duplicates_skipped,
        ),
        ("trafficam_frames_saved_total", "Frames written to disk.", |s| {
            s.stats.frames_saved
        }),
    ];

    for (name, help, value) in counters {
        let _ = writeln!(output, "# HELP {} {}", name, help);
        let _ = writeln!(output, "# TYPE {} counter", name);
        for source in &status.sources {
            let _ = writeln!(
                output,
                "{}{{camera=\"{}\"}} {}",
                name,
                escape_label_value(&source.id),
                value(source)
            );
        }
    }

    let _ = writeln!(
        output,
        "# HELP trafficam_consecutive_duplicates Unchanged frames in a row per camera."
    );
    let _ = writeln!(output, "# TYPE trafficam_consecutive_duplicates gauge");
    for source in &status.sources {
        let _ = writeln!(
            output,
            "trafficam_consecutive_duplicates{{camera=\"{}\"}} {}",
            escape_label_value(&source.id),
            source.consecutive_duplicates
        );
    }

    output
}

fn escape_label_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\"', "\\\"")
}
