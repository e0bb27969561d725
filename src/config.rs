use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::ConfigError;

pub const MIN_INTERVAL_SECS: u64 = 5;

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://giaothong.hochiminhcity.gov.vn/render/ImageHandler.ashx?id={id}&t={t}";

// ---------- Crawler ----------
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CrawlerConfig {
    pub cameras_file: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: i64,
    #[serde(default = "default_max_workers")]
    pub max_workers: i64,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
    #[serde(default = "default_final_summary_limit")]
    pub final_summary_limit: usize,
    #[serde(default = "default_sleep_slice_ms")]
    pub sleep_slice_ms: u64,
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

fn default_interval_secs() -> i64 {
    120
}

fn default_max_workers() -> i64 {
    16
}

fn default_output_dir() -> String {
    "./camera_frames".into()
}

fn default_summary_limit() -> usize {
    10
}

fn default_final_summary_limit() -> usize {
    50
}

fn default_sleep_slice_ms() -> u64 {
    1000
}

// ---------- Fetch ----------
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    /// `{id}` is replaced by the url-encoded source id, `{t}` by epoch milliseconds.
    pub url_template: String,
    pub timeout_ms: u64,
    pub min_image_bytes: usize,
    pub max_body_bytes: u64,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: String,
    pub default_extension: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.into(),
            timeout_ms: 60_000,
            min_image_bytes: 1000,
            max_body_bytes: 10 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .into(),
            accept: "image/avif,image/webp,image/apng,image/*,*/*;q=0.8".into(),
            accept_language: "en-US,en;q=0.9,vi;q=0.8".into(),
            referer: "https://giaothong.hochiminhcity.gov.vn/".into(),
            default_extension: "jpg".into(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ---------- Monitoring ----------
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonitoringConfig {
    pub bind: String,
}

// ---------- Root ----------
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub monitoring: Option<MonitoringConfig>,
}

// ---------- Loader ----------
pub fn load(path: &str) -> anyhow::Result<Config> {
    let txt = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::with_context(format!("reading {}", path), e))?;
    parse(&txt)
}

pub fn parse(txt: &str) -> anyhow::Result<Config> {
    let cfg: Config =
        toml::from_str(txt).map_err(|e| ConfigError::with_context("parsing config", e))?;
    Ok(cfg)
}

/// Settings the scheduler runs with, after validation and the interval floor.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub interval: Duration,
    pub workers: usize,
    pub sleep_slice: Duration,
    pub summary_limit: usize,
    pub final_summary_limit: usize,
    pub max_cycles: Option<u64>,
}

impl SchedulerSettings {
    pub fn new(interval: Duration, workers: usize) -> Self {
        Self {
            interval,
            workers,
            sleep_slice: Duration::from_millis(default_sleep_slice_ms()),
            summary_limit: default_summary_limit(),
            final_summary_limit: default_final_summary_limit(),
            max_cycles: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<SchedulerSettings, ConfigError> {
        let c = &self.crawler;

        if c.interval_secs <= 0 {
            return Err(ConfigError::message(format!(
                "interval_secs must be > 0 (got {})",
                c.interval_secs
            )));
        }
        if c.max_workers <= 0 {
            return Err(ConfigError::message(format!(
                "max_workers must be > 0 (got {})",
                c.max_workers
            )));
        }
        if c.sleep_slice_ms == 0 {
            return Err(ConfigError::message("sleep_slice_ms must be > 0"));
        }
        if c.cameras_file.trim().is_empty() {
            return Err(ConfigError::message("cameras_file must be set"));
        }
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::message("fetch.timeout_ms must be > 0"));
        }
        if !self.fetch.url_template.contains("{id}") {
            return Err(ConfigError::message(format!(
                "fetch.url_template '{}' has no {{id}} placeholder",
                self.fetch.url_template
            )));
        }

        let mut interval_secs = c.interval_secs as u64;
        if interval_secs < MIN_INTERVAL_SECS {
            log::warn!(
                "[config] interval_secs={} below floor, using {}s",
                interval_secs,
                MIN_INTERVAL_SECS
            );
            interval_secs = MIN_INTERVAL_SECS;
        }

        Ok(SchedulerSettings {
            interval: Duration::from_secs(interval_secs),
            workers: c.max_workers as usize,
            sleep_slice: Duration::from_millis(c.sleep_slice_ms),
            summary_limit: c.summary_limit,
            final_summary_limit: c.final_summary_limit,
            max_cycles: c.max_cycles,
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.crawler.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[crawler]
cameras_file = "cameras.json"
"#;

    #[test]
    fn test_defaults() {
        let cfg = parse(MINIMAL).unwrap();
        assert_eq!(cfg.crawler.interval_secs, 120);
        assert_eq!(cfg.crawler.max_workers, 16);
        assert_eq!(cfg.crawler.output_dir, "./camera_frames");
        assert_eq!(cfg.fetch.min_image_bytes, 1000);
        assert_eq!(cfg.fetch.url_template, DEFAULT_URL_TEMPLATE);
        assert!(cfg.monitoring.is_none());

        let settings = cfg.validate().unwrap();
        assert_eq!(settings.interval, Duration::from_secs(120));
        assert_eq!(settings.workers, 16);
        assert_eq!(settings.sleep_slice, Duration::from_secs(1));
        assert!(settings.max_cycles.is_none());
    }

    #[test]
    fn test_interval_floor() {
        let cfg = parse(
            r#"
[crawler]
cameras_file = "cameras.json"
interval_secs = 2
"#,
        )
        .unwrap();
        assert_eq!(cfg.validate().unwrap().interval, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        for (field, value) in [("interval_secs", "0"), ("interval_secs", "-3"), ("max_workers", "0")] {
            let cfg = parse(&format!(
                "[crawler]\ncameras_file = \"cameras.json\"\n{} = {}\n",
                field, value
            ))
            .unwrap();
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains(field), "{}", err);
        }
    }

    #[test]
    fn test_rejects_template_without_id() {
        let cfg = parse(
            r#"
[crawler]
cameras_file = "cameras.json"

[fetch]
url_template = "http://example.invalid/snapshot.jpg"
"#,
        )
        .unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_full_config() {
        let cfg = parse(
            r#"
[crawler]
cameras_file = "cams.json"
interval_secs = 30
max_workers = 4
output_dir = "/data/frames"
max_cycles = 3

[fetch]
timeout_ms = 5000
referer = "http://localhost/"

[monitoring]
bind = "127.0.0.1:9109"
"#,
        )
        .unwrap();
        assert_eq!(cfg.output_dir(), PathBuf::from("/data/frames"));
        assert_eq!(cfg.fetch.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.fetch.referer, "http://localhost/");
        assert_eq!(cfg.fetch.default_extension, "jpg");
        assert_eq!(cfg.monitoring.as_ref().unwrap().bind, "127.0.0.1:9109");

        let settings = cfg.validate().unwrap();
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.max_cycles, Some(3));
    }

    #[test]
    fn test_missing_crawler_section_is_error() {
        assert!(parse("[fetch]\ntimeout_ms = 10\n").is_err());
    }
}
