// src/crawler/fetcher.rs

use std::error::Error as StdError;
use std::io::{self, Read};

use super::FrameFetch;
use crate::config::FetchConfig;
use crate::core::{FetchError, utc_ms_now};

/// Blocking HTTP fetcher for one camera.
///
/// Each instance owns its own `ureq::Agent`, so a source keeps its keep-alive
/// connection across cycles without sharing a pool with other sources.
pub struct HttpFetcher {
    agent: ureq::Agent,
    cfg: FetchConfig,
}

impl HttpFetcher {
    pub fn new(cfg: &FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(cfg.timeout())
            .redirects(5)
            .build();

        Self {
            agent,
            cfg: cfg.clone(),
        }
    }

    pub fn url_for(&self, source_id: &str, t_ms: u64) -> String {
        self.cfg
            .url_template
            .replace("{id}", &urlencoding::encode(source_id))
            .replace("{t}", &t_ms.to_string())
    }

    fn classify_transport(&self, transport: &ureq::Transport) -> FetchError {
        let timed_out = StdError::source(transport)
            .and_then(|s| s.downcast_ref::<io::Error>())
            .is_some_and(|e| is_timeout_kind(e.kind()))
            || transport.to_string().contains("timed out");

        if timed_out {
            FetchError::Timeout {
                timeout_ms: self.cfg.timeout_ms,
            }
        } else {
            FetchError::network(transport.to_string())
        }
    }
}

impl FrameFetch for HttpFetcher {
    fn fetch(&mut self, source_id: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(source_id, utc_ms_now());

        let response = match self
            .agent
            .get(&url)
            .set("User-Agent", &self.cfg.user_agent)
            .set("Accept", &self.cfg.accept)
            .set("Accept-Language", &self.cfg.accept_language)
            .set("Referer", &self.cfg.referer)
            .set("Connection", "keep-alive")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => return Err(FetchError::Status { status }),
            Err(ureq::Error::Transport(transport)) => {
                return Err(self.classify_transport(&transport));
            }
        };

        if response.status() != 200 {
            return Err(FetchError::Status {
                status: response.status(),
            });
        }

        let content_type = response.header("Content-Type").unwrap_or("").to_string();

        // One byte past the cap tells a truncated read apart from an exact fit.
        let limit = self.cfg.max_body_bytes;
        let mut body = Vec::new();
        response
            .into_reader()
            .take(limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| {
                if is_timeout_kind(e.kind()) {
                    FetchError::Timeout {
                        timeout_ms: self.cfg.timeout_ms,
                    }
                } else {
                    FetchError::Body { source: e }
                }
            })?;

        if body.len() as u64 > limit {
            return Err(FetchError::TooLarge { limit });
        }

        if !is_plausible_image(&content_type, body.len(), self.cfg.min_image_bytes) {
            return Err(FetchError::NotAnImage {
                content_type,
                len: body.len(),
            });
        }

        Ok(body)
    }
}

/// A 200 counts as a frame when it is image-typed or at least `min_bytes` long.
/// Small non-image bodies are the upstream's HTML error pages.
pub fn is_plausible_image(content_type: &str, len: usize, min_bytes: usize) -> bool {
    content_type.to_ascii_lowercase().contains("image") || len >= min_bytes
}

fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}
