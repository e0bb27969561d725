use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single fetch did not produce a usable frame.
///
/// None of these stop the fleet; the source is simply tried again next cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout (>{timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },
    #[error("request error: {message}")]
    Network { message: String },
    #[error("HTTP {status}")]
    Status { status: u16 },
    #[error("invalid response (not an image): content-type '{content_type}', {len} bytes")]
    NotAnImage { content_type: String, len: usize },
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("failed reading body: {source}")]
    Body {
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed writing image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed encoding metadata for {filename}: {source}")]
    Encode {
        filename: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed writing metadata {path:?}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{message}")]
    Message { message: String },
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ConfigError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Context {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
