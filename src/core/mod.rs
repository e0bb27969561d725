pub mod error;
pub mod logging;
pub mod timestamp;

pub use error::{ConfigError, FetchError, PersistError};
pub use logging::{ComponentLogger, LogContext};
pub use timestamp::*;
