use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures at the I/O edge that callers need to tell apart. The outline
/// pipeline itself never fails; these only come from loading inputs and
/// configuration.
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("malformed layout dump: {0}")]
    Dump(#[from] serde_json::Error),

    #[error("unsupported input {}: expected a .pdf or .json file", .0.display())]
    UnsupportedInput(PathBuf),

    #[error("processing budget of {budget:?} exceeded after {elapsed:?}")]
    Budget { budget: Duration, elapsed: Duration },

    #[error("pdfium unavailable: {0}")]
    Pdfium(String),
}
