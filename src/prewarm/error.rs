use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrewarmError {
    #[error("a prewarm run is already in progress")]
    AlreadyRunning,
    #[error("failed to read prewarm state `{path}`: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("prewarm state `{path}` is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to persist prewarm state `{path}`: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("prewarm task failed: {0}")]
    Task(String),
}
