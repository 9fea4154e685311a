use thiserror::Error;

/// Errors from the file-backed parts of the game (history, config, replay)
#[derive(Error, Debug)]
pub enum NeuroError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    /// A replay file line that is not a band sample
    #[error("replay line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, NeuroError>;
