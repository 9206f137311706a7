use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("config error: {0}")]
    Config(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("invalid window size {0}: must hold at least one sample")]
    InvalidWindow(usize),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = OverlayError> = std::result::Result<T, E>;
