use std::io;
use std::path::PathBuf;

/// Errors raised by the streaming pipeline.
///
/// Writer-side variants are fatal for the producer. Readers map
/// `TransportUnavailable` and a corrupt tail to an empty or shortened
/// window instead of surfacing them.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Transport unavailable at {}: {source}", path.display())]
    TransportUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Transport corrupt at {}, row {row}: {reason}", path.display())]
    TransportCorrupt {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("Synthesis produced a non-finite {channel} value at t={t:.3}s")]
    SynthesisFailure { channel: &'static str, t: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Recording length mismatch: time={time}, amplitude={amplitude}")]
    LengthMismatch { time: usize, amplitude: usize },

    #[error("Filter design failed: {0}")]
    Filter(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("No tokio runtime to run the producer on: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Producer task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type StreamResult<T> = Result<T, StreamError>;
