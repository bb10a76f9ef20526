//! Handoff error types.
//!
//! # Error Classification
//!
//! Errors fall into three classes:
//!
//! - **Engine errors**: the decode engine reported invalid data. Fatal for the
//!   session, surfaced verbatim, never retried.
//! - **Protocol errors**: the caller broke turn-taking (re-presented exhausted
//!   input, called into a finished or closed session). The session is
//!   terminated or the call is refused.
//! - **Setup errors**: the worker thread could not be created, or the
//!   configuration is unusable.
//!
//! `NeedMoreInput` is *not* an error. It is a normal
//! [`ChunkStatus`](crate::handoff::ChunkStatus) returned with partial progress.

use thiserror::Error;

/// Handoff errors.
#[derive(Error, Debug)]
pub enum HandoffError {
    /// The decode engine reported the error sentinel.
    ///
    /// `produced` bytes were written to the output buffer during the failing
    /// call before the error was reported.
    #[error("Engine error after {produced} bytes")]
    Engine {
        /// Bytes written during the failing call.
        produced: usize,
    },

    /// Exhausted input was presented again with no new bytes.
    #[error("No progress: input still exhausted after NeedMoreInput")]
    NoProgress,

    /// The worker thread could not be spawned.
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The decode engine panicked on the worker thread.
    #[error("Worker thread panicked")]
    WorkerPanicked,

    /// The session already ended with an error or was cancelled.
    #[error("Session failed")]
    SessionFailed,

    /// The session was closed.
    #[error("Session closed")]
    SessionClosed,

    /// Decompression requested after the end of the stream.
    #[error("Already at end of stream")]
    StreamEnded,

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// TOML parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandoffError {
    /// Whether this error permanently ends the session that produced it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HandoffError::Engine { .. }
                | HandoffError::NoProgress
                | HandoffError::Spawn(_)
                | HandoffError::WorkerPanicked
                | HandoffError::SessionFailed
                | HandoffError::SessionClosed
        )
    }
}

/// Result type alias for handoff operations
pub type Result<T> = std::result::Result<T, HandoffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HandoffError::Engine { produced: 3 };
        assert_eq!(err.to_string(), "Engine error after 3 bytes");
        assert!(HandoffError::NoProgress.to_string().contains("No progress"));
    }

    #[test]
    fn test_terminal_classification() {
        assert!(HandoffError::NoProgress.is_terminal());
        assert!(HandoffError::Engine { produced: 0 }.is_terminal());
        assert!(!HandoffError::StreamEnded.is_terminal());
        assert!(!HandoffError::Config("bad".to_string()).is_terminal());
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        use std::error::Error as _;

        let err = HandoffError::Spawn(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "no threads",
        ));
        assert!(err.source().is_some());
    }
}
