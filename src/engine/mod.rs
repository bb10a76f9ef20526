//! Decode engine interface and reference engines.
//!
//! A decode engine is an opaque, stateful, strictly sequential decoder. Each
//! call to [`DecodeEngine::decode_symbol`] pulls as many bytes as it needs
//! from a [`ByteSource`] and yields one [`Symbol`]. Its internal state lives
//! in the engine value, not on any thread, so a session can move it from one
//! worker thread to the next between rounds.
//!
//! # Engines
//!
//! | Engine          | Input format                    | End of stream       |
//! |-----------------|---------------------------------|---------------------|
//! | [`Passthrough`] | raw bytes                       | optional fixed count|
//! | [`RunLength`]   | `(count, byte)` pairs           | `00 00` marker      |
//!
//! # Usage
//!
//! ```rust,ignore
//! use handoff::engine::{DecodeEngine, RunLength, Symbol};
//!
//! let mut engine = RunLength::new();
//! let mut bytes = [3u8, b'x', 0, 0].into_iter();
//! let mut source = move || bytes.next();
//! assert_eq!(engine.decode_symbol(&mut source), Symbol::Byte(b'x'));
//! ```

mod passthrough;
pub mod rle;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use passthrough::Passthrough;
pub use rle::RunLength;

/// Outcome of one decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// A decoded byte
    Byte(u8),
    /// The stream ended cleanly
    EndOfStream,
    /// The input is not valid for this engine
    Error,
}

/// Pull callback handed to the engine.
///
/// `None` means the source was closed because the session is being torn
/// down. An engine that sees `None` must return [`Symbol::Error`] promptly.
pub trait ByteSource {
    /// Next input byte, blocking until one is available
    fn next_byte(&mut self) -> Option<u8>;
}

impl<F> ByteSource for F
where
    F: FnMut() -> Option<u8>,
{
    fn next_byte(&mut self) -> Option<u8> {
        self()
    }
}

/// Stateful pull-based symbol decoder.
///
/// Not required to be `Sync`: a session never calls into the same engine
/// from two threads at once.
pub trait DecodeEngine: Send + 'static {
    /// Decode one symbol, pulling input from `source`
    fn decode_symbol(&mut self, source: &mut dyn ByteSource) -> Symbol;
}

impl<E: DecodeEngine + ?Sized> DecodeEngine for Box<E> {
    fn decode_symbol(&mut self, source: &mut dyn ByteSource) -> Symbol {
        (**self).decode_symbol(source)
    }
}

/// Built-in engine selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// [`Passthrough`] without a length limit
    Passthrough,
    /// [`RunLength`]
    #[default]
    Rle,
}

impl EngineKind {
    /// Instantiate the engine
    pub fn build(self) -> Box<dyn DecodeEngine> {
        match self {
            EngineKind::Passthrough => Box::new(Passthrough::new()),
            EngineKind::Rle => Box::new(RunLength::new()),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Passthrough => write!(f, "passthrough"),
            EngineKind::Rle => write!(f, "rle"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "passthrough" | "raw" | "none" => Ok(EngineKind::Passthrough),
            "rle" | "runlength" | "run-length" => Ok(EngineKind::Rle),
            _ => Err(format!("Unknown engine: {s}")),
        }
    }
}
