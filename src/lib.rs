//! # Handoff - Off-Thread Driving of Pull-Based Decoders
//!
//! Runs a strictly sequential, pull-based decode engine on a dedicated worker
//! thread while the calling thread feeds bounded chunks of input and drains
//! bounded chunks of output. Neither side ever blocks indefinitely.
//!
//! ## Features
//!
//! - **Stall/resume handshake**: the worker parks inside the engine's byte
//!   callback when input runs dry and continues the same symbol once the
//!   caller supplies more
//! - **Bounded waits**: every wait is a timed condition wait plus predicate
//!   re-check, so a missed signal costs one timeout, never a deadlock
//! - **Cooperative cancellation**: no-progress detection and teardown close
//!   the byte source instead of killing the thread
//! - **Chunking transparency**: any split of the input decodes to the same
//!   output as the unbroken stream
//!
//! ## Architecture
//!
//! ```text
//! Caller                    Session (controller)              Worker thread
//!    |                             |                               |
//!    |-- feed(bytes) ------------->|                               |
//!    |-- decode_chunk(out, n) ---->|-- spawn / "resumed" --------->|
//!    |                             |                       engine.decode_symbol
//!    |                             |                         StallingSource
//!    |                             |<-------- "stalled" -----------|
//!    |<-- NeedMoreInput -----------|        or finished            |
//!    |                             |                               |
//!    |-- close() ----------------->|-- cancel, join -------------->x
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use handoff::{ChunkStatus, OutputBuffer, RunLength, Session};
//!
//! let mut session = Session::new(RunLength::new());
//! session.feed(&[4, b'z', 0, 0]);
//!
//! let mut out = OutputBuffer::with_capacity(64);
//! let progress = session.decode_chunk(&mut out, 64)?;
//! assert_eq!(progress.status, ChunkStatus::EndOfStream);
//! assert_eq!(out.filled(), b"zzzz");
//! ```
//!
//! ### Buffered Decompression
//!
//! ```rust,ignore
//! use handoff::{Decompressor, RunLength};
//!
//! let mut dec = Decompressor::new(RunLength::new());
//! let head = dec.decompress(&[3, b'a'], None)?;   // "aaa", needs input
//! let tail = dec.decompress(&[0, 0], None)?;      // "", eof
//! assert!(dec.eof());
//! ```
//!
//! ## Modules
//!
//! - [`handoff`]: Session controller, handshake state, worker lifecycle
//! - [`engine`]: Decode engine interface and reference engines
//! - [`buffer`]: Input channel and output buffer
//! - [`stream`]: Buffered decompressor facade
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod handoff;
pub mod stream;

// Re-exports for convenience
pub use buffer::{InputChannel, OutputBuffer};
pub use config::{Config, DecompressorConfig, SessionConfig};
pub use engine::{ByteSource, DecodeEngine, EngineKind, Passthrough, RunLength, Symbol};
pub use error::{HandoffError, Result};
pub use handoff::{ChunkStatus, Progress, Session, SessionState, SessionStats};
pub use stream::Decompressor;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
