//! Controller/worker handshake for running a pull-based decoder off-thread.
//!
//! A [`Session`] runs its [`DecodeEngine`](crate::engine::DecodeEngine) on a
//! dedicated worker thread. The caller feeds bounded chunks of input and
//! drains bounded chunks of output; neither side blocks indefinitely.
//!
//! # Turn-taking
//!
//! ```text
//! Caller / Controller                         Worker
//!    |                                          |
//!    |-- decode_chunk(out, quota) ------------->|  spawn (no live worker)
//!    |                                          |  or resume (parked worker)
//!    |                                 decode_symbol()
//!    |                                   next_byte() ... input empty
//!    |<-------------- "stalled" ----------------|  park in byte source
//!    |   NeedMoreInput, worker stays parked     |
//!    |                                          |
//!    |-- feed(bytes); decode_chunk ------------>|
//!    |-------------- "resumed" ---------------->|  continue same symbol
//!    |                                          |
//!    |<------------- finished ------------------|  quota / full / EOS / error
//!    |   join, map result code                  x  thread exits
//! ```
//!
//! The buffers are only touched by the side that holds the turn. Every wait
//! on either side is bounded and re-checks the real predicate on wake.
//!
//! # State Machine
//!
//! | State       | Description                          | Valid Transitions             |
//! |-------------|--------------------------------------|-------------------------------|
//! | `Idle`      | No worker alive                      | → Running                     |
//! | `Running`   | Round in progress (inside a call)    | → Idle, Stalled, Finished, Failed |
//! | `Stalled`   | Worker parked waiting for input      | → Running, Cancelled          |
//! | `Finished`  | End of stream                        | → Closed                      |
//! | `Failed`    | Engine error or worker panic         | → Closed                      |
//! | `Cancelled` | Input re-presented with no new bytes | → Closed                      |
//! | `Closed`    | Torn down                            | (terminal)                    |
//!
//! # Usage
//!
//! ```rust,ignore
//! use handoff::buffer::OutputBuffer;
//! use handoff::engine::RunLength;
//! use handoff::handoff::{ChunkStatus, Session};
//!
//! let mut session = Session::new(RunLength::new());
//! session.feed(&[3, b'a']);
//!
//! let mut out = OutputBuffer::with_capacity(16);
//! let progress = session.decode_chunk(&mut out, 16)?;
//! assert_eq!(progress.status, ChunkStatus::NeedMoreInput);
//!
//! session.feed(&[0, 0]);
//! let progress = session.decode_chunk(&mut out, 16)?;
//! assert!(progress.is_end_of_stream());
//! assert_eq!(out.filled(), b"aaa");
//! ```

mod handshake;
mod session;
mod source;
mod worker;

pub use session::{ChunkStatus, Progress, Session, SessionState, SessionStats};
