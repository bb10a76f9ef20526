//! Session controller.
//!
//! Owns the worker thread's lifecycle and the handshake state. The caller
//! drives it with repeated [`Session::decode_chunk`] calls and replenishes
//! input between calls.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::handshake::{HandshakeState, ResultCode, StopReason, Turn};
use super::worker;
use crate::buffer::{InputChannel, OutputBuffer};
use crate::config::SessionConfig;
use crate::engine::DecodeEngine;
use crate::error::{HandoffError, Result};

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No worker alive, more rounds possible
    Idle,
    /// A worker round is in progress (only observable inside a call)
    Running,
    /// Worker parked in the byte source waiting for input
    Stalled,
    /// End of stream reached
    Finished,
    /// Engine error or worker panic
    Failed,
    /// Terminated after input was re-presented with no new bytes
    Cancelled,
    /// Closed by the caller
    Closed,
}

impl SessionState {
    /// Whether no further decoding is possible
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Finished
                | SessionState::Failed
                | SessionState::Cancelled
                | SessionState::Closed
        )
    }
}

/// Non-error outcome of a `decode_chunk` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    /// Quota reached or output buffer full
    Ok,
    /// The engine reported end of stream
    EndOfStream,
    /// Input ran out; replenish it and call again
    NeedMoreInput,
}

/// Result of a `decode_chunk` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Bytes written to the output buffer by this call
    pub bytes_produced: usize,
    /// Why the call returned
    pub status: ChunkStatus,
}

impl Progress {
    /// Create a progress report
    pub fn new(bytes_produced: usize, status: ChunkStatus) -> Self {
        Self {
            bytes_produced,
            status,
        }
    }

    /// `status == EndOfStream`
    pub fn is_end_of_stream(&self) -> bool {
        self.status == ChunkStatus::EndOfStream
    }

    /// `status == NeedMoreInput`
    pub fn needs_input(&self) -> bool {
        self.status == ChunkStatus::NeedMoreInput
    }
}

/// Decode session: one engine, one worker at a time.
pub struct Session<E: DecodeEngine> {
    id: String,
    state: SessionState,
    handshake: Arc<HandshakeState>,
    engine: Option<E>,
    worker: Option<JoinHandle<E>>,
    config: SessionConfig,
    /// Last call returned `NeedMoreInput`
    awaiting_input: bool,
    chunks: u64,
    workers_spawned: u64,
    resumes: u64,
    bytes_out: u64,
}

impl<E: DecodeEngine> Session<E> {
    /// Start a session with the default configuration
    pub fn new(engine: E) -> Self {
        Self::build(engine, SessionConfig::default())
    }

    /// Start a session with a validated configuration
    pub fn with_config(engine: E, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(engine, config))
    }

    fn build(engine: E, config: SessionConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: SessionState::Idle,
            handshake: Arc::new(HandshakeState::new(InputChannel::new())),
            engine: Some(engine),
            worker: None,
            config,
            awaiting_input: false,
            chunks: 0,
            workers_spawned: 0,
            resumes: 0,
            bytes_out: 0,
        }
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a worker thread is currently alive (running or parked)
    pub fn worker_alive(&self) -> bool {
        self.worker.is_some() && !self.handshake.is_finished()
    }

    /// The engine, when no worker currently holds it
    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Append bytes to the input channel
    pub fn feed(&self, data: &[u8]) {
        self.handshake.lock().input.extend(data);
    }

    /// Replace the input channel's contents
    pub fn refill(&self, data: &[u8]) {
        self.handshake.lock().input.refill(data);
    }

    /// Unread input bytes
    pub fn input_remaining(&self) -> usize {
        self.handshake.lock().input.remaining()
    }

    /// Inspect or mutate the input channel in place.
    ///
    /// Only meaningful between calls; a parked worker will not read new
    /// bytes until the next `decode_chunk` hands it the turn.
    pub fn with_input<R>(&self, f: impl FnOnce(&mut InputChannel) -> R) -> R {
        f(&mut self.handshake.lock().input)
    }

    /// Decode up to `quota` bytes into `output`.
    ///
    /// Returns once the worker finishes its round or parks on empty input.
    /// A parked worker stays alive across calls; the next call resumes it
    /// if new input was supplied, and cancels it with
    /// [`HandoffError::NoProgress`] if not.
    pub fn decode_chunk(&mut self, output: &mut OutputBuffer, quota: usize) -> Result<Progress> {
        match self.state {
            SessionState::Failed | SessionState::Cancelled => {
                return Err(HandoffError::SessionFailed)
            },
            SessionState::Closed => return Err(HandoffError::SessionClosed),
            SessionState::Finished => return Ok(Progress::new(0, ChunkStatus::EndOfStream)),
            SessionState::Idle | SessionState::Stalled | SessionState::Running => {},
        }

        self.chunks += 1;
        if quota == 0 || output.is_full() {
            return Ok(Progress::new(0, ChunkStatus::Ok));
        }

        let resume = {
            let mut shared = self.handshake.lock();
            let resume = !shared.finished;

            if shared.input.is_exhausted() && (resume || self.awaiting_input) {
                drop(shared);
                tracing::warn!(session = %self.id, "input re-presented without new bytes");
                self.cancel_worker();
                self.state = SessionState::Cancelled;
                return Err(HandoffError::NoProgress);
            }

            shared.quota = quota;
            shared.produced = 0;
            shared.result = ResultCode::Pending;
            shared.output = std::mem::take(output);
            shared.turn = Turn::Worker;
            if !resume {
                shared.finished = false;
            }
            resume
        };

        self.awaiting_input = false;
        self.state = SessionState::Running;

        if resume {
            self.resumes += 1;
            tracing::trace!(session = %self.id, quota, "resuming stalled worker");
            self.handshake.signal_resumed();
        } else if let Err(err) = self.spawn_worker() {
            let mut shared = self.handshake.lock();
            *output = std::mem::take(&mut shared.output);
            shared.turn = Turn::Caller;
            shared.finished = true;
            drop(shared);
            self.state = SessionState::Failed;
            return Err(err);
        }

        self.await_round(output)
    }

    fn spawn_worker(&mut self) -> Result<()> {
        let engine = self.engine.take().ok_or(HandoffError::SessionFailed)?;
        let handshake = Arc::clone(&self.handshake);
        let resume_interval = self.config.resume_interval();

        let handle = std::thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || worker::run(engine, &handshake, resume_interval))
            .map_err(HandoffError::Spawn)?;

        self.worker = Some(handle);
        self.workers_spawned += 1;
        tracing::debug!(session = %self.id, round = self.workers_spawned, "spawned worker");
        Ok(())
    }

    /// Poll until the worker finishes or parks on exhausted input.
    fn await_round(&mut self, output: &mut OutputBuffer) -> Result<Progress> {
        let (finished, code, produced) = {
            let mut shared = self.handshake.lock();
            let poll = self.config.poll_interval();
            loop {
                // a finished worker may also leave the input exhausted
                if shared.finished {
                    break;
                }
                if shared.stalled && shared.input.is_exhausted() {
                    break;
                }
                self.handshake.wait_stalled_or_timeout(&mut shared, poll);
            }

            *output = std::mem::take(&mut shared.output);
            shared.turn = Turn::Caller;
            (shared.finished, shared.result, shared.produced)
        };

        self.bytes_out += produced as u64;

        if !finished {
            self.state = SessionState::Stalled;
            self.awaiting_input = true;
            tracing::trace!(session = %self.id, produced, "worker stalled, returning to caller");
            return Ok(Progress::new(produced, ChunkStatus::NeedMoreInput));
        }

        let panicked = match self.worker.take().map(JoinHandle::join) {
            Some(Ok(engine)) => {
                self.engine = Some(engine);
                false
            },
            Some(Err(_)) => true,
            None => false,
        };

        tracing::debug!(session = %self.id, ?code, "worker round finished");

        match code {
            _ if panicked => {
                self.state = SessionState::Failed;
                Err(HandoffError::WorkerPanicked)
            },
            ResultCode::Count { produced, reason } => {
                self.state = SessionState::Idle;
                if reason == StopReason::InputExhausted {
                    self.awaiting_input = true;
                    Ok(Progress::new(produced, ChunkStatus::NeedMoreInput))
                } else {
                    Ok(Progress::new(produced, ChunkStatus::Ok))
                }
            },
            ResultCode::EndOfStream { produced } => {
                self.state = SessionState::Finished;
                Ok(Progress::new(produced, ChunkStatus::EndOfStream))
            },
            ResultCode::Error { produced } => {
                self.state = SessionState::Failed;
                Err(HandoffError::Engine { produced })
            },
            ResultCode::Panicked => {
                self.state = SessionState::Failed;
                Err(HandoffError::WorkerPanicked)
            },
            ResultCode::Cancelled | ResultCode::Pending => {
                self.state = SessionState::Failed;
                Err(HandoffError::SessionFailed)
            },
        }
    }

    /// Cooperatively cancel a live worker and reclaim the engine.
    ///
    /// Best effort: a worker that does not reach a cancellation point within
    /// the grace period is detached.
    fn cancel_worker(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        self.handshake.lock().cancelled = true;
        self.handshake.signal_resumed();

        let deadline = Instant::now() + self.config.cancel_grace();
        let finished = {
            let mut shared = self.handshake.lock();
            while !shared.finished {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                self.handshake
                    .wait_stalled_or_timeout(&mut shared, deadline - now);
            }
            shared.turn = Turn::Caller;
            shared.finished
        };

        if !finished {
            tracing::warn!(session = %self.id, "worker did not exit within grace period, detaching");
            return;
        }

        match handle.join() {
            Ok(engine) => self.engine = Some(engine),
            Err(_) => tracing::warn!(session = %self.id, "worker panicked during cancellation"),
        }
    }

    /// Cancel any running worker and release the engine.
    ///
    /// Idempotent; also runs on drop.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        self.cancel_worker();
        self.engine = None;
        self.state = SessionState::Closed;
        tracing::debug!(session = %self.id, chunks = self.chunks, "session closed");
    }

    /// Get session statistics
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.id.clone(),
            state: self.state,
            chunks: self.chunks,
            workers_spawned: self.workers_spawned,
            resumes: self.resumes,
            bytes_in: self.handshake.lock().input.consumed_total(),
            bytes_out: self.bytes_out,
        }
    }
}

impl<E: DecodeEngine> Drop for Session<E> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<E: DecodeEngine> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("worker_alive", &self.worker_alive())
            .finish_non_exhaustive()
    }
}

/// Session statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session ID
    pub session_id: String,
    /// Current state
    pub state: SessionState,
    /// `decode_chunk` calls
    pub chunks: u64,
    /// Worker threads started
    pub workers_spawned: u64,
    /// Stalled workers resumed
    pub resumes: u64,
    /// Input bytes consumed by the engine
    pub bytes_in: u64,
    /// Output bytes produced
    pub bytes_out: u64,
}

impl SessionStats {
    /// Output bytes per input byte
    pub fn expansion_ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            0.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64
        }
    }
}
