//! Shared controller/worker synchronization state.

use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::buffer::{InputChannel, OutputBuffer};

/// Why a worker round ended with a plain byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    /// `produced` reached the quota
    Quota,
    /// The output buffer filled up
    OutputFull,
    /// The input was already exhausted when the round started
    InputExhausted,
}

/// Result code published by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResultCode {
    Pending,
    Count { produced: usize, reason: StopReason },
    EndOfStream { produced: usize },
    Error { produced: usize },
    Cancelled,
    Panicked,
}

/// Which side may touch the buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Turn {
    Caller,
    Worker,
}

/// Lock-protected part of the handshake.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) input: InputChannel,
    pub(crate) output: OutputBuffer,
    pub(crate) turn: Turn,
    pub(crate) quota: usize,
    pub(crate) produced: usize,
    /// Worker is parked in the byte source waiting for input
    pub(crate) stalled: bool,
    pub(crate) cancelled: bool,
    pub(crate) finished: bool,
    pub(crate) result: ResultCode,
}

/// One lock and two broadcast signals.
///
/// Signals are hints: every waiter re-checks its predicate on `Shared` after
/// waking, and every wait is bounded so a lost signal only costs one timeout.
#[derive(Debug)]
pub(crate) struct HandshakeState {
    shared: Mutex<Shared>,
    stalled: Condvar,
    resumed: Condvar,
}

impl HandshakeState {
    pub(crate) fn new(input: InputChannel) -> Self {
        Self {
            shared: Mutex::new(Shared {
                input,
                output: OutputBuffer::default(),
                turn: Turn::Caller,
                quota: 0,
                produced: 0,
                stalled: false,
                cancelled: false,
                // no worker has run yet
                finished: true,
                result: ResultCode::Pending,
            }),
            stalled: Condvar::new(),
            resumed: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock()
    }

    /// Returns `true` if the wait timed out.
    pub(crate) fn wait_stalled_or_timeout(
        &self,
        guard: &mut MutexGuard<'_, Shared>,
        timeout: Duration,
    ) -> bool {
        self.stalled.wait_for(guard, timeout).timed_out()
    }

    pub(crate) fn signal_stalled(&self) {
        self.stalled.notify_all();
    }

    /// Returns `true` if the wait timed out.
    pub(crate) fn wait_resumed_or_timeout(
        &self,
        guard: &mut MutexGuard<'_, Shared>,
        timeout: Duration,
    ) -> bool {
        self.resumed.wait_for(guard, timeout).timed_out()
    }

    pub(crate) fn signal_resumed(&self) {
        self.resumed.notify_all();
    }

    /// Publish the round's result and wake the controller.
    pub(crate) fn set_finished(&self, code: ResultCode) {
        {
            let mut shared = self.lock();
            shared.result = code;
            shared.stalled = false;
            shared.finished = true;
        }
        self.signal_stalled();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.lock().finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_initial_state() {
        let hs = HandshakeState::new(InputChannel::from_slice(b"x"));
        assert!(hs.is_finished());

        let shared = hs.lock();
        assert_eq!(shared.turn, Turn::Caller);
        assert_eq!(shared.result, ResultCode::Pending);
        assert!(!shared.stalled);
    }

    #[test]
    fn test_wait_times_out() {
        let hs = HandshakeState::new(InputChannel::new());
        let mut guard = hs.lock();
        let start = Instant::now();
        assert!(hs.wait_resumed_or_timeout(&mut guard, Duration::from_millis(5)));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_set_finished_wakes_waiter() {
        let hs = Arc::new(HandshakeState::new(InputChannel::new()));
        hs.lock().finished = false;

        let worker = {
            let hs = Arc::clone(&hs);
            std::thread::spawn(move || {
                hs.set_finished(ResultCode::EndOfStream { produced: 4 });
            })
        };

        let mut guard = hs.lock();
        while !guard.finished {
            hs.wait_stalled_or_timeout(&mut guard, Duration::from_millis(50));
        }
        assert_eq!(guard.result, ResultCode::EndOfStream { produced: 4 });
        drop(guard);
        worker.join().unwrap();
    }
}
