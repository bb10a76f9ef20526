//! Byte source adapter that parks the worker when input runs dry.

use std::time::Duration;

use super::handshake::{HandshakeState, Turn};
use crate::engine::ByteSource;

/// Pull callback given to the engine on the worker thread.
///
/// Must only be used from the worker, and never while the worker already
/// holds the handshake lock.
pub(crate) struct StallingSource<'a> {
    handshake: &'a HandshakeState,
    resume_interval: Duration,
    closed: bool,
}

impl<'a> StallingSource<'a> {
    pub(crate) fn new(handshake: &'a HandshakeState, resume_interval: Duration) -> Self {
        Self {
            handshake,
            resume_interval,
            closed: false,
        }
    }

    /// Whether the source returned `None` because of cancellation
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ByteSource for StallingSource<'_> {
    fn next_byte(&mut self) -> Option<u8> {
        if self.closed {
            return None;
        }

        let mut shared = self.handshake.lock();
        if shared.cancelled {
            self.closed = true;
            return None;
        }
        if let Some(byte) = shared.input.take_byte() {
            return Some(byte);
        }

        shared.stalled = true;
        self.handshake.signal_stalled();
        tracing::trace!(position = shared.input.position(), "worker stalled on empty input");

        loop {
            self.handshake
                .wait_resumed_or_timeout(&mut shared, self.resume_interval);

            if shared.cancelled {
                shared.stalled = false;
                self.closed = true;
                return None;
            }
            if shared.turn == Turn::Worker {
                if let Some(byte) = shared.input.take_byte() {
                    shared.stalled = false;
                    tracing::trace!("worker resumed");
                    return Some(byte);
                }
            }
        }
    }
}
