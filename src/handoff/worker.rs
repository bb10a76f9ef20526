//! Worker thread body.

use std::time::Duration;

use super::handshake::{HandshakeState, ResultCode, StopReason};
use super::source::StallingSource;
use crate::engine::{DecodeEngine, Symbol};

/// Publishes the round's result on drop, so a panicking engine still
/// releases the controller.
struct FinishGuard<'a> {
    handshake: &'a HandshakeState,
    code: Option<ResultCode>,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        let code = self.code.take().unwrap_or(ResultCode::Panicked);
        self.handshake.set_finished(code);
    }
}

/// Run one worker round and hand the engine back through the join handle.
///
/// The round ends on quota, full output, end of stream, engine error,
/// cancellation, or input that was already exhausted before the first
/// symbol. A round resumed after a stall continues inside this same call.
pub(crate) fn run<E: DecodeEngine>(
    mut engine: E,
    handshake: &HandshakeState,
    resume_interval: Duration,
) -> E {
    let mut guard = FinishGuard {
        handshake,
        code: None,
    };

    {
        let shared = handshake.lock();
        if shared.input.is_exhausted() {
            guard.code = Some(ResultCode::Count {
                produced: 0,
                reason: StopReason::InputExhausted,
            });
            return engine;
        }
    }

    let mut source = StallingSource::new(handshake, resume_interval);
    let code = loop {
        {
            let shared = handshake.lock();
            if shared.cancelled {
                break ResultCode::Cancelled;
            }
            if shared.produced >= shared.quota {
                break ResultCode::Count {
                    produced: shared.produced,
                    reason: StopReason::Quota,
                };
            }
            if shared.output.is_full() {
                break ResultCode::Count {
                    produced: shared.produced,
                    reason: StopReason::OutputFull,
                };
            }
        }

        match engine.decode_symbol(&mut source) {
            Symbol::Byte(byte) => {
                let mut shared = handshake.lock();
                if shared.cancelled {
                    break ResultCode::Cancelled;
                }
                // a decoded byte with nowhere to go cannot be handed back
                // to the engine, so the round fails instead of dropping it
                if !shared.output.push(byte) {
                    tracing::error!("output buffer filled behind the worker, byte lost");
                    break ResultCode::Error {
                        produced: shared.produced,
                    };
                }
                shared.produced += 1;
            },
            Symbol::EndOfStream => {
                break ResultCode::EndOfStream {
                    produced: handshake.lock().produced,
                };
            },
            Symbol::Error if source.is_closed() => break ResultCode::Cancelled,
            Symbol::Error => {
                break ResultCode::Error {
                    produced: handshake.lock().produced,
                };
            },
        }
    };

    guard.code = Some(code);
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{InputChannel, OutputBuffer};
    use crate::engine::Passthrough;
    use crate::handoff::handshake::Turn;

    fn prepared(input: &[u8], capacity: usize, quota: usize) -> HandshakeState {
        let hs = HandshakeState::new(InputChannel::from_slice(input));
        {
            let mut shared = hs.lock();
            shared.output = OutputBuffer::with_capacity(capacity);
            shared.quota = quota;
            shared.turn = Turn::Worker;
            shared.finished = false;
        }
        hs
    }

    #[test]
    fn test_round_stops_at_quota() {
        let hs = prepared(b"abcdef", 10, 3);
        let engine = run(Passthrough::new(), &hs, Duration::from_millis(1));

        let shared = hs.lock();
        assert!(shared.finished);
        assert_eq!(
            shared.result,
            ResultCode::Count {
                produced: 3,
                reason: StopReason::Quota
            }
        );
        assert_eq!(shared.output.filled(), b"abc");
        assert_eq!(engine.emitted(), 3);
    }

    #[test]
    fn test_round_stops_when_output_full() {
        let hs = prepared(b"abcdef", 2, 10);
        run(Passthrough::new(), &hs, Duration::from_millis(1));

        assert_eq!(
            hs.lock().result,
            ResultCode::Count {
                produced: 2,
                reason: StopReason::OutputFull
            }
        );
    }

    #[test]
    fn test_exhausted_input_ends_round_before_decoding() {
        let hs = prepared(b"", 4, 4);
        let engine = run(Passthrough::new(), &hs, Duration::from_millis(1));

        assert_eq!(
            hs.lock().result,
            ResultCode::Count {
                produced: 0,
                reason: StopReason::InputExhausted
            }
        );
        assert_eq!(engine.emitted(), 0);
    }

    #[test]
    fn test_end_of_stream_reports_count() {
        let hs = prepared(b"AB", 10, 10);
        run(Passthrough::with_length(2), &hs, Duration::from_millis(1));

        assert_eq!(hs.lock().result, ResultCode::EndOfStream { produced: 2 });
    }

    #[test]
    fn test_byte_without_room_fails_round() {
        use std::sync::Arc;

        /// Fills the output buffer behind the worker's back, then decodes.
        struct Crowding {
            handshake: Arc<HandshakeState>,
        }
        impl DecodeEngine for Crowding {
            fn decode_symbol(&mut self, _: &mut dyn crate::engine::ByteSource) -> Symbol {
                let mut shared = self.handshake.lock();
                while shared.output.push(b'.') {}
                Symbol::Byte(b'!')
            }
        }

        let hs = Arc::new(prepared(b"x", 2, 10));
        let engine = Crowding {
            handshake: Arc::clone(&hs),
        };
        run(engine, &hs, Duration::from_millis(1));

        let shared = hs.lock();
        assert_eq!(shared.result, ResultCode::Error { produced: 0 });
        assert_eq!(shared.produced, 0);
        assert_eq!(shared.output.filled(), b"..");
    }

    #[test]
    fn test_panicking_engine_still_finishes() {
        struct Boom;
        impl DecodeEngine for Boom {
            fn decode_symbol(&mut self, _: &mut dyn crate::engine::ByteSource) -> Symbol {
                panic!("boom");
            }
        }

        let hs = prepared(b"x", 1, 1);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run(Boom, &hs, Duration::from_millis(1));
        }));

        assert!(outcome.is_err());
        assert!(hs.is_finished());
        assert_eq!(hs.lock().result, ResultCode::Panicked);
    }
}
