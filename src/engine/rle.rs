//! Run-length engine.
//!
//! # Format
//!
//! ```text
//! <count:u8 1..=255> <byte>   ; emit `byte` `count` times
//! 00 00                       ; end of stream
//! 00 xx (xx != 0)             ; invalid
//! ```
//!
//! The engine keeps the current run between calls, so a run that straddles
//! two input chunks (or two worker threads) decodes the same as one that
//! does not.

use super::{ByteSource, DecodeEngine, Symbol};

/// End-of-stream marker
pub const END_MARKER: [u8; 2] = [0, 0];

/// Stateful run-length decoder.
#[derive(Debug, Clone, Default)]
pub struct RunLength {
    byte: u8,
    remaining: u8,
    state: State,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum State {
    #[default]
    Running,
    Ended,
    Failed,
}

impl RunLength {
    /// Create a decoder at the start of a stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the end marker has been decoded
    pub fn is_ended(&self) -> bool {
        self.state == State::Ended
    }
}

impl DecodeEngine for RunLength {
    fn decode_symbol(&mut self, source: &mut dyn ByteSource) -> Symbol {
        match self.state {
            State::Ended => return Symbol::EndOfStream,
            State::Failed => return Symbol::Error,
            State::Running => {},
        }

        if self.remaining == 0 {
            let (Some(count), Some(byte)) = (source.next_byte(), source.next_byte()) else {
                self.state = State::Failed;
                return Symbol::Error;
            };

            match (count, byte) {
                (0, 0) => {
                    self.state = State::Ended;
                    return Symbol::EndOfStream;
                },
                (0, _) => {
                    self.state = State::Failed;
                    return Symbol::Error;
                },
                _ => {
                    self.byte = byte;
                    self.remaining = count;
                },
            }
        }

        self.remaining -= 1;
        Symbol::Byte(self.byte)
    }
}

/// Encode `data` in run-length form, terminated by [`END_MARKER`].
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + END_MARKER.len());
    let mut iter = data.iter().copied().peekable();

    while let Some(byte) = iter.next() {
        let mut count: u8 = 1;
        while count < u8::MAX && iter.peek() == Some(&byte) {
            iter.next();
            count += 1;
        }
        out.push(count);
        out.push(byte);
    }

    out.extend_from_slice(&END_MARKER);
    out
}
