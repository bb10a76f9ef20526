//! Identity engine.

use super::{ByteSource, DecodeEngine, Symbol};

/// Copies every input byte to the output.
///
/// With [`Passthrough::with_length`] the engine reports end of stream after
/// the given number of symbols without pulling further input.
#[derive(Debug, Clone, Default)]
pub struct Passthrough {
    limit: Option<u64>,
    emitted: u64,
}

impl Passthrough {
    /// Unbounded passthrough
    pub fn new() -> Self {
        Self::default()
    }

    /// Passthrough that ends after `length` symbols
    pub fn with_length(length: u64) -> Self {
        Self {
            limit: Some(length),
            emitted: 0,
        }
    }

    /// Symbols emitted so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl DecodeEngine for Passthrough {
    fn decode_symbol(&mut self, source: &mut dyn ByteSource) -> Symbol {
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            return Symbol::EndOfStream;
        }

        match source.next_byte() {
            Some(byte) => {
                self.emitted += 1;
                Symbol::Byte(byte)
            },
            None => Symbol::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_limit_stops_without_pulling() {
        let mut engine = Passthrough::with_length(1);
        let mut pulls = 0;
        let mut source = || {
            pulls += 1;
            Some(b'a')
        };

        assert_eq!(engine.decode_symbol(&mut source), Symbol::Byte(b'a'));
        assert_eq!(engine.decode_symbol(&mut source), Symbol::EndOfStream);
        assert_eq!(engine.decode_symbol(&mut source), Symbol::EndOfStream);
        drop(source);
        assert_eq!(pulls, 1);
        assert_eq!(engine.emitted(), 1);
    }
}
