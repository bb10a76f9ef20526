//! Buffered decompressor facade over a [`Session`].
//!
//! Callers hand over arbitrary input slices and get back whatever output is
//! ready, the way one-shot `decompress(data, max_length)` bindings work.
//! Feeding the stream in chunks of any size yields the same bytes as feeding
//! it whole.
//!
//! # Usage
//!
//! ```rust,ignore
//! use handoff::engine::{rle, RunLength};
//! use handoff::stream::Decompressor;
//!
//! let encoded = rle::encode(b"hello");
//! let mut dec = Decompressor::new(RunLength::new());
//!
//! let mut out = dec.decompress(&encoded[..3], None)?.to_vec();
//! out.extend_from_slice(&dec.decompress(&encoded[3..], None)?);
//! assert!(dec.eof());
//! assert_eq!(out, b"hello");
//! ```

use bytes::Bytes;

use crate::buffer::OutputBuffer;
use crate::config::{Config, DecompressorConfig};
use crate::engine::DecodeEngine;
use crate::error::{HandoffError, Result};
use crate::handoff::{ChunkStatus, Session, SessionStats};

/// Incremental decompressor.
#[derive(Debug)]
pub struct Decompressor<E: DecodeEngine> {
    session: Session<E>,
    chunk_size: usize,
    eof: bool,
    needs_input: bool,
}

impl<E: DecodeEngine> Decompressor<E> {
    /// Create a decompressor with the default configuration
    pub fn new(engine: E) -> Self {
        Self {
            session: Session::new(engine),
            chunk_size: DecompressorConfig::default().chunk_size,
            eof: false,
            needs_input: true,
        }
    }

    /// Create a decompressor from a full configuration
    pub fn with_config(engine: E, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: Session::with_config(engine, config.session.clone())?,
            chunk_size: config.decompressor.chunk_size,
            eof: false,
            needs_input: true,
        })
    }

    /// End of stream reached
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// The decoder cannot make progress without more input
    pub fn needs_input(&self) -> bool {
        self.needs_input
    }

    /// Underlying session statistics
    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    /// Feed `data` and return up to `max_length` decoded bytes.
    ///
    /// With `max_length == None` decoding runs until the input is exhausted.
    /// Output the engine still holds at that point (the tail of a run whose
    /// header was already read, say) comes out once more input arrives.
    /// Input left unread because of `max_length` is kept for the next call.
    /// A zero `max_length` returns empty output and leaves `needs_input`
    /// unchanged.
    pub fn decompress(&mut self, data: &[u8], max_length: Option<usize>) -> Result<Bytes> {
        if self.eof {
            return Err(HandoffError::StreamEnded);
        }

        if !data.is_empty() {
            self.session.feed(data);
        }

        let mut out = Vec::new();
        loop {
            let want = match max_length {
                Some(max) => (max - out.len()).min(self.chunk_size),
                None => self.chunk_size,
            };
            if want == 0 {
                break;
            }

            // re-presenting exhausted input after NeedMoreInput ends the session
            if self.needs_input && self.session.input_remaining() == 0 {
                break;
            }

            let mut chunk = OutputBuffer::with_capacity(want);
            let progress = self.session.decode_chunk(&mut chunk, want)?;
            out.extend_from_slice(chunk.filled());

            match progress.status {
                ChunkStatus::Ok => self.needs_input = false,
                ChunkStatus::NeedMoreInput => {
                    self.needs_input = true;
                    break;
                },
                ChunkStatus::EndOfStream => {
                    self.eof = true;
                    self.needs_input = false;
                    break;
                },
            }
        }

        Ok(Bytes::from(out))
    }

    /// Tear down the session
    pub fn close(mut self) -> SessionStats {
        self.session.close();
        self.session.stats()
    }
}
