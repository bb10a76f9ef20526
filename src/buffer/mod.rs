//! Input and output byte buffers shared between caller and worker.
//!
//! Both buffers follow the same `{ bytes, position, size }` shape with the
//! invariant `position <= size`:
//!
//! - [`InputChannel`] is *exhausted* when `position == size`.
//! - [`OutputBuffer`] is *full* when `position == size`.
//!
//! The caller owns both across calls. A [`Session`](crate::handoff::Session)
//! only borrows them for the duration of a turn.

/// Caller-filled input consumed byte by byte by the decode engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputChannel {
    bytes: Vec<u8>,
    position: usize,
    consumed_total: u64,
}

impl InputChannel {
    /// Create an empty (exhausted) channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel holding a copy of `data`
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
            ..Self::default()
        }
    }

    /// Read position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of valid bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Unread bytes
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// `position == size`
    pub fn is_exhausted(&self) -> bool {
        self.position == self.bytes.len()
    }

    /// Total bytes consumed over the channel's lifetime
    pub fn consumed_total(&self) -> u64 {
        self.consumed_total
    }

    /// Unread portion
    pub fn unread(&self) -> &[u8] {
        &self.bytes[self.position..]
    }

    /// Consume the next byte, if any
    pub fn take_byte(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.position)?;
        self.position += 1;
        self.consumed_total += 1;
        Some(byte)
    }

    /// Append bytes, dropping the already consumed prefix first
    pub fn extend(&mut self, data: &[u8]) {
        if self.position > 0 {
            self.bytes.drain(..self.position);
            self.position = 0;
        }
        self.bytes.extend_from_slice(data);
    }

    /// Replace the contents and rewind to the start
    pub fn refill(&mut self, data: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(data);
        self.position = 0;
    }
}

/// Fixed-capacity sink for decoded bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl OutputBuffer {
    /// Create an empty buffer that accepts up to `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Write position
    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    /// Capacity
    pub fn size(&self) -> usize {
        self.capacity
    }

    /// Space left
    pub fn available(&self) -> usize {
        self.capacity - self.bytes.len()
    }

    /// `position == size`
    pub fn is_full(&self) -> bool {
        self.bytes.len() == self.capacity
    }

    /// Append one byte; returns `false` when full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.bytes.push(byte);
        true
    }

    /// Bytes written so far
    pub fn filled(&self) -> &[u8] {
        &self.bytes
    }

    /// Rewind to empty, keeping the capacity
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Take the written bytes
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}
