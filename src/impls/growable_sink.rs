/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::convert::Infallible;

use crate::traits::*;
#[cfg(feature = "mem_dbg")]
use mem_dbg::{MemDbg, MemSize};

/// An append-only byte buffer whose capacity doubles when it overflows.
///
/// Besides being a [`ChunkWrite`] in its own right, this is the scratch
/// buffer in which [`DataReader`](crate::impls::DataReader) accumulates the
/// bytes of strings and lines of unknown length. For that use it supports
/// indexed lookback from the end ([`at`](GrowableSink::at)), truncation of
/// trailing bytes ([`rewind`](GrowableSink::rewind)) and reuse of the
/// allocation ([`reset`](GrowableSink::reset)).
///
/// # Example
/// ```
/// use chunked_datastream::prelude::*;
///
/// let mut sink = GrowableSink::with_capacity(1);
/// sink.write_bytes(&[1, 2, 3]);
/// assert_eq!(sink.capacity(), 4);
/// assert_eq!(sink.at(-1), Some(3));
/// sink.rewind(2);
/// assert_eq!(sink.data(), &[1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct GrowableSink {
    /// The backing buffer; its length is the capacity of the sink.
    buffer: Vec<u8>,
    /// Number of valid bytes at the start of `buffer`.
    size: usize,
}

impl GrowableSink {
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a new sink with the given initial capacity (at least one byte).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity.max(1)],
            size: 0,
        }
    }

    /// Return the number of bytes written.
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Return the current allocation size.
    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Return the bytes written so far.
    #[inline(always)]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.size]
    }

    /// Double the capacity until `additional` more bytes fit.
    #[inline]
    fn reserve(&mut self, additional: usize) {
        let needed = self.size + additional;
        let mut capacity = self.buffer.len();
        if needed <= capacity {
            return;
        }
        while capacity < needed {
            capacity *= 2;
        }
        self.buffer.resize(capacity, 0);
    }

    /// Append a byte.
    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.reserve(1);
        self.buffer[self.size] = byte;
        self.size += 1;
    }

    /// Append a range of bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buffer[self.size..self.size + bytes.len()].copy_from_slice(bytes);
        self.size += bytes.len();
    }

    /// Return the byte at `index`; negative indices count from the end.
    ///
    /// Indices outside `-len..len` return `None`.
    #[must_use]
    pub fn at(&self, index: isize) -> Option<u8> {
        let index = if index < 0 {
            self.size.checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        self.data().get(index).copied()
    }

    /// Forget all bytes, keeping the allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.size = 0;
    }

    /// Forget the last `n` bytes (all of them if there are fewer).
    #[inline]
    pub fn rewind(&mut self, n: usize) {
        self.size = self.size.saturating_sub(n);
    }

    /// Consume the sink and return the bytes written.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buffer.truncate(self.size);
        self.buffer
    }
}

impl Default for GrowableSink {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl ChunkWrite for GrowableSink {
    type Error = Infallible;

    #[inline]
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        self.write_bytes(chunk);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_capacity_doubles() {
        let mut sink = GrowableSink::with_capacity(1);
        sink.write_bytes(&[1, 2, 3]);
        assert_eq!((sink.len(), sink.capacity()), (3, 4));
        sink.write_u8(4);
        assert_eq!((sink.len(), sink.capacity()), (4, 4));
        sink.write_bytes(&(5..=20).collect::<Vec<u8>>());
        assert_eq!((sink.len(), sink.capacity()), (20, 32));
        assert_eq!(sink.data(), (1..=20).collect::<Vec<u8>>().as_slice());
    }

    #[test]
    fn test_at() {
        let mut sink = GrowableSink::default();
        sink.write_bytes(b"abc");
        assert_eq!(sink.at(0), Some(b'a'));
        assert_eq!(sink.at(2), Some(b'c'));
        assert_eq!(sink.at(3), None);
        assert_eq!(sink.at(-1), Some(b'c'));
        assert_eq!(sink.at(-3), Some(b'a'));
        assert_eq!(sink.at(-4), None);
    }

    #[test]
    fn test_reset_and_rewind() {
        let mut sink = GrowableSink::with_capacity(2);
        sink.write_bytes(b"hello\r\n");
        let capacity = sink.capacity();
        sink.rewind(2);
        assert_eq!(sink.data(), b"hello");
        sink.rewind(100);
        assert!(sink.is_empty());
        sink.write_bytes(b"xy");
        sink.reset();
        assert!(sink.is_empty());
        assert_eq!(sink.capacity(), capacity);
        sink.write_u8(b'z');
        assert_eq!(sink.into_vec(), b"z");
    }

    #[test]
    fn test_as_chunk_sink() {
        let mut sink = GrowableSink::with_capacity(1);
        sink.write_chunk(&[1, 2]).unwrap();
        sink.write_chunk(&[]).unwrap();
        sink.write_chunk(&[3]).unwrap();
        assert_eq!(sink.data(), &[1, 2, 3]);
    }
}
