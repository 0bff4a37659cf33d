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

/// An implementation of [`ChunkWrite`] appending to a [`Vec<u8>`].
///
/// The vector can be owned or borrowed, so that it can be inspected once the
/// writer using the sink has been dropped.
///
/// # Example
/// ```
/// use chunked_datastream::prelude::*;
///
/// let mut bytes = vec![];
/// let mut sink = MemChunkSink::new(&mut bytes);
/// sink.write_chunk(&[1, 2]).unwrap();
/// sink.write_chunk(&[3]).unwrap();
/// assert_eq!(sink.chunks_written(), 2);
/// assert_eq!(bytes, [1, 2, 3]);
/// ```
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct MemChunkSink<B: AsMut<Vec<u8>>> {
    data: B,
    chunks_written: usize,
}

impl<B: AsMut<Vec<u8>> + AsRef<Vec<u8>>> MemChunkSink<B> {
    /// Create a new [`MemChunkSink`] appending to `data`.
    #[must_use]
    pub fn new(data: B) -> Self {
        Self {
            data,
            chunks_written: 0,
        }
    }

    /// Return the bytes written so far, including those that were in the
    /// vector at construction time.
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Return the number of calls to [`write_chunk`](ChunkWrite::write_chunk).
    pub fn chunks_written(&self) -> usize {
        self.chunks_written
    }

    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsMut<Vec<u8>>> ChunkWrite for MemChunkSink<B> {
    type Error = Infallible;

    #[inline]
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        self.data.as_mut().extend_from_slice(chunk);
        self.chunks_written += 1;
        Ok(())
    }
}
