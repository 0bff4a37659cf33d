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

/// An implementation of [`ChunkRead`] for a slice of memory.
///
/// By default the whole slice is returned as a single chunk; with
/// [`with_chunk_size`](MemChunkSource::with_chunk_size) it is split into
/// chunks of fixed size (the last one possibly shorter).
///
/// # Example
/// ```
/// use chunked_datastream::prelude::*;
///
/// let mut source = MemChunkSource::with_chunk_size([1_u8, 2, 3], 2);
/// assert_eq!(source.read_chunk().unwrap(), Some(vec![1, 2]));
/// assert_eq!(source.read_chunk().unwrap(), Some(vec![3]));
/// assert_eq!(source.read_chunk().unwrap(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct MemChunkSource<B: AsRef<[u8]>> {
    data: B,
    position: usize,
    chunk_size: usize,
}

impl<B: AsRef<[u8]>> MemChunkSource<B> {
    /// Create a new [`MemChunkSource`] returning `data` as a single chunk.
    #[must_use]
    pub fn new(data: B) -> Self {
        Self {
            data,
            position: 0,
            chunk_size: usize::MAX,
        }
    }

    /// Create a new [`MemChunkSource`] returning `data` in chunks of
    /// `chunk_size` bytes (at least one).
    #[must_use]
    pub fn with_chunk_size(data: B, chunk_size: usize) -> Self {
        Self {
            data,
            position: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]>> ChunkRead for MemChunkSource<B> {
    type Error = Infallible;

    #[inline]
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        let data = self.data.as_ref();
        if self.position >= data.len() {
            return Ok(None);
        }
        let end = data.len().min(self.position.saturating_add(self.chunk_size));
        let chunk = data[self.position..end].to_vec();
        self.position = end;
        Ok(Some(chunk))
    }
}

/// An implementation of [`ChunkRead`] returning the chunks of an iterator,
/// in order. Useful to reproduce arbitrary (also empty) chunk boundaries.
///
/// # Example
/// ```
/// use chunked_datastream::prelude::*;
///
/// let source = IterChunkSource::new([vec![0b1100_1010], vec![], vec![0xff]]);
/// let mut reader = DataReader::new(source);
/// assert_eq!(reader.read_u8().unwrap(), Some(0b1100_1010));
/// assert_eq!(reader.read_u8().unwrap(), Some(0xff));
/// assert_eq!(reader.read_u8().unwrap(), None);
/// ```
#[derive(Debug, Clone)]
pub struct IterChunkSource<I> {
    chunks: I,
}

impl<I: Iterator<Item = Vec<u8>>> IterChunkSource<I> {
    pub fn new<C: IntoIterator<IntoIter = I>>(chunks: C) -> Self {
        Self {
            chunks: chunks.into_iter(),
        }
    }
}

impl<I: Iterator<Item = Vec<u8>>> ChunkRead for IterChunkSource<I> {
    type Error = Infallible;

    #[inline]
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.chunks.next())
    }
}
