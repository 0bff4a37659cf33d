/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::error::Error;

/// Sequential, forward-only chunk-by-chunk reads.
///
/// This is the only thing a [`DataReader`](crate::impls::DataReader) needs
/// from its source: once a chunk has been returned it is never requested
/// again, so sources need not support seeking or rewinding.
pub trait ChunkRead {
    type Error: Error + Send + Sync + 'static;

    /// Return the next chunk, or `None` if the source is exhausted.
    ///
    /// Chunks may have any length, including zero. After `None` has been
    /// returned the method will not be called again by this crate.
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, Self::Error>;
}

/// Sequential chunk-by-chunk writes.
///
/// Implementations must deliver chunks in the order they are received.
pub trait ChunkWrite {
    type Error: Error + Send + Sync + 'static;

    /// Write a chunk. The call returns once the chunk has been accepted.
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffering of the sink itself.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<R: ChunkRead + ?Sized> ChunkRead for &mut R {
    type Error = R::Error;

    #[inline(always)]
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        (**self).read_chunk()
    }
}

impl<W: ChunkWrite + ?Sized> ChunkWrite for &mut W {
    type Error = W::Error;

    #[inline(always)]
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        (**self).write_chunk(chunk)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}
