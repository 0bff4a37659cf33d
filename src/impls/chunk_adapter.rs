/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::*;
#[cfg(feature = "mem_dbg")]
use mem_dbg::{MemDbg, MemSize};
use std::io::{ErrorKind, Read, Write};

/// An adapter from [`Read`] and [`Write`] to [`ChunkRead`] and [`ChunkWrite`],
/// respectively.
///
/// Instances of this struct can be created using [`ChunkAdapter::new`] or
/// [`ChunkAdapter::with_chunk_size`]. They turn every standard source or
/// destination of bytes (such as [`std::fs::File`], [`std::io::BufReader`],
/// sockets, etc.) into a source or destination of chunks.
///
/// On the read side, every call to [`read_chunk`](ChunkAdapter::read_chunk)
/// performs a single successful [`Read::read`] of at most `chunk_size` bytes,
/// so chunks may be shorter than `chunk_size`. On the write side, every chunk
/// is written in full with [`Write::write_all`]. Dropping the adapter, or
/// calling [`into_inner`](ChunkAdapter::into_inner), closes it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
pub struct ChunkAdapter<B> {
    backend: B,
    chunk_size: usize,
}

impl<B> ChunkAdapter<B> {
    pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

    /// Create a new [`ChunkAdapter`] reading chunks of
    /// [`DEFAULT_CHUNK_SIZE`](Self::DEFAULT_CHUNK_SIZE) bytes.
    pub fn new(backend: B) -> Self {
        Self::with_chunk_size(backend, Self::DEFAULT_CHUNK_SIZE)
    }

    /// Create a new [`ChunkAdapter`] reading chunks of at most `chunk_size`
    /// bytes (at least one).
    pub fn with_chunk_size(backend: B, chunk_size: usize) -> Self {
        Self {
            backend,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn into_inner(self) -> B {
        self.backend
    }
}

impl<B: Read> ChunkRead for ChunkAdapter<B> {
    type Error = std::io::Error;

    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut chunk = vec![0; self.chunk_size];
        loop {
            match self.backend.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    chunk.truncate(n);
                    return Ok(Some(chunk));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<B: Write> ChunkWrite for ChunkAdapter<B> {
    type Error = std::io::Error;

    #[inline]
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        self.backend.write_all(chunk)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.backend.flush()
    }
}

#[cfg(test)]
mod test {
    use crate::prelude::*;

    #[test]
    fn test_chunk_adapter_file() {
        let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
        let path = std::env::temp_dir().join("test_chunk_adapter_file");
        {
            let mut writer = ChunkAdapter::new(std::fs::File::create(&path).unwrap());
            for chunk in data.chunks(300) {
                writer.write_chunk(chunk).unwrap();
            }
            ChunkWrite::flush(&mut writer).unwrap();
        }
        {
            let mut reader = ChunkAdapter::with_chunk_size(std::fs::File::open(&path).unwrap(), 64);
            let mut read = vec![];
            while let Some(chunk) = reader.read_chunk().unwrap() {
                assert!(!chunk.is_empty() && chunk.len() <= 64);
                read.extend(chunk);
            }
            assert_eq!(read, data);
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_chunk_adapter_codec() {
        let path = std::env::temp_dir().join("test_chunk_adapter_codec");
        {
            let sink = ChunkAdapter::new(std::fs::File::create(&path).unwrap());
            let mut writer = DataWriter::with_options(sink, WriterOptions::default().with_buffer_size(7));
            for value in 0..100_u32 {
                writer.write_u32_with(value * 7919, BE).unwrap();
                writer.write_bit(value % 3 == 0).unwrap();
            }
            writer.write_line("done", EolConvention::Lf, None).unwrap();
            writer.flush().unwrap();
        }
        {
            let source = ChunkAdapter::with_chunk_size(std::fs::File::open(&path).unwrap(), 5);
            let mut reader = DataReader::new(source);
            for value in 0..100_u32 {
                assert_eq!(reader.read_u32_with(BE).unwrap(), Some(value * 7919));
                assert_eq!(reader.read_bit().unwrap(), Some(value % 3 == 0));
            }
            assert_eq!(reader.read_line(&LineOptions::default()).unwrap().as_deref(), Some("done"));
            assert_eq!(reader.read_u8().unwrap(), None);
        }
        std::fs::remove_file(&path).unwrap();
    }
}
