/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::*;
use log::debug;

/// Wrapping struct that keep tracks of written chunks and bytes. Optionally,
/// logs at debug level information about methods called.
#[derive(Debug, Clone, Default)]
pub struct CountChunkWrite<CW: ChunkWrite, const PRINT: bool = false> {
    chunk_write: CW,
    /// The number of chunks written so far on the underlying [`ChunkWrite`].
    pub chunks_written: usize,
    /// The number of bytes written so far on the underlying [`ChunkWrite`].
    pub bytes_written: usize,
}

impl<CW: ChunkWrite, const PRINT: bool> CountChunkWrite<CW, PRINT> {
    pub fn new(chunk_write: CW) -> Self {
        Self {
            chunk_write,
            chunks_written: 0,
            bytes_written: 0,
        }
    }

    pub fn into_inner(self) -> CW {
        self.chunk_write
    }
}

impl<CW: ChunkWrite, const PRINT: bool> ChunkWrite for CountChunkWrite<CW, PRINT> {
    type Error = CW::Error;

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), Self::Error> {
        self.chunk_write.write_chunk(chunk).map(|()| {
            self.chunks_written += 1;
            self.bytes_written += chunk.len();
            if PRINT {
                debug!(
                    "write_chunk({} bytes) (total = {} chunks, {} bytes)",
                    chunk.len(),
                    self.chunks_written,
                    self.bytes_written
                );
            }
        })
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if PRINT {
            debug!("flush() (total = {} bytes)", self.bytes_written);
        }
        self.chunk_write.flush()
    }
}

/// Wrapping struct that keep tracks of read chunks and bytes. Optionally,
/// logs at debug level information about methods called.
///
/// Only actual chunks are counted: the final `None` of the source is not.
#[derive(Debug, Clone, Default)]
pub struct CountChunkRead<CR: ChunkRead, const PRINT: bool = false> {
    chunk_read: CR,
    /// The number of chunks read so far from the underlying [`ChunkRead`].
    pub chunks_read: usize,
    /// The number of bytes read so far from the underlying [`ChunkRead`].
    pub bytes_read: usize,
}

impl<CR: ChunkRead, const PRINT: bool> CountChunkRead<CR, PRINT> {
    pub fn new(chunk_read: CR) -> Self {
        Self {
            chunk_read,
            chunks_read: 0,
            bytes_read: 0,
        }
    }

    pub fn into_inner(self) -> CR {
        self.chunk_read
    }
}

impl<CR: ChunkRead, const PRINT: bool> ChunkRead for CountChunkRead<CR, PRINT> {
    type Error = CR::Error;

    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        self.chunk_read.read_chunk().map(|chunk| {
            if let Some(chunk) = &chunk {
                self.chunks_read += 1;
                self.bytes_read += chunk.len();
            }
            if PRINT {
                debug!(
                    "read_chunk() = {:?} bytes (total = {} chunks, {} bytes)",
                    chunk.as_ref().map(Vec::len),
                    self.chunks_read,
                    self.bytes_read
                );
            }
            chunk
        })
    }
}

#[cfg(test)]
#[test]
fn test_count() -> anyhow::Result<()> {
    use crate::prelude::*;
    let mut buffer = vec![];
    let sink = CountChunkWrite::<_, true>::new(MemChunkSink::new(&mut buffer));
    let mut writer = DataWriter::with_options(sink, WriterOptions::default().with_buffer_size(4));

    writer.write_u32_with(0xdead_beef, BE)?;
    assert_eq!(writer.sink().chunks_written, 1);
    assert_eq!(writer.sink().bytes_written, 4);
    writer.write_bytes(&[1, 2, 3, 4, 5, 6])?;
    assert_eq!(writer.sink().chunks_written, 2);
    writer.write_bit(true)?;
    writer.flush()?;
    assert_eq!(writer.sink().chunks_written, 3);
    assert_eq!(writer.sink().bytes_written, 11);
    drop(writer);

    let source = CountChunkRead::<_, true>::new(MemChunkSource::with_chunk_size(&buffer, 3));
    let mut reader = DataReader::new(source);
    assert_eq!(reader.read_u32_with(BE)?, Some(0xdead_beef));
    let mut rest = [0; 16];
    assert_eq!(reader.read_bytes(&mut rest)?, 7);
    assert_eq!(reader.read_u8()?, None);
    let source = reader.into_inner();
    assert_eq!(source.chunks_read, 4);
    assert_eq!(source.bytes_read, 11);

    Ok(())
}
