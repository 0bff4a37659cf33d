/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use log::debug;

use super::{DataReader, ReadResult};
use crate::impls::arena::ChunkId;
use crate::traits::*;

/// How much of the data read by a [look-ahead](DataReader::look_ahead) must
/// be kept as consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Commit {
    /// Move the cursor back to where the look-ahead started.
    #[default]
    Nothing,
    /// Leave the cursor where the look-ahead operation left it.
    All,
    /// Move the cursor this many bits past where the look-ahead started.
    Bits(u64),
}

/// The value returned by a [look-ahead](DataReader::look_ahead) operation,
/// together with its commit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookAhead<T> {
    pub value: T,
    pub commit: Commit,
}

impl<T> LookAhead<T> {
    /// Return `value` and move the cursor back.
    pub fn rollback(value: T) -> Self {
        Self {
            value,
            commit: Commit::Nothing,
        }
    }

    /// Return `value` and keep everything that was read.
    pub fn commit(value: T) -> Self {
        Self {
            value,
            commit: Commit::All,
        }
    }

    /// Return `value` and keep the first `n_bits` bits that were read.
    pub fn commit_bits(value: T, n_bits: u64) -> Self {
        Self {
            value,
            commit: Commit::Bits(n_bits),
        }
    }

    /// Return `value` and keep the first `n_bytes` bytes that were read.
    pub fn commit_bytes(value: T, n_bytes: u64) -> Self {
        Self::commit_units(value, n_bytes, 8)
    }

    /// Return `value` and keep the first `count` units of `bits_per_unit`
    /// bits that were read.
    pub fn commit_units(value: T, count: u64, bits_per_unit: u64) -> Self {
        Self::commit_bits(value, count.saturating_mul(bits_per_unit))
    }
}

/// The cursor at the start of a look-ahead.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    chunk: Option<ChunkId>,
    history_len: usize,
    byte_offset: usize,
    bit_offset: u32,
    bits_consumed: u64,
    recording: bool,
}

impl<CR: ChunkRead> DataReader<CR> {
    /// Run `op` speculatively, then move the cursor back to where it was and
    /// forward again by the amount committed by `op`.
    ///
    /// While `op` runs, the chunks the cursor leaves behind are kept; when it
    /// returns they are queued again, so moving back never asks the source
    /// to repeat itself. Look-aheads can be nested: an inner commit only
    /// decides how far the inner scope moves, and the outer scope is rolled
    /// back to its own starting point unless it commits too.
    ///
    /// The cursor is moved back also if `op` fails. Committing more bits than
    /// `op` read moves the cursor back and returns
    /// [`ReadError::CommitOverrun`].
    ///
    /// # Example
    /// ```
    /// use chunked_datastream::prelude::*;
    ///
    /// let source = MemChunkSource::with_chunk_size(b"GIF89a...".to_vec(), 2);
    /// let mut reader = DataReader::new(source);
    /// // check a magic number, keeping it only if it matches
    /// let is_png = reader
    ///     .look_ahead(|reader| {
    ///         let mut magic = [0; 4];
    ///         let n = reader.read_bytes(&mut magic)?;
    ///         Ok(if n == 4 && &magic == b"\x89PNG" {
    ///             LookAhead::commit(true)
    ///         } else {
    ///             LookAhead::rollback(false)
    ///         })
    ///     })
    ///     .unwrap();
    /// assert!(!is_png);
    /// assert_eq!(reader.bytes_consumed(), 0);
    /// let version = reader
    ///     .look_ahead(|reader| {
    ///         let text = reader.read_string(6, None)?;
    ///         Ok(LookAhead::commit_bytes(text, 6))
    ///     })
    ///     .unwrap();
    /// assert_eq!(version.as_deref(), Some("GIF89a"));
    /// assert_eq!(reader.bytes_consumed(), 6);
    /// ```
    pub fn look_ahead<T, F>(&mut self, op: F) -> ReadResult<T, CR>
    where
        F: FnOnce(&mut Self) -> ReadResult<LookAhead<T>, CR>,
    {
        let snapshot = Snapshot {
            chunk: self.current,
            history_len: self.history.len(),
            byte_offset: self.byte_offset,
            bit_offset: self.bit_offset,
            bits_consumed: self.bits_consumed,
            recording: self.recording,
        };
        debug!(
            "look-ahead: start at bit {} ({} chunks kept)",
            snapshot.bits_consumed, snapshot.history_len
        );
        self.recording = true;

        let result = op(self);
        let read = self.bits_consumed - snapshot.bits_consumed;
        self.restore(snapshot);
        let LookAhead { value, commit } = result?;

        let n_bits = match commit {
            Commit::Nothing => 0,
            Commit::All => read,
            Commit::Bits(n_bits) if n_bits > read => {
                debug!("look-ahead: cannot commit {} of {} bits", n_bits, read);
                return Err(ReadError::CommitOverrun {
                    requested: n_bits,
                    available: read,
                });
            }
            Commit::Bits(n_bits) => n_bits,
        };
        debug!("look-ahead: read {} bits, committing {}", read, n_bits);
        if n_bits > 0 {
            let skipped = self.skip_bits(n_bits)?;
            debug_assert_eq!(skipped, n_bits);
        }
        Ok(value)
    }

    /// Move the cursor back to `snapshot`, queueing the chunks consumed
    /// since then in front of the pending ones.
    fn restore(&mut self, snapshot: Snapshot) {
        let mut replay: Vec<ChunkId> = self.history.drain(snapshot.history_len..).collect();
        replay.extend(self.current.take());
        if snapshot.chunk.is_some() {
            // the chunk of the snapshot becomes current again
            debug_assert_eq!(replay.first().copied(), snapshot.chunk);
            replay.remove(0);
        }
        for &id in replay.iter().rev() {
            self.pending.push_front(id);
        }

        self.current = snapshot.chunk;
        self.byte_offset = snapshot.byte_offset;
        self.bit_offset = snapshot.bit_offset;
        self.bits_consumed = snapshot.bits_consumed;
        self.recording = snapshot.recording;
    }
}

#[cfg(test)]
mod test {
    use crate::prelude::*;

    type Reader = DataReader<CountChunkRead<MemChunkSource<Vec<u8>>>>;

    fn counted_reader(data: &[u8], chunk_size: usize) -> Reader {
        DataReader::new(CountChunkRead::<_, false>::new(MemChunkSource::with_chunk_size(
            data.to_vec(),
            chunk_size,
        )))
    }

    #[test]
    fn test_rollback_is_transparent() {
        let data: Vec<u8> = (0..40).collect();
        for chunk_size in [1, 3, 64] {
            let mut reader = counted_reader(&data, chunk_size);
            assert_eq!(reader.read_bit().unwrap(), Some(false));
            let value = reader
                .look_ahead(|reader| {
                    let value = reader.read_u64_with(BE)?;
                    reader.skip_bytes(10)?;
                    Ok(LookAhead::rollback(value))
                })
                .unwrap();
            assert!(value.is_some());
            assert_eq!(reader.bits_consumed(), 1);

            let mut expected = counted_reader(&data, chunk_size);
            expected.read_bit().unwrap();
            while let Some(bit) = expected.read_bit().unwrap() {
                assert_eq!(reader.read_bit().unwrap(), Some(bit));
            }
            assert_eq!(reader.read_bit().unwrap(), None);
        }
    }

    #[test]
    fn test_source_is_not_read_twice() {
        let data: Vec<u8> = (0..30).collect();
        let mut reader = counted_reader(&data, 4);
        reader
            .look_ahead(|reader| {
                let mut buf = [0; 30];
                assert_eq!(reader.read_bytes(&mut buf)?, 30);
                Ok(LookAhead::rollback(()))
            })
            .unwrap();
        let mut buf = [0; 30];
        assert_eq!(reader.read_bytes(&mut buf).unwrap(), 30);
        assert_eq!(buf.as_slice(), data.as_slice());
        assert_eq!(reader.read_u8().unwrap(), None);
        let source = reader.into_inner();
        assert_eq!(source.chunks_read, 8);
        assert_eq!(source.bytes_read, 30);
    }

    #[test]
    fn test_commit_all() {
        let mut reader = counted_reader(&[0x12, 0x34, 0x56, 0x78], 1);
        let value = reader
            .look_ahead(|reader| {
                reader.read_bit()?;
                Ok(LookAhead::commit(reader.read_u16_with(LE)?))
            })
            .unwrap();
        assert_eq!(value, Some(0x1a09));
        assert_eq!(reader.bits_consumed(), 17);
        assert_eq!(reader.read_bit().unwrap(), Some(true));
    }

    #[test]
    fn test_partial_commit() {
        let mut reader = counted_reader(b"abcdef", 2);
        let line = reader
            .look_ahead(|reader| {
                let text = reader.read_string(5, None)?;
                Ok(LookAhead::commit_bytes(text, 2))
            })
            .unwrap();
        assert_eq!(line.as_deref(), Some("abcde"));
        assert_eq!(reader.bytes_consumed(), 2);
        assert_eq!(reader.read_u8().unwrap(), Some(b'c'));

        let mut reader = counted_reader(&[0xff], 1);
        reader
            .look_ahead(|reader| {
                reader.read_u8()?;
                Ok(LookAhead::commit_units((), 3, 1))
            })
            .unwrap();
        assert_eq!(reader.bits_consumed(), 3);
        assert!(!reader.is_byte_aligned());
    }

    #[test]
    fn test_nested() {
        let data: Vec<u8> = (0..16).collect();
        for chunk_size in [1, 2, 5, 16] {
            let mut reader = counted_reader(&data, chunk_size);
            let (first, inner) = reader
                .look_ahead(|reader| {
                    let first = reader.read_u8()?;
                    let inner = reader.look_ahead(|reader| {
                        let mut buf = [0; 6];
                        reader.read_bytes(&mut buf)?;
                        Ok(LookAhead::commit_bytes(buf, 3))
                    })?;
                    // the inner scope kept 3 bytes
                    assert_eq!(reader.read_u8()?, Some(4));
                    Ok(LookAhead::commit_bytes((first, inner), 4))
                })
                .unwrap();
            assert_eq!(first, Some(0));
            assert_eq!(inner, [1, 2, 3, 4, 5, 6]);
            assert_eq!(reader.bytes_consumed(), 4);
            assert_eq!(reader.read_u8().unwrap(), Some(4));

            // an inner commit is undone by an outer rollback
            reader
                .look_ahead(|reader| {
                    reader.look_ahead(|reader| {
                        reader.skip_bytes(7)?;
                        Ok(LookAhead::commit(()))
                    })?;
                    assert_eq!(reader.bytes_consumed(), 12);
                    Ok(LookAhead::rollback(()))
                })
                .unwrap();
            assert_eq!(reader.bytes_consumed(), 5);
            let mut rest = [0; 16];
            assert_eq!(reader.read_bytes(&mut rest).unwrap(), 11);
            assert_eq!(&rest[..11], &data[5..]);
            assert_eq!(reader.into_inner().bytes_read, 16);
        }
    }

    #[test]
    fn test_commit_overrun() {
        let mut reader = counted_reader(&[1, 2, 3], 1);
        let result = reader.look_ahead(|reader| {
            reader.read_u8()?;
            Ok(LookAhead::commit_bytes((), 2))
        });
        assert!(matches!(
            result,
            Err(ReadError::CommitOverrun {
                requested: 16,
                available: 8
            })
        ));
        assert_eq!(reader.bits_consumed(), 0);
        assert_eq!(reader.read_u8().unwrap(), Some(1));
    }

    #[test]
    fn test_rollback_on_error() {
        let mut reader = counted_reader(b"xyz", 1);
        let result = reader.look_ahead(|reader| {
            reader.read_u16()?;
            let text = reader.read_string(1, Some("no-such-encoding"))?;
            Ok(LookAhead::commit(text))
        });
        assert!(matches!(result, Err(ReadError::Encoding(_))));
        assert_eq!(reader.read_string(3, None).unwrap().as_deref(), Some("xyz"));
    }

    #[test]
    fn test_look_ahead_at_end() {
        let mut reader = counted_reader(&[7], 1);
        assert_eq!(reader.read_u8().unwrap(), Some(7));
        let value = reader
            .look_ahead(|reader| Ok(LookAhead::commit(reader.read_u8()?)))
            .unwrap();
        assert_eq!(value, None);
        assert_eq!(reader.bits_consumed(), 8);
    }
}
