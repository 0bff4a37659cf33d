/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::VecDeque;
use std::sync::Arc;

use log::trace;

use super::arena::{ChunkArena, ChunkId};
use super::{GrowableSink, ReaderOptions};
use crate::encoding::{EncodingError, EncodingRegistry, TextEncoding};
use crate::traits::*;

mod look_ahead;
pub use look_ahead::{Commit, LookAhead};

mod text;

/// An internal shortcut to the result type of the methods of a
/// [`DataReader`] over a [`ChunkRead`].
type ReadResult<T, CR> = Result<T, ReadError<<CR as ChunkRead>::Error>>;

/// Return the bytes of `current`, or an empty slice before the first refill.
///
/// This is a free function so that the chunk can be borrowed together with
/// the scratch buffers of the reader.
#[inline(always)]
fn chunk_of(arena: &ChunkArena, current: Option<ChunkId>) -> &[u8] {
    match current {
        Some(id) => arena.get(id),
        None => &[],
    }
}

/// Reusable buffers of a [`DataReader`], cleared explicitly before each use.
#[derive(Debug, Default)]
struct Scratch {
    /// Accumulates the bytes of strings and lines.
    text: GrowableSink,
    /// Raw bytes of multi-byte array reads.
    raw: Vec<u8>,
}

impl Scratch {
    fn reset(&mut self) {
        self.text.reset();
        self.raw.clear();
    }
}

/// A reader of bits, primitive values, arrays and text from a [`ChunkRead`].
///
/// The reader keeps a cursor made of the current chunk, a byte offset in the
/// chunk and a bit offset in the current byte. Bits are read starting from
/// the least significant bit of each byte. Whenever the current chunk is
/// exhausted a new one is requested from the source; nothing else is ever
/// buffered, except during a [look-ahead](DataReader::look_ahead), when
/// consumed chunks are kept so that the cursor can be moved back.
///
/// All reads complete with whatever data is available: at the end of the
/// stream single values are returned as `None`, and bulk reads return the
/// number of elements actually read.
///
/// # Example
/// ```
/// use chunked_datastream::prelude::*;
///
/// let data = [0x01, 0x02, b'h', b'i', 0, 0b101];
/// let mut reader = DataReader::new(MemChunkSource::with_chunk_size(data, 3));
/// assert_eq!(reader.read_u16_with(BE).unwrap(), Some(0x0102));
/// assert_eq!(
///     reader.read_null_terminated_string(&Default::default()).unwrap().as_deref(),
///     Some("hi")
/// );
/// assert_eq!(reader.read_bit().unwrap(), Some(true));
/// assert_eq!(reader.read_bit().unwrap(), Some(false));
/// assert_eq!(reader.skip_bits(100).unwrap(), 6);
/// assert_eq!(reader.read_bit().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct DataReader<CR: ChunkRead> {
    /// The [`ChunkRead`] used to fill the cursor.
    source: CR,
    /// Storage of the current chunk and of the chunks kept for look-aheads.
    arena: ChunkArena,
    /// The chunk the cursor is in, if any chunk has been read yet.
    current: Option<ChunkId>,
    /// Offset of the current byte in the current chunk.
    byte_offset: usize,
    /// Number of bits already read from the current byte; always smaller
    /// than 8, and zero if `byte_offset` is the length of the chunk.
    bit_offset: u32,
    /// Number of bits read since creation.
    bits_consumed: u64,
    /// Whether the source returned `None`.
    source_done: bool,
    /// Whether a look-ahead is in progress.
    recording: bool,
    /// Chunks left behind by the cursor during a look-ahead, oldest first.
    history: Vec<ChunkId>,
    /// Chunks to move through before asking the source again.
    pending: VecDeque<ChunkId>,
    options: ReaderOptions,
    registry: Arc<EncodingRegistry>,
    scratch: Scratch,
}

impl<CR: ChunkRead> DataReader<CR> {
    /// Create a new [`DataReader`] with default options around a [`ChunkRead`].
    #[must_use]
    pub fn new(source: CR) -> Self {
        Self::with_options(source, ReaderOptions::default())
    }

    /// Create a new [`DataReader`] with the given options.
    #[must_use]
    pub fn with_options(source: CR, options: ReaderOptions) -> Self {
        Self {
            source,
            arena: ChunkArena::default(),
            current: None,
            byte_offset: 0,
            bit_offset: 0,
            bits_consumed: 0,
            source_done: false,
            recording: false,
            history: Vec::new(),
            pending: VecDeque::new(),
            options,
            registry: EncodingRegistry::shared(),
            scratch: Scratch::default(),
        }
    }

    /// Replace the registry used to look up encodings by name.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<EncodingRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Return the default byte order and encoding of this reader.
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Return the number of whole bytes read (or skipped) so far.
    #[inline]
    pub fn bytes_consumed(&self) -> u64 {
        self.bits_consumed / 8
    }

    /// Return the number of bits read (or skipped) so far.
    #[inline]
    pub fn bits_consumed(&self) -> u64 {
        self.bits_consumed
    }

    /// Return true if the cursor is at a byte boundary.
    #[inline]
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_offset == 0
    }

    /// Return the source, dropping any buffered data.
    pub fn into_inner(self) -> CR {
        self.source
    }

    #[inline(always)]
    fn chunk(&self) -> &[u8] {
        chunk_of(&self.arena, self.current)
    }

    #[inline(always)]
    fn current_byte(&self) -> u8 {
        self.chunk()[self.byte_offset]
    }

    #[inline(always)]
    fn available_bytes(&self) -> usize {
        self.chunk().len() - self.byte_offset
    }

    /// Advance by `n_bits` bits inside the current byte, moving to the next
    /// byte when the current one is finished.
    #[inline(always)]
    fn consume_bits(&mut self, n_bits: u32) {
        debug_assert!(self.bit_offset + n_bits <= 8);
        self.bit_offset += n_bits;
        self.bits_consumed += n_bits as u64;
        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
    }

    /// Advance by `n` whole bytes of the current chunk.
    #[inline(always)]
    fn consume_bytes(&mut self, n: usize) {
        debug_assert_eq!(self.bit_offset, 0);
        debug_assert!(n <= self.available_bytes());
        self.byte_offset += n;
        self.bits_consumed += 8 * n as u64;
    }

    /// Make sure that at least one unread byte is available at the cursor,
    /// moving to the next chunk if the current one is exhausted.
    ///
    /// Chunks queued by a finished look-ahead are used before asking the
    /// source for new ones. Returns false only at the end of the stream.
    pub fn ensure_byte_available(&mut self) -> ReadResult<bool, CR> {
        loop {
            if self.byte_offset < self.chunk().len() {
                return Ok(true);
            }
            debug_assert_eq!(self.bit_offset, 0);

            let next = match self.pending.pop_front() {
                Some(id) => {
                    trace!("refill: replaying {} buffered bytes", self.arena.get(id).len());
                    id
                }
                None => {
                    if self.source_done {
                        return Ok(false);
                    }
                    match self.source.read_chunk().map_err(ReadError::Source)? {
                        Some(chunk) => {
                            trace!("refill: {} bytes from source", chunk.len());
                            self.arena.insert(chunk)
                        }
                        None => {
                            trace!("refill: source exhausted after {} bytes", self.bytes_consumed());
                            self.source_done = true;
                            return Ok(false);
                        }
                    }
                }
            };

            self.retire_current();
            self.current = Some(next);
            self.byte_offset = 0;
        }
    }

    /// Drop the current chunk, or keep it in the history if a look-ahead
    /// might need to move back into it.
    fn retire_current(&mut self) {
        if let Some(old) = self.current.take() {
            if self.recording {
                self.history.push(old);
            } else {
                self.arena.release(old);
            }
        }
    }

    /// Read a bit, or return `None` at the end of the stream.
    #[inline]
    pub fn read_bit(&mut self) -> ReadResult<Option<bool>, CR> {
        if !self.ensure_byte_available()? {
            return Ok(None);
        }
        let bit = (self.current_byte() >> self.bit_offset) & 1;
        self.consume_bits(1);
        Ok(Some(bit != 0))
    }

    /// Read a byte, or return `None` at the end of the stream.
    ///
    /// If the cursor is not byte aligned, the byte is formed by the
    /// remaining bits of the current byte followed by the first bits of the
    /// next one, which might be in the next chunk.
    #[inline]
    pub fn read_u8(&mut self) -> ReadResult<Option<u8>, CR> {
        if !self.ensure_byte_available()? {
            return Ok(None);
        }
        let byte = self.current_byte();
        if self.bit_offset == 0 {
            self.consume_bytes(1);
            return Ok(Some(byte));
        }

        let shift = self.bit_offset;
        let low = byte >> shift;
        self.consume_bits(8 - shift);
        // the rest of the value might need a refill
        if !self.ensure_byte_available()? {
            return Ok(None);
        }
        let high = self.current_byte() << (8 - shift);
        self.consume_bits(shift);
        Ok(Some(low | high))
    }

    /// Read a signed byte, or return `None` at the end of the stream.
    #[inline]
    pub fn read_i8(&mut self) -> ReadResult<Option<i8>, CR> {
        Ok(self.read_u8()?.map(|byte| byte as i8))
    }

    #[inline(always)]
    fn read_u8_with(&mut self, _endianness: Endianness) -> ReadResult<Option<u8>, CR> {
        self.read_u8()
    }
}

macro_rules! impl_read_wide {
    ($read:ident, $read_with:ident, $ty:ty, $half_with:ident, $half:ty, $sread:ident, $sread_with:ident, $sty:ty) => {
        impl<CR: ChunkRead> DataReader<CR> {
            #[doc = concat!("Read a `", stringify!($ty), "` in the default byte order, or return `None` at the end of the stream.")]
            #[inline]
            pub fn $read(&mut self) -> ReadResult<Option<$ty>, CR> {
                self.$read_with(self.options.endianness)
            }

            #[doc = concat!("Read a `", stringify!($ty), "` in the given byte order, or return `None` at the end of the stream.")]
            ///
            /// The value is composed of two reads of half the width, so it
            /// may straddle chunks and need not be byte aligned.
            pub fn $read_with(&mut self, endianness: Endianness) -> ReadResult<Option<$ty>, CR> {
                let Some(first) = self.$half_with(endianness)? else {
                    return Ok(None);
                };
                let Some(second) = self.$half_with(endianness)? else {
                    return Ok(None);
                };
                let (low, high) = match endianness {
                    Endianness::Little => (first, second),
                    Endianness::Big => (second, first),
                };
                Ok(Some(low as $ty | (high as $ty) << <$half>::BITS))
            }

            #[doc = concat!("Read an `", stringify!($sty), "` in the default byte order, or return `None` at the end of the stream.")]
            #[inline]
            pub fn $sread(&mut self) -> ReadResult<Option<$sty>, CR> {
                Ok(self.$read()?.map(|value| value as $sty))
            }

            #[doc = concat!("Read an `", stringify!($sty), "` in the given byte order, or return `None` at the end of the stream.")]
            #[inline]
            pub fn $sread_with(&mut self, endianness: Endianness) -> ReadResult<Option<$sty>, CR> {
                Ok(self.$read_with(endianness)?.map(|value| value as $sty))
            }
        }
    };
}

impl_read_wide!(read_u16, read_u16_with, u16, read_u8_with, u8, read_i16, read_i16_with, i16);
impl_read_wide!(read_u32, read_u32_with, u32, read_u16_with, u16, read_i32, read_i32_with, i32);
impl_read_wide!(read_u64, read_u64_with, u64, read_u32_with, u32, read_i64, read_i64_with, i64);

impl<CR: ChunkRead> DataReader<CR> {
    /// Read bits into `bits` until it is full or the stream ends; return the
    /// number of bits read.
    pub fn read_bits(&mut self, bits: &mut [bool]) -> ReadResult<usize, CR> {
        for (read, slot) in bits.iter_mut().enumerate() {
            match self.read_bit()? {
                Some(bit) => *slot = bit,
                None => return Ok(read),
            }
        }
        Ok(bits.len())
    }

    /// Read bytes into `buf` until it is full or the stream ends; return the
    /// number of bytes read.
    ///
    /// If the cursor is byte aligned, whole ranges are copied from each chunk.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> ReadResult<usize, CR> {
        if self.bit_offset != 0 {
            for (read, slot) in buf.iter_mut().enumerate() {
                match self.read_u8()? {
                    Some(byte) => *slot = byte,
                    None => return Ok(read),
                }
            }
            return Ok(buf.len());
        }

        let mut filled = 0;
        while filled < buf.len() && self.ensure_byte_available()? {
            let available = &self.chunk()[self.byte_offset..];
            let n = available.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&available[..n]);
            self.consume_bytes(n);
            filled += n;
        }
        Ok(filled)
    }

    /// Append up to `max_bytes` bytes to the text scratch buffer; return the
    /// number of bytes appended.
    fn read_into_scratch(&mut self, max_bytes: usize) -> ReadResult<usize, CR> {
        let mut read = 0;
        while read < max_bytes && self.ensure_byte_available()? {
            if self.bit_offset != 0 {
                match self.read_u8()? {
                    Some(byte) => self.scratch.text.write_u8(byte),
                    None => break,
                }
                read += 1;
                continue;
            }
            let n = self.available_bytes().min(max_bytes - read);
            let chunk = chunk_of(&self.arena, self.current);
            self.scratch
                .text
                .write_bytes(&chunk[self.byte_offset..self.byte_offset + n]);
            self.consume_bytes(n);
            read += n;
        }
        Ok(read)
    }

    /// Read elements into `buf` until it is full or the stream ends, using
    /// the given byte order; return the number of elements read.
    ///
    /// The bytes are read in bulk and then swapped, if necessary, in a
    /// second pass. If the stream ends in the middle of an element, the
    /// bytes of the partial element are consumed but not returned.
    pub fn read_array_with<T: Element>(
        &mut self,
        buf: &mut [T],
        endianness: Endianness,
    ) -> ReadResult<usize, CR> {
        let mut raw = core::mem::take(&mut self.scratch.raw);
        raw.clear();
        raw.resize(buf.len() * T::BYTES, 0);
        let read = self.read_bytes(&mut raw);
        let elements = match read {
            Ok(bytes) => bytes / T::BYTES,
            Err(e) => {
                self.scratch.raw = raw;
                return Err(e);
            }
        };
        for (slot, bytes) in buf.iter_mut().zip(raw.chunks_exact(T::BYTES)).take(elements) {
            *slot = T::from_ne_slice(bytes);
        }
        swap_elements(&mut buf[..elements], endianness);
        self.scratch.raw = raw;
        Ok(elements)
    }

    /// Read elements into `buf` in the default byte order; return the number
    /// of elements read.
    #[inline]
    pub fn read_array<T: Element>(&mut self, buf: &mut [T]) -> ReadResult<usize, CR> {
        self.read_array_with(buf, self.options.endianness)
    }

    /// Read signed bytes into `buf`; return the number of bytes read.
    #[inline]
    pub fn read_i8_array(&mut self, buf: &mut [i8]) -> ReadResult<usize, CR> {
        self.read_array_with(buf, Endianness::native())
    }
}

macro_rules! impl_read_array {
    ($($read:ident, $read_with:ident, $ty:ty);*) => {
        impl<CR: ChunkRead> DataReader<CR> {$(
            #[doc = concat!("Read `", stringify!($ty), "`s into `buf` in the default byte order; return the number of elements read.")]
            #[inline]
            pub fn $read(&mut self, buf: &mut [$ty]) -> ReadResult<usize, CR> {
                self.read_array_with(buf, self.options.endianness)
            }

            #[doc = concat!("Read `", stringify!($ty), "`s into `buf` in the given byte order; return the number of elements read.")]
            #[inline]
            pub fn $read_with(&mut self, buf: &mut [$ty], endianness: Endianness) -> ReadResult<usize, CR> {
                self.read_array_with(buf, endianness)
            }
        )*}
    };
}

impl_read_array!(
    read_u16_array, read_u16_array_with, u16;
    read_i16_array, read_i16_array_with, i16;
    read_u32_array, read_u32_array_with, u32;
    read_i32_array, read_i32_array_with, i32;
    read_u64_array, read_u64_array_with, u64;
    read_i64_array, read_i64_array_with, i64
);

impl<CR: ChunkRead> DataReader<CR> {
    /// Skip `n_bits` bits; return the number of bits skipped, which is
    /// smaller than `n_bits` only at the end of the stream.
    ///
    /// Whole bytes are skipped a chunk range at a time, without reading them.
    pub fn skip_bits(&mut self, n_bits: u64) -> ReadResult<u64, CR> {
        let mut remaining = n_bits;

        // reach byte alignment
        if self.bit_offset != 0 && remaining > 0 {
            let n = (8 - self.bit_offset as u64).min(remaining) as u32;
            self.consume_bits(n);
            remaining -= n as u64;
        }

        while remaining >= 8 {
            if !self.ensure_byte_available()? {
                return Ok(n_bits - remaining);
            }
            let n = (self.available_bytes() as u64).min(remaining / 8);
            self.consume_bytes(n as usize);
            remaining -= 8 * n;
        }

        if remaining > 0 {
            if !self.ensure_byte_available()? {
                return Ok(n_bits - remaining);
            }
            self.consume_bits(remaining as u32);
        }
        Ok(n_bits)
    }

    /// Skip `n_bytes` bytes; return the number of whole bytes skipped.
    #[inline]
    pub fn skip_bytes(&mut self, n_bytes: u64) -> ReadResult<u64, CR> {
        Ok(self.skip_bits(n_bytes.saturating_mul(8))? / 8)
    }

    /// Look up an encoding, falling back to the default of the reader.
    fn encoding(&self, name: Option<&str>) -> Result<Arc<dyn TextEncoding>, EncodingError> {
        self.registry
            .get(name.unwrap_or(self.options.encoding.as_str()))
    }
}
