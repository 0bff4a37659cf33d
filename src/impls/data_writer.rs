/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Arc;

use log::trace;

use super::{EolConvention, WriterOptions};
use crate::encoding::{EncodingError, EncodingRegistry, TextEncoding};
use crate::traits::*;

/// An internal shortcut to the result type of the methods of a
/// [`DataWriter`] over a [`ChunkWrite`].
type WriteResult<T, CW> = Result<T, WriteError<<CW as ChunkWrite>::Error>>;

/// A writer of bits, primitive values, arrays and text to a [`ChunkWrite`].
///
/// Data is written into a fixed-size buffer, which is sent to the sink as a
/// chunk whenever it fills up. Bits are written starting from the least
/// significant bit of each byte. [`flush`](DataWriter::flush) sends the
/// bytes written so far, padding the last byte with zeroes, so that what
/// follows starts at a byte boundary.
///
/// The writer flushes itself when dropped, ignoring errors: to observe them,
/// call [`flush`](DataWriter::flush) explicitly before dropping it.
///
/// # Example
/// ```
/// use chunked_datastream::prelude::*;
///
/// let mut bytes = vec![];
/// let mut writer = DataWriter::new(MemChunkSink::new(&mut bytes));
/// writer.write_u16_with(0x0102, BE).unwrap();
/// writer.write_null_terminated_string("hi", None).unwrap();
/// writer.write_bit(true).unwrap();
/// writer.flush().unwrap();
/// drop(writer);
/// assert_eq!(bytes, [0x01, 0x02, b'h', b'i', 0, 1]);
/// ```
#[derive(Debug)]
pub struct DataWriter<CW: ChunkWrite> {
    /// The [`ChunkWrite`] receiving full buffers.
    sink: CW,
    /// The output buffer; its length never changes.
    buffer: Vec<u8>,
    /// Offset of the current byte in the buffer.
    byte_offset: usize,
    /// Number of bits already written in the current byte; always smaller
    /// than 8.
    bit_offset: u32,
    /// Number of bits written since creation, including padding.
    bits_produced: u64,
    options: WriterOptions,
    registry: Arc<EncodingRegistry>,
    /// Reusable buffer for encoded text and arrays.
    encoded: Vec<u8>,
}

impl<CW: ChunkWrite> DataWriter<CW> {
    /// Create a new [`DataWriter`] with default options around a [`ChunkWrite`].
    #[must_use]
    pub fn new(sink: CW) -> Self {
        Self::with_options(sink, WriterOptions::default())
    }

    /// Create a new [`DataWriter`] with the given options.
    #[must_use]
    pub fn with_options(sink: CW, options: WriterOptions) -> Self {
        Self {
            sink,
            buffer: vec![0; options.buffer_size.max(1)],
            byte_offset: 0,
            bit_offset: 0,
            bits_produced: 0,
            options,
            registry: EncodingRegistry::shared(),
            encoded: Vec::new(),
        }
    }

    /// Replace the registry used to look up encodings by name.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<EncodingRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Return the defaults and buffer size of this writer.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Return the underlying sink.
    pub fn sink(&self) -> &CW {
        &self.sink
    }

    /// Return the underlying sink mutably; writing to it directly bypasses
    /// the data still buffered.
    pub fn sink_mut(&mut self) -> &mut CW {
        &mut self.sink
    }

    /// Return the number of whole bytes written so far, including the
    /// padding added by flushes.
    #[inline]
    pub fn bytes_produced(&self) -> u64 {
        self.bits_produced / 8
    }

    /// Return the number of bits written so far, including the padding added
    /// by flushes.
    #[inline]
    pub fn bits_produced(&self) -> u64 {
        self.bits_produced
    }

    /// Return the number of bytes, complete or not, waiting in the buffer.
    #[inline]
    pub fn buffered_bytes(&self) -> usize {
        self.byte_offset + (self.bit_offset != 0) as usize
    }

    /// Send the full buffer to the sink.
    fn send_buffer(&mut self) -> WriteResult<(), CW> {
        debug_assert_eq!(self.bit_offset, 0);
        trace!("flush: {} bytes to sink", self.byte_offset);
        self.sink
            .write_chunk(&self.buffer[..self.byte_offset])
            .map_err(WriteError::Sink)?;
        self.byte_offset = 0;
        Ok(())
    }

    /// Move past a completed byte, sending the buffer if it is full.
    #[inline(always)]
    fn end_byte(&mut self) -> WriteResult<(), CW> {
        self.byte_offset += 1;
        if self.byte_offset == self.buffer.len() {
            self.send_buffer()?;
        }
        Ok(())
    }

    /// Send the bytes written so far to the sink, padding the last byte with
    /// zeroes, and flush the sink.
    ///
    /// The next write starts at a byte boundary. Nothing is sent if the
    /// buffer is empty.
    pub fn flush(&mut self) -> WriteResult<(), CW> {
        if self.bit_offset != 0 {
            // the bits above the offset are already zero
            self.bits_produced += (8 - self.bit_offset) as u64;
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
        if self.byte_offset != 0 {
            self.send_buffer()?;
        }
        self.sink.flush().map_err(WriteError::Sink)
    }

    /// Write a bit.
    ///
    /// The bits of the current byte above the one written are cleared.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) -> WriteResult<(), CW> {
        let byte = &mut self.buffer[self.byte_offset];
        let mask = (1_u8 << self.bit_offset) - 1;
        *byte = (*byte & mask) | ((bit as u8) << self.bit_offset);
        self.bit_offset += 1;
        self.bits_produced += 1;
        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.end_byte()?;
        }
        Ok(())
    }

    /// Write the bits in `bits`.
    pub fn write_bits(&mut self, bits: &[bool]) -> WriteResult<(), CW> {
        for &bit in bits {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Write a byte.
    ///
    /// If the writer is not byte aligned, the byte is written bit by bit,
    /// starting from the least significant one.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> WriteResult<(), CW> {
        if self.bit_offset != 0 {
            for i in 0..8 {
                self.write_bit((value >> i) & 1 != 0)?;
            }
            return Ok(());
        }
        self.buffer[self.byte_offset] = value;
        self.bits_produced += 8;
        self.end_byte()
    }

    /// Write a signed byte.
    #[inline]
    pub fn write_i8(&mut self, value: i8) -> WriteResult<(), CW> {
        self.write_u8(value as u8)
    }

    #[inline(always)]
    fn write_u8_with(&mut self, value: u8, _endianness: Endianness) -> WriteResult<(), CW> {
        self.write_u8(value)
    }

    /// Write `bytes`.
    ///
    /// If the writer is byte aligned, whole ranges are copied into the
    /// buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> WriteResult<(), CW> {
        if self.bit_offset != 0 {
            for &byte in bytes {
                self.write_u8(byte)?;
            }
            return Ok(());
        }

        let mut written = 0;
        while written < bytes.len() {
            let n = (self.buffer.len() - self.byte_offset).min(bytes.len() - written);
            self.buffer[self.byte_offset..self.byte_offset + n]
                .copy_from_slice(&bytes[written..written + n]);
            written += n;
            self.bits_produced += 8 * n as u64;
            self.byte_offset += n;
            if self.byte_offset == self.buffer.len() {
                self.send_buffer()?;
            }
        }
        Ok(())
    }

    /// Write `values` using the given byte order.
    ///
    /// The values are first converted in bulk, swapping bytes only if
    /// `endianness` is not the native byte order.
    pub fn write_array_with<T: Element>(
        &mut self,
        values: &[T],
        endianness: Endianness,
    ) -> WriteResult<(), CW> {
        let mut encoded = core::mem::take(&mut self.encoded);
        encoded.clear();
        encoded.resize(values.len() * T::BYTES, 0);
        for (&value, slot) in values.iter().zip(encoded.chunks_exact_mut(T::BYTES)) {
            value.swap_if_foreign(endianness).write_ne_slice(slot);
        }
        let result = self.write_bytes(&encoded);
        self.encoded = encoded;
        result
    }

    /// Write `values` in the default byte order.
    #[inline]
    pub fn write_array<T: Element>(&mut self, values: &[T]) -> WriteResult<(), CW> {
        self.write_array_with(values, self.options.endianness)
    }

    /// Write signed bytes.
    #[inline]
    pub fn write_i8_array(&mut self, values: &[i8]) -> WriteResult<(), CW> {
        self.write_array_with(values, Endianness::native())
    }

    /// Look up an encoding, falling back to the default of the writer.
    fn encoding(&self, name: Option<&str>) -> Result<Arc<dyn TextEncoding>, EncodingError> {
        self.registry
            .get(name.unwrap_or(self.options.encoding.as_str()))
    }

    /// Fill the scratch buffer using `encode` and write it; return the number
    /// of bytes written.
    fn write_encoded(
        &mut self,
        encoding: Option<&str>,
        encode: impl FnOnce(&dyn TextEncoding, &mut Vec<u8>) -> Result<(), EncodingError>,
    ) -> WriteResult<usize, CW> {
        let encoding = self.encoding(encoding)?;
        let mut encoded = core::mem::take(&mut self.encoded);
        encoded.clear();
        let result = match encode(&*encoding, &mut encoded) {
            Ok(()) => self.write_bytes(&encoded).map(|()| encoded.len()),
            Err(e) => Err(e.into()),
        };
        self.encoded = encoded;
        result
    }

    /// Encode and write `text`; return the number of bytes written.
    ///
    /// The writer encoding is used if `encoding` is `None`. Nothing is
    /// written if the text cannot be encoded.
    pub fn write_string(&mut self, text: &str, encoding: Option<&str>) -> WriteResult<usize, CW> {
        self.write_encoded(encoding, |encoding, out| encoding.encode(text, out))
    }

    /// Encode and write `text` followed by a zero code unit; return the
    /// number of bytes written.
    pub fn write_null_terminated_string(
        &mut self,
        text: &str,
        encoding: Option<&str>,
    ) -> WriteResult<usize, CW> {
        self.write_encoded(encoding, |encoding, out| {
            encoding.encode(text, out)?;
            out.resize(out.len() + encoding.unit_width(), 0);
            Ok(())
        })
    }

    /// Encode and write `text` followed by the
    /// [terminator](EolConvention::terminator) of `eol`; return the number of
    /// bytes written.
    pub fn write_line(
        &mut self,
        text: &str,
        eol: EolConvention,
        encoding: Option<&str>,
    ) -> WriteResult<usize, CW> {
        self.write_encoded(encoding, |encoding, out| {
            encoding.encode(text, out)?;
            encoding.encode(eol.terminator(), out)
        })
    }
}

macro_rules! impl_write_wide {
    ($write:ident, $write_with:ident, $ty:ty, $half_with:ident, $half:ty, $swrite:ident, $swrite_with:ident, $sty:ty) => {
        impl<CW: ChunkWrite> DataWriter<CW> {
            #[doc = concat!("Write a `", stringify!($ty), "` in the default byte order.")]
            #[inline]
            pub fn $write(&mut self, value: $ty) -> WriteResult<(), CW> {
                self.$write_with(value, self.options.endianness)
            }

            #[doc = concat!("Write a `", stringify!($ty), "` in the given byte order, as two writes of half the width.")]
            pub fn $write_with(&mut self, value: $ty, endianness: Endianness) -> WriteResult<(), CW> {
                let low = value as $half;
                let high = (value >> <$half>::BITS) as $half;
                let (first, second) = match endianness {
                    Endianness::Little => (low, high),
                    Endianness::Big => (high, low),
                };
                self.$half_with(first, endianness)?;
                self.$half_with(second, endianness)
            }

            #[doc = concat!("Write an `", stringify!($sty), "` in the default byte order.")]
            #[inline]
            pub fn $swrite(&mut self, value: $sty) -> WriteResult<(), CW> {
                self.$write(value as $ty)
            }

            #[doc = concat!("Write an `", stringify!($sty), "` in the given byte order.")]
            #[inline]
            pub fn $swrite_with(&mut self, value: $sty, endianness: Endianness) -> WriteResult<(), CW> {
                self.$write_with(value as $ty, endianness)
            }
        }
    };
}

impl_write_wide!(write_u16, write_u16_with, u16, write_u8_with, u8, write_i16, write_i16_with, i16);
impl_write_wide!(write_u32, write_u32_with, u32, write_u16_with, u16, write_i32, write_i32_with, i32);
impl_write_wide!(write_u64, write_u64_with, u64, write_u32_with, u32, write_i64, write_i64_with, i64);

macro_rules! impl_write_array {
    ($($write:ident, $write_with:ident, $ty:ty);*) => {
        impl<CW: ChunkWrite> DataWriter<CW> {$(
            #[doc = concat!("Write `", stringify!($ty), "`s in the default byte order.")]
            #[inline]
            pub fn $write(&mut self, values: &[$ty]) -> WriteResult<(), CW> {
                self.write_array_with(values, self.options.endianness)
            }

            #[doc = concat!("Write `", stringify!($ty), "`s in the given byte order.")]
            #[inline]
            pub fn $write_with(&mut self, values: &[$ty], endianness: Endianness) -> WriteResult<(), CW> {
                self.write_array_with(values, endianness)
            }
        )*}
    };
}

impl_write_array!(
    write_u16_array, write_u16_array_with, u16;
    write_i16_array, write_i16_array_with, i16;
    write_u32_array, write_u32_array_with, u32;
    write_i32_array, write_i32_array_with, i32;
    write_u64_array, write_u64_array_with, u64;
    write_i64_array, write_i64_array_with, i64
);

impl<CW: ChunkWrite> core::ops::Drop for DataWriter<CW> {
    fn drop(&mut self) {
        // During a drop we can't save anything if it goes bad :/
        let _ = self.flush();
    }
}
