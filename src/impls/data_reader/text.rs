/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{DataReader, ReadResult, chunk_of};
use crate::encoding::{EncodingError, TextEncoding};
use crate::impls::{EolConvention, LineOptions, NullTerminatedOptions};
use crate::traits::*;

const LF_UNIT: u16 = 0x0a;
const CR_UNIT: u16 = 0x0d;

/// A terminator found by a string scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Terminator {
    /// Length in bytes of the terminator, which is at the end of the
    /// accumulated data.
    len: usize,
    /// Whether this is an end of line, rather than a zero code unit.
    eol: bool,
}

/// How a string scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanEnd {
    Terminator(Terminator),
    Limit,
    EndOfStream,
}

/// Return the matcher of line terminators for `options`.
///
/// The matcher is fed every code unit in order, and returns the terminator
/// ending with that unit, if any.
fn line_matcher(options: &LineOptions, width: usize) -> impl FnMut(u16) -> Option<Terminator> {
    let eol = options.eol;
    let null_terminated = options.null_terminated;
    let mut after_cr = false;
    move |unit| {
        let crlf = core::mem::replace(&mut after_cr, unit == CR_UNIT) && unit == LF_UNIT;
        if null_terminated && unit == 0 {
            return Some(Terminator {
                len: width,
                eol: false,
            });
        }
        let units = match (eol, unit) {
            (EolConvention::CrLf | EolConvention::CrLfOrLf, LF_UNIT) if crlf => 2,
            (EolConvention::Lf | EolConvention::CrOrLf | EolConvention::CrLfOrLf, LF_UNIT) => 1,
            (EolConvention::Cr | EolConvention::CrOrLf, CR_UNIT) => 1,
            _ => return None,
        };
        Some(Terminator {
            len: units * width,
            eol: true,
        })
    }
}

impl<CR: ChunkRead> DataReader<CR> {
    /// Read up to `max_bytes` bytes and decode them as text.
    ///
    /// Fewer bytes are decoded if the stream ends first; `None` is returned
    /// only if no byte at all could be read. A code point truncated by the
    /// limit decodes as U+FFFD. The reader encoding is used if `encoding` is
    /// `None`.
    pub fn read_string(
        &mut self,
        max_bytes: usize,
        encoding: Option<&str>,
    ) -> ReadResult<Option<String>, CR> {
        let encoding = self.encoding(encoding)?;
        self.scratch.reset();
        if self.read_into_scratch(max_bytes)? == 0 && max_bytes > 0 {
            return Ok(None);
        }
        Ok(Some(self.decode_scratch(&*encoding)))
    }

    /// Read a string terminated by a zero code unit: a zero byte for 8-bit
    /// encodings, or two zero bytes on a code-unit boundary for UTF-16.
    ///
    /// The terminator is consumed but not returned. The scan also stops after
    /// [`max_bytes`](NullTerminatedOptions::max_bytes) bytes, or at the end of
    /// the stream; in the latter case `None` is returned if no byte was read,
    /// so that an empty string can be told apart from a missing one.
    pub fn read_null_terminated_string(
        &mut self,
        options: &NullTerminatedOptions,
    ) -> ReadResult<Option<String>, CR> {
        let encoding = self.encoding(options.encoding.as_deref())?;
        let width = encoding.unit_width();
        let end = self.scan(&*encoding, options.max_bytes, |unit| {
            (unit == 0).then_some(Terminator {
                len: width,
                eol: false,
            })
        })?;
        match end {
            ScanEnd::EndOfStream if self.scratch.text.is_empty() => Ok(None),
            ScanEnd::Terminator(terminator) => {
                self.scratch.text.rewind(terminator.len);
                Ok(Some(self.decode_scratch(&*encoding)))
            }
            _ => Ok(Some(self.decode_scratch(&*encoding))),
        }
    }

    /// Read a line.
    ///
    /// The line ends with the terminator selected by
    /// [`eol`](LineOptions::eol), by default `\r\n` or `\n`, which is returned
    /// only if [`include_eol`](LineOptions::include_eol) is set. With
    /// [`null_terminated`](LineOptions::null_terminated) the line also ends at
    /// a zero code unit, which is never returned. The scan also stops after
    /// [`max_bytes`](LineOptions::max_bytes) bytes, or at the end of the
    /// stream; in the latter case `None` is returned if no byte was read.
    ///
    /// # Example
    /// ```
    /// use chunked_datastream::prelude::*;
    ///
    /// let source = MemChunkSource::with_chunk_size("one\r\ntwo\nthree", 4);
    /// let mut reader = DataReader::new(source);
    /// let options = LineOptions::default();
    /// assert_eq!(reader.read_line(&options).unwrap().as_deref(), Some("one"));
    /// assert_eq!(
    ///     reader.read_line(&options.clone().with_include_eol(true)).unwrap().as_deref(),
    ///     Some("two\n")
    /// );
    /// assert_eq!(reader.read_line(&options).unwrap().as_deref(), Some("three"));
    /// assert_eq!(reader.read_line(&options).unwrap(), None);
    /// ```
    pub fn read_line(&mut self, options: &LineOptions) -> ReadResult<Option<String>, CR> {
        let encoding = self.encoding(options.encoding.as_deref())?;
        let matcher = line_matcher(options, encoding.unit_width());
        let end = self.scan(&*encoding, options.max_bytes, matcher)?;
        match end {
            ScanEnd::EndOfStream if self.scratch.text.is_empty() => Ok(None),
            ScanEnd::Terminator(terminator) => {
                if !terminator.eol || !options.include_eol {
                    self.scratch.text.rewind(terminator.len);
                }
                Ok(Some(self.decode_scratch(&*encoding)))
            }
            _ => Ok(Some(self.decode_scratch(&*encoding))),
        }
    }

    fn decode_scratch(&self, encoding: &dyn TextEncoding) -> String {
        let mut text = String::with_capacity(self.scratch.text.len());
        encoding.decode(self.scratch.text.data(), &mut text);
        text
    }

    /// Accumulate code units in the scratch buffer until `matcher` reports a
    /// terminator, the next code unit would not fit in `max_bytes` bytes, or
    /// the stream ends.
    ///
    /// The limit is thus rounded down to a whole number of code units, and a
    /// code unit is never split by it. For 8-bit encodings at byte alignment,
    /// runs of bytes that cannot be part of a terminator (anything but NUL, CR
    /// and LF) are searched for and copied directly from the current chunk. A
    /// UTF-16 stream ending in the middle of a code unit ends the scan; the
    /// dangling byte is kept.
    fn scan(
        &mut self,
        encoding: &dyn TextEncoding,
        max_bytes: Option<usize>,
        mut matcher: impl FnMut(u16) -> Option<Terminator>,
    ) -> ReadResult<ScanEnd, CR> {
        let width = encoding.unit_width();
        if !(1..=2).contains(&width) {
            return Err(EncodingError::UnsupportedUnitWidth {
                encoding: encoding.name(),
                width,
            }
            .into());
        }
        let max_bytes = max_bytes.unwrap_or(usize::MAX);
        self.scratch.reset();

        loop {
            if max_bytes - self.scratch.text.len() < width {
                return Ok(ScanEnd::Limit);
            }
            if !self.ensure_byte_available()? {
                return Ok(ScanEnd::EndOfStream);
            }

            if width == 1 && self.bit_offset == 0 {
                let limit = self.available_bytes().min(max_bytes - self.scratch.text.len());
                let start = self.byte_offset;
                let run = self.chunk()[start..start + limit]
                    .iter()
                    .position(|&byte| matches!(byte, 0 | b'\n' | b'\r'))
                    .unwrap_or(limit);
                if run > 0 {
                    let chunk = chunk_of(&self.arena, self.current);
                    let last = chunk[start + run - 1];
                    self.scratch.text.write_bytes(&chunk[start..start + run]);
                    self.consume_bytes(run);
                    // keep the state of the matcher in sync
                    let _ = matcher(last as u16);
                    continue;
                }
            }

            let mut unit = [0_u8; 2];
            for i in 0..width {
                match self.read_u8()? {
                    Some(byte) => {
                        unit[i] = byte;
                        self.scratch.text.write_u8(byte);
                    }
                    None => return Ok(ScanEnd::EndOfStream),
                }
            }
            if let Some(terminator) = matcher(encoding.unit_value(&unit[..width])) {
                return Ok(ScanEnd::Terminator(terminator));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::prelude::*;

    fn lines(data: &[u8], chunk_size: usize, options: &LineOptions) -> Vec<Option<String>> {
        let mut reader = DataReader::new(MemChunkSource::with_chunk_size(data.to_vec(), chunk_size));
        let mut lines = vec![];
        loop {
            let line = reader.read_line(options).unwrap();
            let done = line.is_none();
            lines.push(line);
            if done {
                return lines;
            }
        }
    }

    fn some(lines: &[&str]) -> Vec<Option<String>> {
        lines
            .iter()
            .map(|line| Some(line.to_string()))
            .chain([None])
            .collect()
    }

    #[test]
    fn test_read_line_default() {
        for chunk_size in [1, 2, 3, 100] {
            assert_eq!(
                lines(b"Line 1\nLine 2\n\nEmpty line", chunk_size, &LineOptions::default()),
                some(&["Line 1", "Line 2", "", "Empty line"])
            );
            assert_eq!(
                lines(b"a\r\nb\rc\n", chunk_size, &LineOptions::default()),
                some(&["a", "b\rc"])
            );
        }
    }

    #[test]
    fn test_read_line_conventions() {
        let data = b"a\rb\nc\r\nd";
        let with = |eol| LineOptions::default().with_eol(eol);
        assert_eq!(lines(data, 2, &with(EolConvention::Lf)), some(&["a\rb", "c\r", "d"]));
        assert_eq!(lines(data, 2, &with(EolConvention::Cr)), some(&["a", "b\nc", "\nd"]));
        assert_eq!(lines(data, 2, &with(EolConvention::CrLf)), some(&["a\rb\nc", "d"]));
        assert_eq!(
            lines(data, 2, &with(EolConvention::CrOrLf)),
            some(&["a", "b", "c", "", "d"])
        );
        assert_eq!(
            lines(data, 2, &with(EolConvention::CrLfOrLf)),
            some(&["a\rb", "c", "d"])
        );
    }

    #[test]
    fn test_read_line_include_eol_and_null() {
        let options = LineOptions::default().with_include_eol(true);
        assert_eq!(lines(b"a\r\nb\n", 3, &options), some(&["a\r\n", "b\n"]));

        let options = LineOptions::default().with_null_terminated(true);
        assert_eq!(lines(b"a\0b\nc", 3, &options), some(&["a", "b", "c"]));
        let options = options.with_include_eol(true);
        assert_eq!(lines(b"a\0b\n", 3, &options), some(&["a", "b\n"]));
    }

    #[test]
    fn test_read_line_max_bytes() {
        let options = LineOptions::default().with_max_bytes(3);
        assert_eq!(
            lines(b"abcdef\ngh\n", 4, &options),
            some(&["abc", "def", "", "gh"])
        );
    }

    #[test]
    fn test_read_line_utf16() {
        let mut data = vec![];
        Utf16::LE.encode("ab\r\n\u{a0a}\nc", &mut data).unwrap();
        let options = LineOptions::default().with_encoding("utf-16le");
        for chunk_size in [1, 3, 64] {
            // U+0A0A contains LF bytes, but not on a code-unit boundary
            assert_eq!(
                lines(&data, chunk_size, &options),
                some(&["ab", "\u{a0a}", "c"])
            );
        }
        let options = options.with_include_eol(true);
        assert_eq!(lines(&data, 5, &options), some(&["ab\r\n", "\u{a0a}\n", "c"]));

        let mut data = vec![];
        Utf16::BE.encode("x\ny", &mut data).unwrap();
        let options = LineOptions::default().with_encoding("UTF-16BE");
        assert_eq!(lines(&data, 3, &options), some(&["x", "y"]));
    }

    #[test]
    fn test_null_terminated() {
        let options = NullTerminatedOptions::default();
        let mut reader = DataReader::new(MemChunkSource::with_chunk_size(b"ab\0\0cd".to_vec(), 2));
        assert_eq!(reader.read_null_terminated_string(&options).unwrap().as_deref(), Some("ab"));
        assert_eq!(reader.read_null_terminated_string(&options).unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_null_terminated_string(&options).unwrap().as_deref(), Some("cd"));
        assert_eq!(reader.read_null_terminated_string(&options).unwrap(), None);
    }

    #[test]
    fn test_null_terminated_max_bytes() {
        let options = NullTerminatedOptions::default().with_max_bytes(2);
        let mut reader = DataReader::new(MemChunkSource::new(b"abc\0".to_vec()));
        assert_eq!(reader.read_null_terminated_string(&options).unwrap().as_deref(), Some("ab"));
        assert_eq!(reader.read_null_terminated_string(&options).unwrap().as_deref(), Some("c"));
        assert_eq!(reader.read_null_terminated_string(&options).unwrap(), None);
    }

    #[test]
    fn test_null_terminated_utf16() {
        // "\u{100}" is 01 00 in big endian: its zero byte is not a terminator
        let mut data = vec![];
        Utf16::BE.encode("\u{100}a", &mut data).unwrap();
        data.extend([0, 0]);
        Utf16::BE.encode("b", &mut data).unwrap();
        let options = NullTerminatedOptions::default().with_encoding("utf-16be");
        for chunk_size in [1, 3] {
            let mut reader =
                DataReader::new(MemChunkSource::with_chunk_size(data.clone(), chunk_size));
            assert_eq!(
                reader.read_null_terminated_string(&options).unwrap().as_deref(),
                Some("\u{100}a")
            );
            assert_eq!(reader.read_null_terminated_string(&options).unwrap().as_deref(), Some("b"));
            assert_eq!(reader.read_null_terminated_string(&options).unwrap(), None);
        }
    }

    #[test]
    fn test_utf16_dangling_byte() {
        let options = NullTerminatedOptions::default().with_encoding("utf-16le");
        let mut reader = DataReader::new(MemChunkSource::new(vec![b'a', 0, b'b']));
        assert_eq!(
            reader.read_null_terminated_string(&options).unwrap().as_deref(),
            Some("a\u{fffd}")
        );
        assert_eq!(reader.read_null_terminated_string(&options).unwrap(), None);

        let options = LineOptions::default().with_encoding("utf-16le");
        let mut reader = DataReader::new(MemChunkSource::new(vec![b'\n', 0, 0]));
        assert_eq!(reader.read_line(&options).unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line(&options).unwrap().as_deref(), Some("\u{fffd}"));
        assert_eq!(reader.read_line(&options).unwrap(), None);
    }

    #[test]
    fn test_utf16_max_bytes_keeps_whole_units() {
        let mut data = vec![];
        Utf16::LE.encode("abcdef\n", &mut data).unwrap();
        let options = LineOptions::default()
            .with_encoding("utf-16le")
            .with_max_bytes(3);
        for chunk_size in [1, 3, 64] {
            let mut reader =
                DataReader::new(MemChunkSource::with_chunk_size(data.clone(), chunk_size));
            assert_eq!(reader.read_line(&options).unwrap().as_deref(), Some("a"));
            assert_eq!(reader.bytes_consumed(), 2);
            assert_eq!(reader.read_line(&options).unwrap().as_deref(), Some("b"));
            assert_eq!(reader.bytes_consumed(), 4);
        }

        // a limit smaller than a code unit reads nothing
        let options = NullTerminatedOptions::default()
            .with_encoding("utf-16le")
            .with_max_bytes(1);
        let mut reader = DataReader::new(MemChunkSource::new(data));
        assert_eq!(reader.read_null_terminated_string(&options).unwrap().as_deref(), Some(""));
        assert_eq!(reader.bytes_consumed(), 0);
    }

    #[test]
    fn test_unaligned_text() {
        let mut writer_bytes = vec![];
        {
            let mut writer = DataWriter::new(MemChunkSink::new(&mut writer_bytes));
            writer.write_bit(true).unwrap();
            writer.write_null_terminated_string("héllo", None).unwrap();
            writer.write_line("wörld", EolConvention::Lf, None).unwrap();
            writer.flush().unwrap();
        }
        let mut reader = DataReader::new(MemChunkSource::with_chunk_size(writer_bytes, 3));
        assert_eq!(reader.read_bit().unwrap(), Some(true));
        assert_eq!(
            reader.read_null_terminated_string(&Default::default()).unwrap().as_deref(),
            Some("héllo")
        );
        assert_eq!(
            reader.read_line(&Default::default()).unwrap().as_deref(),
            Some("wörld")
        );
    }

    #[test]
    fn test_read_string() {
        let mut reader = DataReader::new(MemChunkSource::with_chunk_size("añb".as_bytes().to_vec(), 1));
        assert_eq!(reader.read_string(0, None).unwrap().as_deref(), Some(""));
        // the limit splits ñ
        assert_eq!(reader.read_string(2, None).unwrap().as_deref(), Some("a\u{fffd}"));
        assert_eq!(reader.read_string(10, Some("latin1")).unwrap().as_deref(), Some("\u{b1}b"));
        assert_eq!(reader.read_string(10, None).unwrap(), None);
        assert!(matches!(
            reader.read_string(1, Some("klingon")),
            Err(ReadError::Encoding(EncodingError::Unsupported(_)))
        ));
    }
}
