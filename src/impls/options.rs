/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::Endianness;

/// The encoding used when none is given.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Configuration of a [`DataReader`](crate::impls::DataReader).
///
/// Defaults: native byte order, UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderOptions {
    /// Byte order of multi-byte reads that do not specify one.
    pub endianness: Endianness,
    /// Name of the encoding of text reads that do not specify one.
    pub encoding: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            endianness: Endianness::native(),
            encoding: DEFAULT_ENCODING.to_owned(),
        }
    }
}

impl ReaderOptions {
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }
}

/// Configuration of a [`DataWriter`](crate::impls::DataWriter).
///
/// Defaults: native byte order, UTF-8, a 64 KiB output buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriterOptions {
    /// Byte order of multi-byte writes that do not specify one.
    pub endianness: Endianness,
    /// Name of the encoding of text writes that do not specify one.
    pub encoding: String,
    /// Size in bytes of the output buffer; the buffer is sent to the sink
    /// whenever it fills up. Zero is treated as one.
    pub buffer_size: usize,
}

impl WriterOptions {
    pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            endianness: Endianness::native(),
            encoding: DEFAULT_ENCODING.to_owned(),
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
        }
    }
}

/// End-of-line conventions recognized by
/// [`DataReader::read_line`](crate::impls::DataReader::read_line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EolConvention {
    /// `\n` only.
    Lf,
    /// `\r` only.
    Cr,
    /// `\r\n` only; a bare `\n` or `\r` is part of the line.
    CrLf,
    /// Either `\r` or `\n`, each terminating a line on its own.
    CrOrLf,
    /// `\r\n` or a bare `\n`.
    #[default]
    CrLfOrLf,
}

impl EolConvention {
    /// The terminator written by
    /// [`DataWriter::write_line`](crate::impls::DataWriter::write_line).
    pub fn terminator(self) -> &'static str {
        match self {
            EolConvention::Lf | EolConvention::CrOrLf => "\n",
            EolConvention::Cr => "\r",
            EolConvention::CrLf | EolConvention::CrLfOrLf => "\r\n",
        }
    }
}

/// Options of [`DataReader::read_null_terminated_string`](crate::impls::DataReader::read_null_terminated_string).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullTerminatedOptions {
    /// Stop after accumulating this many bytes, even if no terminator was
    /// found. A terminator beyond the limit is not consumed.
    pub max_bytes: Option<usize>,
    /// Override of the reader encoding.
    pub encoding: Option<String>,
}

impl NullTerminatedOptions {
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// Options of [`DataReader::read_line`](crate::impls::DataReader::read_line).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineOptions {
    /// Which code-unit sequences terminate a line.
    pub eol: EolConvention,
    /// Keep the terminator at the end of the returned line.
    pub include_eol: bool,
    /// Also stop at a zero code unit, which is never returned.
    pub null_terminated: bool,
    /// Stop after accumulating this many bytes, even if no terminator was
    /// found. A terminator beyond the limit is not consumed.
    pub max_bytes: Option<usize>,
    /// Override of the reader encoding.
    pub encoding: Option<String>,
}

impl LineOptions {
    pub fn with_eol(mut self, eol: EolConvention) -> Self {
        self.eol = eol;
        self
    }

    pub fn with_include_eol(mut self, include_eol: bool) -> Self {
        self.include_eol = include_eol;
        self
    }

    pub fn with_null_terminated(mut self, null_terminated: bool) -> Self {
        self.null_terminated = null_terminated;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

#[cfg(all(test, feature = "serde"))]
mod test {
    use super::*;

    #[test]
    fn test_options_serde() {
        let options = WriterOptions::default()
            .with_endianness(Endianness::Big)
            .with_encoding("utf-16le")
            .with_buffer_size(2);
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(
            json,
            r#"{"endianness":"big","encoding":"utf-16le","buffer_size":2}"#
        );
        assert_eq!(serde_json::from_str::<WriterOptions>(&json).unwrap(), options);

        let options: ReaderOptions = serde_json::from_str(r#"{"encoding":"latin1"}"#).unwrap();
        assert_eq!(options.endianness, Endianness::native());
        assert_eq!(options.encoding, "latin1");

        assert_eq!(
            serde_json::to_string(&EolConvention::CrLfOrLf).unwrap(),
            r#""cr-lf-or-lf""#
        );
    }
}
