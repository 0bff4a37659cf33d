/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::char::REPLACEMENT_CHARACTER;

use super::{EncodingError, TextEncoding};
use crate::traits::Endianness;

/// UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl TextEncoding for Utf8 {
    fn name(&self) -> &'static str {
        "utf-8"
    }

    fn unit_width(&self) -> usize {
        1
    }

    fn decode(&self, bytes: &[u8], out: &mut String) {
        out.push_str(&String::from_utf8_lossy(bytes));
    }

    fn encode(&self, text: &str, out: &mut Vec<u8>) -> Result<(), EncodingError> {
        out.extend_from_slice(text.as_bytes());
        Ok(())
    }
}

/// UTF-16 with code units in the given byte order.
#[derive(Debug, Clone, Copy)]
pub struct Utf16 {
    order: Endianness,
}

impl Utf16 {
    pub const LE: Self = Self {
        order: Endianness::Little,
    };
    pub const BE: Self = Self {
        order: Endianness::Big,
    };
}

impl TextEncoding for Utf16 {
    fn name(&self) -> &'static str {
        match self.order {
            Endianness::Little => "utf-16le",
            Endianness::Big => "utf-16be",
        }
    }

    fn unit_width(&self) -> usize {
        2
    }

    fn unit_order(&self) -> Endianness {
        self.order
    }

    fn decode(&self, bytes: &[u8], out: &mut String) {
        let units = bytes.chunks_exact(2);
        let dangling = !units.remainder().is_empty();
        let units = units.map(|unit| self.unit_value(unit));
        out.extend(char::decode_utf16(units).map(|c| c.unwrap_or(REPLACEMENT_CHARACTER)));
        // half a code unit
        if dangling {
            out.push(REPLACEMENT_CHARACTER);
        }
    }

    fn encode(&self, text: &str, out: &mut Vec<u8>) -> Result<(), EncodingError> {
        out.reserve(text.len() * 2);
        for unit in text.encode_utf16() {
            match self.order {
                Endianness::Little => out.extend_from_slice(&unit.to_le_bytes()),
                Endianness::Big => out.extend_from_slice(&unit.to_be_bytes()),
            }
        }
        Ok(())
    }
}

/// ISO-8859-1: every byte is the code point of the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1;

impl TextEncoding for Latin1 {
    fn name(&self) -> &'static str {
        "iso-8859-1"
    }

    fn unit_width(&self) -> usize {
        1
    }

    fn decode(&self, bytes: &[u8], out: &mut String) {
        out.extend(bytes.iter().map(|&byte| byte as char));
    }

    fn encode(&self, text: &str, out: &mut Vec<u8>) -> Result<(), EncodingError> {
        for ch in text.chars() {
            let byte = u8::try_from(ch).map_err(|_| EncodingError::Unrepresentable {
                encoding: self.name(),
                ch,
            })?;
            out.push(byte);
        }
        Ok(())
    }
}

/// US-ASCII. Bytes above 0x7f decode to U+FFFD.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii;

impl TextEncoding for Ascii {
    fn name(&self) -> &'static str {
        "us-ascii"
    }

    fn unit_width(&self) -> usize {
        1
    }

    fn decode(&self, bytes: &[u8], out: &mut String) {
        out.extend(bytes.iter().map(|&byte| {
            if byte.is_ascii() {
                byte as char
            } else {
                REPLACEMENT_CHARACTER
            }
        }));
    }

    fn encode(&self, text: &str, out: &mut Vec<u8>) -> Result<(), EncodingError> {
        for ch in text.chars() {
            if !ch.is_ascii() {
                return Err(EncodingError::Unrepresentable {
                    encoding: self.name(),
                    ch,
                });
            }
            out.push(ch as u8);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decoded(encoding: &dyn TextEncoding, bytes: &[u8]) -> String {
        let mut out = String::new();
        encoding.decode(bytes, &mut out);
        out
    }

    #[test]
    fn test_utf8_truncated_code_point() {
        let bytes = "aé".as_bytes();
        assert_eq!(decoded(&Utf8, bytes), "aé");
        assert_eq!(decoded(&Utf8, &bytes[..2]), "a\u{fffd}");
    }

    #[test]
    fn test_utf16() {
        let mut le = vec![];
        Utf16::LE.encode("h€𝄞", &mut le).unwrap();
        assert_eq!(&le[..4], &[b'h', 0, 0xac, 0x20]);
        assert_eq!(decoded(&Utf16::LE, &le), "h€𝄞");

        let mut be = vec![];
        Utf16::BE.encode("h€", &mut be).unwrap();
        assert_eq!(be, [0, b'h', 0x20, 0xac]);
        assert_eq!(decoded(&Utf16::BE, &be), "h€");
        // dangling byte and lone surrogate
        assert_eq!(decoded(&Utf16::BE, &[0, b'h', 0]), "h\u{fffd}");
        assert_eq!(decoded(&Utf16::LE, &[0x3d, 0xd8]), "\u{fffd}");
    }

    #[test]
    fn test_latin1_and_ascii() {
        let mut out = vec![];
        Latin1.encode("café", &mut out).unwrap();
        assert_eq!(out, [b'c', b'a', b'f', 0xe9]);
        assert_eq!(decoded(&Latin1, &out), "café");
        assert_eq!(decoded(&Ascii, &out), "caf\u{fffd}");
        assert!(matches!(
            Latin1.encode("€", &mut out),
            Err(EncodingError::Unrepresentable { ch: '€', .. })
        ));
        assert!(Ascii.encode("é", &mut out).is_err());
    }
}
