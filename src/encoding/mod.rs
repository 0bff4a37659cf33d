/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Text encodings.

Readers and writers never convert between bytes and text themselves: they
look up a [`TextEncoding`] by name in an [`EncodingRegistry`] and delegate to
it. Names are case-insensitive. The [default registry](EncodingRegistry::shared)
knows UTF-8, UTF-16 in both byte orders, ISO-8859-1, and US-ASCII; other
encodings can be added with [`EncodingRegistry::register`].

Besides the conversion itself, an encoding tells the string scans of
[`DataReader`](crate::impls::DataReader) the width of its code units, so that
terminators are matched on code-unit boundaries only.

*/

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::traits::Endianness;

mod builtin;
pub use builtin::*;

/// The error returned by encoding lookups and conversions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// No encoding with this name is registered.
    #[error("unsupported encoding: {0:?}")]
    Unsupported(String),

    /// The text contains a character the encoding cannot represent.
    #[error("encoding {encoding} cannot represent {ch:?}")]
    Unrepresentable { encoding: &'static str, ch: char },

    /// String scans support only code units of one or two bytes.
    #[error("encoding {encoding} has {width}-byte code units, which cannot be scanned")]
    UnsupportedUnitWidth { encoding: &'static str, width: usize },
}

/// A character set able to convert text to bytes and back.
pub trait TextEncoding: core::fmt::Debug + Send + Sync {
    /// The canonical name of the encoding.
    fn name(&self) -> &'static str;

    /// The width in bytes of a code unit: 1 for 8-bit encodings, 2 for UTF-16.
    fn unit_width(&self) -> usize;

    /// The byte order of code units wider than one byte.
    fn unit_order(&self) -> Endianness {
        Endianness::Little
    }

    /// Decode `bytes`, appending the text to `out`.
    ///
    /// Decoding is lossy: malformed sequences, including a truncated code point
    /// at the end of `bytes`, are replaced by U+FFFD.
    fn decode(&self, bytes: &[u8], out: &mut String);

    /// Encode `text`, appending the bytes to `out`.
    fn encode(&self, text: &str, out: &mut Vec<u8>) -> Result<(), EncodingError>;

    /// Return the value of the code unit stored in `unit`, which must be
    /// [`unit_width`](TextEncoding::unit_width) bytes long.
    ///
    /// # Panics
    ///
    /// The default implementation panics if `unit` is not one or two bytes
    /// long. Readers check the width before scanning, returning
    /// [`EncodingError::UnsupportedUnitWidth`] instead.
    fn unit_value(&self, unit: &[u8]) -> u16 {
        match (unit, self.unit_order()) {
            ([byte], _) => *byte as u16,
            ([first, second], Endianness::Little) => u16::from_le_bytes([*first, *second]),
            ([first, second], Endianness::Big) => u16::from_be_bytes([*first, *second]),
            _ => unreachable!("code units are one or two bytes wide"),
        }
    }
}

/// A case-insensitive map from names to [`TextEncoding`]s.
#[derive(Debug, Clone, Default)]
pub struct EncodingRegistry {
    encodings: HashMap<String, Arc<dyn TextEncoding>>,
}

static SHARED: OnceLock<Arc<EncodingRegistry>> = OnceLock::new();

impl EncodingRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry containing the built-in encodings and their usual
    /// aliases.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let utf8: Arc<dyn TextEncoding> = Arc::new(Utf8);
        let utf16le: Arc<dyn TextEncoding> = Arc::new(Utf16::LE);
        let utf16be: Arc<dyn TextEncoding> = Arc::new(Utf16::BE);
        let latin1: Arc<dyn TextEncoding> = Arc::new(Latin1);
        let ascii: Arc<dyn TextEncoding> = Arc::new(Ascii);
        for name in ["utf-8", "utf8", "unicode-1-1-utf-8"] {
            registry.register(name, utf8.clone());
        }
        for name in ["utf-16le", "utf-16", "utf16le", "ucs-2"] {
            registry.register(name, utf16le.clone());
        }
        for name in ["utf-16be", "utf16be"] {
            registry.register(name, utf16be.clone());
        }
        for name in ["iso-8859-1", "latin1", "l1", "binary"] {
            registry.register(name, latin1.clone());
        }
        for name in ["us-ascii", "ascii"] {
            registry.register(name, ascii.clone());
        }
        registry
    }

    /// Return the process-wide registry of built-in encodings.
    pub fn shared() -> Arc<Self> {
        SHARED
            .get_or_init(|| Arc::new(Self::with_builtins()))
            .clone()
    }

    /// Register `encoding` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, encoding: Arc<dyn TextEncoding>) {
        self.encodings.insert(normalize(name), encoding);
    }

    /// Look up an encoding by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn TextEncoding>, EncodingError> {
        self.encodings
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| EncodingError::Unsupported(name.to_owned()))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
