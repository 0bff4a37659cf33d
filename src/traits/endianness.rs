/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::OnceLock;

/// Byte order used to compose and decompose multi-byte values.
///
/// Unlike the bit order, which is fixed (the first bit of a byte is its least
/// significant one), the byte order can be chosen per reader or writer and
/// overridden per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endianness {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first.
    Big,
}

/// Alias for [`Endianness::Little`]
pub const LE: Endianness = Endianness::Little;

/// Alias for [`Endianness::Big`]
pub const BE: Endianness = Endianness::Big;

static NATIVE: OnceLock<Endianness> = OnceLock::new();

impl Endianness {
    /// Return the byte order of the machine we are running on.
    ///
    /// The order is detected once by looking at the in-memory layout of a
    /// known 16-bit pattern, and cached for the rest of the process.
    #[inline]
    pub fn native() -> Self {
        *NATIVE.get_or_init(|| {
            let probe = 0x0102_u16.to_ne_bytes();
            if probe[0] == 0x02 {
                Endianness::Little
            } else {
                Endianness::Big
            }
        })
    }

    /// Return true if this is the byte order of the machine.
    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

impl Default for Endianness {
    fn default() -> Self {
        Self::native()
    }
}

impl core::fmt::Display for Endianness {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Endianness::Little => f.write_str("little"),
            Endianness::Big => f.write_str("big"),
        }
    }
}

/// Reverse the bytes of a 16-bit value.
#[inline(always)]
#[must_use]
pub const fn swap16(value: u16) -> u16 {
    ((value & 0x00ff) << 8) | ((value & 0xff00) >> 8)
}

/// Reverse the bytes of a 32-bit value.
#[inline(always)]
#[must_use]
pub const fn swap32(value: u32) -> u32 {
    ((value & 0x0000_00ff) << 24)
        | ((value & 0x0000_ff00) << 8)
        | ((value & 0x00ff_0000) >> 8)
        | ((value & 0xff00_0000) >> 24)
}

/// Reverse the bytes of a 64-bit value.
#[inline(always)]
#[must_use]
pub const fn swap64(value: u64) -> u64 {
    let high = swap32(value as u32) as u64;
    let low = swap32((value >> 32) as u32) as u64;
    (high << 32) | low
}
