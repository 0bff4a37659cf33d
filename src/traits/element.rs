/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use num_traits::PrimInt;

use super::Endianness;

/// Inner private trait used to make implementing [`Element`]
/// impossible for other types.
mod private {
    pub trait Element {}
}

/// The primitive integer types that can be read and written in bulk.
///
/// Array reads move raw bytes in native order and then, only if the requested
/// byte order differs from the native one, run a byte-swapping pass over the
/// elements. This trait provides the conversions needed by both steps.
pub trait Element: PrimInt + Default + private::Element {
    /// The size in bytes of the type.
    const BYTES: usize;

    /// Build a value from exactly [`Self::BYTES`] bytes in native order.
    fn from_ne_slice(bytes: &[u8]) -> Self;

    /// Store the value in exactly [`Self::BYTES`] bytes in native order.
    fn write_ne_slice(self, bytes: &mut [u8]);

    /// Return the value converted from or to `endianness`, swapping bytes only
    /// if `endianness` is not the native one.
    #[inline(always)]
    fn swap_if_foreign(self, endianness: Endianness) -> Self {
        if endianness.is_native() {
            self
        } else {
            self.swap_bytes()
        }
    }
}

macro_rules! impl_element {
    ($($ty:ty),*) => {$(
        impl private::Element for $ty {}

        impl Element for $ty {
            const BYTES: usize = core::mem::size_of::<$ty>();

            #[inline(always)]
            fn from_ne_slice(bytes: &[u8]) -> Self {
                let mut raw = [0_u8; core::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_ne_bytes(raw)
            }

            #[inline(always)]
            fn write_ne_slice(self, bytes: &mut [u8]) {
                bytes.copy_from_slice(&self.to_ne_bytes());
            }
        }
    )*};
}

impl_element!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Swap the bytes of every element of `values` if `endianness` is not the
/// native byte order.
pub fn swap_elements<T: Element>(values: &mut [T], endianness: Endianness) {
    if T::BYTES == 1 || endianness.is_native() {
        return;
    }
    for value in values.iter_mut() {
        *value = value.swap_bytes();
    }
}
