/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Traits and shared types: the chunk source and sink contracts, byte order,
primitive array elements, and the error types of readers and writers.

*/

mod chunks;
pub use chunks::*;

mod element;
pub use element::*;

mod endianness;
pub use endianness::*;

mod errors;
pub use errors::*;
