/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Debug helpers.

[`CountChunkRead`] and [`CountChunkWrite`] keep track of the number
of chunks and bytes read from a [`ChunkRead`](crate::traits::ChunkRead)
or written to a [`ChunkWrite`](crate::traits::ChunkWrite), respectively,
optionally logging the operations performed on the stream.

*/

mod count;
pub use count::*;
