/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::error::Error;

use crate::encoding::EncodingError;

/// The error returned by the methods of [`DataReader`](crate::impls::DataReader).
///
/// Reaching the end of the stream is not an error: single values are returned
/// as [`Option`]s and bulk reads return the number of elements read.
///
/// After a [`ReadError::Source`] the state of the reader is unspecified, and
/// the reader should be discarded.
#[derive(thiserror::Error, Debug)]
pub enum ReadError<E: Error + Send + Sync + 'static> {
    /// The underlying [`ChunkRead`](crate::traits::ChunkRead) failed.
    #[error("chunk source failed: {0}")]
    Source(#[source] E),

    /// The requested text encoding is unknown or cannot decode the data.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A look-ahead tried to commit more bits than it read.
    #[error("cannot commit {requested} bits: the look-ahead read only {available} bits")]
    CommitOverrun { requested: u64, available: u64 },
}

/// The error returned by the methods of [`DataWriter`](crate::impls::DataWriter).
///
/// After a [`WriteError::Sink`] the state of the writer is unspecified, and
/// the writer should be discarded.
#[derive(thiserror::Error, Debug)]
pub enum WriteError<E: Error + Send + Sync + 'static> {
    /// The underlying [`ChunkWrite`](crate::traits::ChunkWrite) failed.
    #[error("chunk sink failed: {0}")]
    Sink(#[source] E),

    /// The requested text encoding is unknown or cannot represent the text.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
