/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Implementations of chunk sources and sinks, and of the readers and writers
working on them.

If you need to read or write chunks from a file or any backend implementing
[`std::io::Read`] or [`std::io::Write`] you just need to wrap it in a
[`ChunkAdapter`].

If instead you want to read from memory, you can use [`MemChunkSource`],
which splits a slice into chunks of a given size, or [`IterChunkSource`],
which returns the chunks of an iterator. To write to memory, you can use
[`MemChunkSink`] or [`GrowableSink`].

Once you have a source or a sink, [`DataReader`] and [`DataWriter`] read
and write bits, primitive values, arrays and text on top of it. Their
defaults (byte order, text encoding, buffer size) are set by
[`ReaderOptions`] and [`WriterOptions`].

*/

mod arena;

mod growable_sink;
pub use growable_sink::GrowableSink;

mod mem_chunk_source;
pub use mem_chunk_source::*;

mod mem_chunk_sink;
pub use mem_chunk_sink::*;

#[cfg(feature = "std")]
mod chunk_adapter;
#[cfg(feature = "std")]
pub use chunk_adapter::*;

mod options;
pub use options::*;

mod data_reader;
pub use data_reader::{Commit, DataReader, LookAhead};

mod data_writer;
pub use data_writer::DataWriter;
