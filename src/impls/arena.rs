/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Index of a chunk stored in a [`ChunkArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkId(usize);

/// Owner of the chunks a [`DataReader`](crate::impls::DataReader) has pulled
/// from its source and not yet discarded.
///
/// The reader refers to chunks only through [`ChunkId`]s, so the same chunk
/// can move between the cursor, the look-ahead history, and the replay queue
/// without being copied. Released slots are recycled through a free list.
#[derive(Debug, Default)]
pub(crate) struct ChunkArena {
    slots: Vec<Vec<u8>>,
    free: Vec<usize>,
}

impl ChunkArena {
    pub(crate) fn insert(&mut self, chunk: Vec<u8>) -> ChunkId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = chunk;
                ChunkId(index)
            }
            None => {
                self.slots.push(chunk);
                ChunkId(self.slots.len() - 1)
            }
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self, id: ChunkId) -> &[u8] {
        &self.slots[id.0]
    }

    /// Drop the chunk and make its slot available for reuse.
    pub(crate) fn release(&mut self, id: ChunkId) {
        debug_assert!(!self.free.contains(&id.0), "chunk {} released twice", id.0);
        self.slots[id.0] = Vec::new();
        self.free.push(id.0);
    }

    /// Return the number of chunks currently stored.
    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
