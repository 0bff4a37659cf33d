/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::prelude::*;
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
pub struct FuzzCase {
    data: Vec<u8>,
    /// Sizes of the chunks of `data`, modulo 17; the rest of `data` is the
    /// last chunk.
    splits: Vec<u8>,
    commands: Vec<RandomCommand>,
}

#[derive(Arbitrary, Debug)]
pub enum RandomCommand {
    ReadBit,
    ReadU8,
    ReadU16(bool),
    ReadU32(bool),
    ReadU64(bool),
    ReadBytes(u8),
    ReadString(u8),
    ReadNullTerminated(bool),
    ReadLine(bool, bool),
    SkipBits(u16),
    /// Run the commands in a look-ahead, committing nothing (`None`),
    /// everything (`Some(u16::MAX)`), or the given number of bits.
    LookAhead(Vec<RandomCommand>, Option<u16>),
}

/// The observable result of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Bit(Option<bool>),
    Value(Option<u64>),
    Bytes(Vec<u8>),
    Count(u64),
    Text(Option<String>),
    Nested(Vec<Outcome>),
    Failed(String),
}

fn endianness(big: bool) -> Endianness {
    if big { BE } else { LE }
}

fn run<CR: ChunkRead>(reader: &mut DataReader<CR>, command: &RandomCommand) -> Outcome {
    let result = match command {
        RandomCommand::ReadBit => reader.read_bit().map(Outcome::Bit),
        RandomCommand::ReadU8 => reader.read_u8().map(|x| Outcome::Value(x.map(u64::from))),
        RandomCommand::ReadU16(big) => reader
            .read_u16_with(endianness(*big))
            .map(|x| Outcome::Value(x.map(u64::from))),
        RandomCommand::ReadU32(big) => reader
            .read_u32_with(endianness(*big))
            .map(|x| Outcome::Value(x.map(u64::from))),
        RandomCommand::ReadU64(big) => reader.read_u64_with(endianness(*big)).map(Outcome::Value),
        RandomCommand::ReadBytes(len) => {
            let mut buf = vec![0; *len as usize];
            reader.read_bytes(&mut buf).map(|n| {
                buf.truncate(n);
                Outcome::Bytes(buf)
            })
        }
        RandomCommand::ReadString(len) => reader.read_string(*len as usize, None).map(Outcome::Text),
        RandomCommand::ReadNullTerminated(utf16) => {
            let mut options = NullTerminatedOptions::default();
            if *utf16 {
                options = options.with_encoding("utf-16le");
            }
            reader.read_null_terminated_string(&options).map(Outcome::Text)
        }
        RandomCommand::ReadLine(include_eol, null_terminated) => {
            let options = LineOptions::default()
                .with_include_eol(*include_eol)
                .with_null_terminated(*null_terminated);
            reader.read_line(&options).map(Outcome::Text)
        }
        RandomCommand::SkipBits(n_bits) => reader.skip_bits(*n_bits as u64).map(Outcome::Count),
        RandomCommand::LookAhead(commands, commit) => reader
            .look_ahead(|reader| {
                let outcomes: Vec<Outcome> =
                    commands.iter().map(|command| run(reader, command)).collect();
                Ok(match commit {
                    None => LookAhead::rollback(outcomes),
                    Some(u16::MAX) => LookAhead::commit(outcomes),
                    Some(n_bits) => LookAhead::commit_bits(outcomes, *n_bits as u64),
                })
            })
            .map(Outcome::Nested),
    };
    result.unwrap_or_else(|e| Outcome::Failed(e.to_string()))
}

fn split(data: &[u8], splits: &[u8]) -> Vec<Vec<u8>> {
    let mut chunks = vec![];
    let mut rest = data;
    for &size in splits {
        let size = (size as usize % 17).min(rest.len());
        let (chunk, tail) = rest.split_at(size);
        chunks.push(chunk.to_vec());
        rest = tail;
    }
    chunks.push(rest.to_vec());
    chunks
}

pub fn harness(case: FuzzCase) {
    let chunks = split(&case.data, &case.splits);
    let mut chunked = DataReader::new(IterChunkSource::new(chunks));
    let mut whole = DataReader::new(MemChunkSource::new(case.data.as_slice()));

    for command in &case.commands {
        // a rolled-back look-ahead must not change what follows
        let peeked = chunked
            .look_ahead(|reader| Ok(LookAhead::rollback(run(reader, command))))
            .ok();
        let got = run(&mut chunked, command);
        let expected = run(&mut whole, command);
        assert_eq!(got, expected, "{:?}", command);
        assert_eq!(peeked.as_ref(), Some(&got), "{:?}", command);
        assert_eq!(chunked.bits_consumed(), whole.bits_consumed());
        assert_eq!(chunked.is_byte_aligned(), whole.is_byte_aligned());
    }
}
