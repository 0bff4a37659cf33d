/*
 * SPDX-FileCopyrightText: 2023 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::prelude::*;
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
pub struct FuzzCase {
    buffer_size: u8,
    chunk_size: u8,
    commands: Vec<RandomCommand>,
}

#[derive(Arbitrary, Debug)]
pub enum RandomCommand {
    Bit(bool),
    U8(u8),
    U16(u16, bool),
    U32(u32, bool),
    U64(u64, bool),
    Bytes(Vec<u8>),
    U32Array(Vec<u32>, bool),
    NullTerminated(String, bool),
    Line(String),
    Flush,
}

fn endianness(big: bool) -> Endianness {
    if big { BE } else { LE }
}

fn encoding(utf16: bool) -> &'static str {
    if utf16 { "utf-16be" } else { "utf-8" }
}

pub fn harness(data: FuzzCase) {
    let mut buffer = vec![];
    // text that would be cut short by a terminator is not written
    let written: Vec<&RandomCommand> = data
        .commands
        .iter()
        .filter(|command| match command {
            RandomCommand::NullTerminated(text, _) => !text.contains('\0'),
            RandomCommand::Line(text) => !text.contains('\n'),
            _ => true,
        })
        .collect();

    {
        let options = WriterOptions::default().with_buffer_size(data.buffer_size as usize);
        let mut writer = DataWriter::with_options(MemChunkSink::new(&mut buffer), options);
        for command in &written {
            match command {
                RandomCommand::Bit(bit) => writer.write_bit(*bit).unwrap(),
                RandomCommand::U8(value) => writer.write_u8(*value).unwrap(),
                RandomCommand::U16(value, big) => writer.write_u16_with(*value, endianness(*big)).unwrap(),
                RandomCommand::U32(value, big) => writer.write_u32_with(*value, endianness(*big)).unwrap(),
                RandomCommand::U64(value, big) => writer.write_u64_with(*value, endianness(*big)).unwrap(),
                RandomCommand::Bytes(bytes) => writer.write_bytes(bytes).unwrap(),
                RandomCommand::U32Array(values, big) => writer
                    .write_u32_array_with(values, endianness(*big))
                    .unwrap(),
                RandomCommand::NullTerminated(text, utf16) => {
                    writer
                        .write_null_terminated_string(text, Some(encoding(*utf16)))
                        .unwrap();
                }
                RandomCommand::Line(text) => {
                    writer.write_line(text, EolConvention::Lf, None).unwrap();
                }
                RandomCommand::Flush => writer.flush().unwrap(),
            }
        }
        writer.flush().unwrap();
    }

    let source = MemChunkSource::with_chunk_size(&buffer, data.chunk_size as usize % 13 + 1);
    let mut reader = DataReader::new(source);
    for command in &written {
        match command {
            RandomCommand::Bit(bit) => assert_eq!(reader.read_bit().unwrap(), Some(*bit)),
            RandomCommand::U8(value) => assert_eq!(reader.read_u8().unwrap(), Some(*value)),
            RandomCommand::U16(value, big) => {
                assert_eq!(reader.read_u16_with(endianness(*big)).unwrap(), Some(*value))
            }
            RandomCommand::U32(value, big) => {
                assert_eq!(reader.read_u32_with(endianness(*big)).unwrap(), Some(*value))
            }
            RandomCommand::U64(value, big) => {
                assert_eq!(reader.read_u64_with(endianness(*big)).unwrap(), Some(*value))
            }
            RandomCommand::Bytes(bytes) => {
                let mut read = vec![0; bytes.len()];
                assert_eq!(reader.read_bytes(&mut read).unwrap(), bytes.len());
                assert_eq!(&read, bytes);
            }
            RandomCommand::U32Array(values, big) => {
                let mut read = vec![0; values.len()];
                assert_eq!(
                    reader
                        .read_u32_array_with(&mut read, endianness(*big))
                        .unwrap(),
                    values.len()
                );
                assert_eq!(&read, values);
            }
            RandomCommand::NullTerminated(text, utf16) => {
                let options = NullTerminatedOptions::default().with_encoding(encoding(*utf16));
                assert_eq!(
                    reader.read_null_terminated_string(&options).unwrap().as_ref(),
                    Some(text)
                );
            }
            RandomCommand::Line(text) => {
                let options = LineOptions::default().with_eol(EolConvention::Lf);
                assert_eq!(reader.read_line(&options).unwrap().as_ref(), Some(text));
            }
            RandomCommand::Flush => {
                let padding = (8 - reader.bits_consumed() % 8) % 8;
                assert_eq!(reader.skip_bits(padding).unwrap(), padding);
            }
        }
    }
    let padding = (8 - reader.bits_consumed() % 8) % 8;
    assert_eq!(reader.skip_bits(padding).unwrap(), padding);
    assert_eq!(reader.read_u8().unwrap(), None);
}
