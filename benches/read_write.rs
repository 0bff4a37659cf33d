use criterion::{Criterion, criterion_group, criterion_main};
use chunked_datastream::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use std::hint::black_box;

const N: usize = 100_000;

fn gen_values(n: usize) -> Vec<u32> {
    let mut r = SmallRng::seed_from_u64(0);
    (0..n).map(|_| r.next_u32()).collect()
}

fn gen_text(n_lines: usize) -> Vec<u8> {
    let mut r = SmallRng::seed_from_u64(1);
    let mut text = vec![];
    for _ in 0..n_lines {
        let len = r.random_range(0..80);
        text.extend((0..len).map(|_| r.random_range(b' '..=b'~')));
        text.extend_from_slice(if r.random_bool(0.5) { b"\r\n" } else { b"\n" });
    }
    text
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let values = gen_values(N);
    let mut data = vec![];
    {
        let mut writer = DataWriter::new(MemChunkSink::new(&mut data));
        for &value in &values {
            writer.write_u32_with(value, BE).unwrap();
        }
    }

    c.bench_function("write_u32<BE>", |b| {
        b.iter(|| {
            let mut sink = GrowableSink::with_capacity(4 * N);
            let mut writer = DataWriter::new(&mut sink);
            for &value in &values {
                writer.write_u32_with(black_box(value), BE).unwrap();
            }
        })
    });

    c.bench_function("write_u32_array<BE>", |b| {
        b.iter(|| {
            let mut sink = GrowableSink::with_capacity(4 * N);
            let mut writer = DataWriter::new(&mut sink);
            writer.write_u32_array_with(black_box(&values), BE).unwrap();
        })
    });

    for chunk_size in [16, 4096] {
        c.bench_function(&format!("read_u32<BE> chunks of {}", chunk_size), |b| {
            b.iter(|| {
                let mut reader = DataReader::new(MemChunkSource::with_chunk_size(&data, chunk_size));
                while let Some(value) = reader.read_u32_with(BE).unwrap() {
                    black_box(value);
                }
            })
        });

        c.bench_function(&format!("read_u32_array<BE> chunks of {}", chunk_size), |b| {
            let mut buf = vec![0; N];
            b.iter(|| {
                let mut reader = DataReader::new(MemChunkSource::with_chunk_size(&data, chunk_size));
                black_box(reader.read_u32_array_with(&mut buf, BE).unwrap());
            })
        });
    }

    c.bench_function("read_bit", |b| {
        b.iter(|| {
            let mut reader = DataReader::new(MemChunkSource::with_chunk_size(&data, 4096));
            while let Some(bit) = reader.read_bit().unwrap() {
                black_box(bit);
            }
        })
    });

    let text = gen_text(10_000);
    for unaligned in [false, true] {
        c.bench_function(&format!("read_line unaligned={}", unaligned), |b| {
            b.iter(|| {
                let mut reader = DataReader::new(MemChunkSource::with_chunk_size(&text, 4096));
                if unaligned {
                    reader.read_bit().unwrap();
                }
                let options = LineOptions::default();
                while let Some(line) = reader.read_line(&options).unwrap() {
                    black_box(line);
                }
            })
        });
    }

    c.bench_function("look_ahead rollback", |b| {
        b.iter(|| {
            let mut reader = DataReader::new(MemChunkSource::with_chunk_size(&data, 16));
            while reader
                .look_ahead(|reader| Ok(LookAhead::rollback(reader.read_u64()?)))
                .unwrap()
                .is_some()
            {
                black_box(reader.read_u32().unwrap());
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
