//! Gearset decoding and reconciliation benchmarks
//!
//! Both run on the login path, so they should stay well under a frame.
//!
//! Run with:
//!   cargo bench --bench reconcile_benchmark

use charsync::services::gearset_file::read_gearsets_from;
use charsync::services::{GearsetTable, reconcile};
use charsync::{GearsetInfo, GearsetLayout};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::io::Cursor;

fn encode_full_file(layout: &GearsetLayout, gearsets: &[GearsetInfo]) -> Vec<u8> {
    let mut records = vec![vec![0u8; layout.record_size]; layout.max_count];
    for gearset in gearsets {
        let record = &mut records[usize::from(gearset.id)];
        record[layout.id_offset] = gearset.id;
        record[layout.job_offset] = gearset.job_id;
        record[layout.flags_offset] = layout.exists_mask;
        let name = gearset.name.as_bytes();
        record[layout.name_offset..layout.name_offset + name.len()].copy_from_slice(name);
    }

    let mut data = layout.magic.to_vec();
    data.resize(layout.header_len as usize, 0);
    for record in records {
        data.extend(record.into_iter().map(|b| b ^ layout.xor_key));
    }
    data
}

/// `count` gearsets with distinct names, cycling through the combat jobs.
fn gearsets(count: u8) -> Vec<GearsetInfo> {
    (0..count)
        .map(|id| GearsetInfo::new(id, 1 + id % 40, format!("Set {}", id).as_str()))
        .collect()
}

/// The same gearsets, numbered in reverse order so every one needs a swap.
fn reversed(main: &[GearsetInfo]) -> Vec<GearsetInfo> {
    let last = main.len() as u8 - 1;
    main.iter()
        .map(|g| GearsetInfo::new(last - g.id, g.job_id, g.name.clone()))
        .collect()
}

fn bench_decode(c: &mut Criterion) {
    let layout = GearsetLayout::default();
    let data = encode_full_file(&layout, &gearsets(100));

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("full_file", |b| {
        b.iter(|| read_gearsets_from(Cursor::new(black_box(&data)), &layout).unwrap())
    });
    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for count in [10u8, 50, 100] {
        let main = gearsets(count);
        let alt = reversed(&main);
        group.throughput(Throughput::Elements(u64::from(count)));

        group.bench_with_input(BenchmarkId::new("reversed", count), &count, |b, _| {
            b.iter_batched(
                || GearsetTable::from_gearsets(100, alt.iter().cloned()).unwrap(),
                |mut table| reconcile(black_box(&main), &mut table).unwrap(),
                criterion::BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("aligned", count), &count, |b, _| {
            b.iter_batched(
                || GearsetTable::from_gearsets(100, main.iter().cloned()).unwrap(),
                |mut table| reconcile(black_box(&main), &mut table).unwrap(),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_reconcile);
criterion_main!(benches);
