use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use orbprint::hamming::{checked_hamming, hamming_256, hamming_naive};
use rand::prelude::*;

fn bench_hamming(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hamming");
    let mut rng = rand::rng();
    let mut src = vec![0u8; 32];
    let mut dst = vec![0u8; 8 << 20];
    rng.fill_bytes(&mut src);
    rng.fill_bytes(&mut dst);

    group.throughput(Throughput::Bytes(dst.len() as u64));
    group.bench_function("hamming_256_naive", |b| {
        b.iter(|| {
            dst.chunks_exact(black_box(32))
                .map(|chunk| hamming_naive(&src, chunk))
                .sum::<u32>()
        });
    });
    group.bench_function("hamming_256_u64", |b| {
        b.iter(|| dst.chunks_exact(32).map(|chunk| hamming_256(&src, chunk)).sum::<u32>());
    });
    group.bench_function("checked_hamming", |b| {
        b.iter(|| dst.chunks_exact(32).map(|chunk| checked_hamming(&src, chunk).unwrap()).sum::<u32>());
    });
    group.finish();
}

criterion_group!(benches, bench_hamming);
criterion_main!(benches);
