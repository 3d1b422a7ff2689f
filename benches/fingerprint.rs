use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use orbprint::fingerprint::majority_vote;
use rand::prelude::*;

fn bench_majority_vote(c: &mut Criterion) {
    let mut group = c.benchmark_group("Majority vote");
    let mut rng = StdRng::seed_from_u64(42);

    // ORB 默认最多保留 500 个特征点
    for n in [10, 100, 500] {
        let mut des = vec![[0u8; 32]; n];
        for d in &mut des {
            rng.fill_bytes(d);
        }
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &des, |b, des| {
            b.iter(|| majority_vote(black_box(des)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_majority_vote);
criterion_main!(benches);
