//! Database operation benchmarks.

use bow_bench::{generate_payloads, random_data, Payload};
use bow_core::{Database, Options};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use tempfile::tempdir;

/// Benchmark single record puts.
fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let db = Database::open_in_memory().unwrap();
            let bucket = db.bucket("bench");
            let mut payload = Payload {
                data: random_data(size),
                ..Payload::default()
            };

            b.iter(|| {
                payload.id += 1;
                bucket.put(black_box(&payload)).unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark puts against a file, with and without sync on commit.
fn bench_put_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_file");
    group.sample_size(20);

    for sync in [false, true] {
        group.bench_with_input(BenchmarkId::from_parameter(sync), &sync, |b, &sync| {
            let dir = tempdir().unwrap();
            let db = Database::open_with(
                dir.path().join("bench.bow"),
                Options::new().sync_on_commit(sync),
            )
            .unwrap();
            let bucket = db.bucket("bench");
            let mut payload = Payload {
                data: random_data(256),
                ..Payload::default()
            };

            b.iter(|| {
                payload.id += 1;
                bucket.put(black_box(&payload)).unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark point reads from a populated bucket.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for count in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let db = Database::open_in_memory().unwrap();
            let bucket = db.bucket("bench");
            for payload in generate_payloads(count, 256) {
                bucket.put(&payload).unwrap();
            }
            let mut rng = rand::thread_rng();

            b.iter(|| {
                let id = rng.gen_range(0..count as u64);
                black_box(bucket.get::<Payload>(&id).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark full scans with a reused target.
fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let db = Database::open_in_memory().unwrap();
            let bucket = db.bucket("bench");
            for payload in generate_payloads(count, 64) {
                bucket.put(&payload).unwrap();
            }

            b.iter(|| {
                let mut iter = bucket.iter::<Payload>().unwrap();
                let mut payload = Payload::default();
                let mut seen = 0;
                while iter.advance(&mut payload) {
                    seen += 1;
                }
                assert_eq!(seen, count);
            });
        });
    }
    group.finish();
}

/// Benchmark compaction after every record was overwritten once.
fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("compact");
    group.sample_size(10);

    group.bench_function("1000", |b| {
        let dir = tempdir().unwrap();
        let db = Database::open_with(
            dir.path().join("bench.bow"),
            Options::new().sync_on_commit(false),
        )
        .unwrap();
        let bucket = db.bucket("bench");

        b.iter(|| {
            for _ in 0..2 {
                for payload in generate_payloads(1000, 64) {
                    bucket.put(&payload).unwrap();
                }
            }
            black_box(db.compact().unwrap());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_put,
    bench_put_file,
    bench_get,
    bench_iterate,
    bench_compact
);
criterion_main!(benches);
