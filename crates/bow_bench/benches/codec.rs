//! Codec benchmarks.

use bow_bench::{generate_payloads, Payload};
use bow_codec::{CborCodec, Codec, JsonCodec};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_codec<C: Codec>(c: &mut Criterion, name: &str, codec: C) {
    let mut group = c.benchmark_group(name);

    for size in [16, 256, 4096].iter() {
        let payload = generate_payloads(1, *size).remove(0);
        let encoded = codec.marshal(&payload).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_with_input(BenchmarkId::new("marshal", size), &payload, |b, payload| {
            b.iter(|| codec.marshal(black_box(payload)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("unmarshal", size), &encoded, |b, encoded| {
            b.iter(|| codec.unmarshal::<Payload>(black_box(encoded)).unwrap());
        });
    }
    group.finish();
}

fn bench_cbor(c: &mut Criterion) {
    bench_codec(c, "cbor", CborCodec);
}

fn bench_json(c: &mut Criterion) {
    bench_codec(c, "json", JsonCodec);
}

criterion_group!(benches, bench_cbor, bench_json);
criterion_main!(benches);
