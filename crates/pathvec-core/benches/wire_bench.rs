use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pathvec_core::types::{NodeId, Path, PathRecord};
use pathvec_core::wire::{decode_record, encode_record};

fn make_record(hops: u32) -> PathRecord {
    PathRecord::new(NodeId(0xAA), (0..hops).map(NodeId).collect::<Path>())
}

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record");

    for hops in [0u32, 8, 64, 253] {
        let record = make_record(hops);
        let raw = encode_record(&record, NodeId(1)).unwrap();
        group.throughput(Throughput::Bytes(raw.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", hops), &record, |b, r| {
            b.iter(|| encode_record(r, NodeId(1)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("decode", hops), &raw, |b, raw| {
            b.iter(|| decode_record(raw).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_record);
criterion_main!(benches);
