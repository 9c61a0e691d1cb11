//! Node codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use splicefs_bench::utils::{random_cids, random_data, wide_directory, wide_file};
use splicefs_codec::{Cid, Codec, Decode, Encode, FileNode, Node};

/// Benchmark encoding file and directory nodes.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for count in [2, 16, 174] {
        let node = wide_file(count, 262_144);
        group.bench_with_input(BenchmarkId::new("file", count), &node, |b, node| {
            b.iter(|| black_box(node.encode()));
        });

        let dir = wide_directory(count);
        group.bench_with_input(BenchmarkId::new("directory", count), &dir, |b, dir| {
            b.iter(|| black_box(dir.encode()));
        });
    }

    group.finish();
}

/// Benchmark decoding file and directory nodes.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for count in [2, 16, 174] {
        let bytes = wide_file(count, 262_144).encode();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("file", count), &bytes, |b, bytes| {
            b.iter(|| black_box(Node::decode(black_box(bytes)).unwrap()));
        });

        let bytes = wide_directory(count).encode();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("directory", count), &bytes, |b, bytes| {
            b.iter(|| black_box(Node::decode(black_box(bytes)).unwrap()));
        });
    }

    let inline = FileNode::inline(random_data(1024)).encode();
    group.bench_function("inline_1k", |b| {
        b.iter(|| black_box(Node::decode(black_box(&inline)).unwrap()));
    });

    group.finish();
}

/// Benchmark identifier hashing and text forms.
fn bench_cid(c: &mut Criterion) {
    let mut group = c.benchmark_group("cid");

    for size in [1024, 262_144] {
        let data = random_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("hash", size), &data, |b, data| {
            b.iter(|| black_box(Cid::hash(Codec::Raw, black_box(data))));
        });
    }
    group.throughput(Throughput::Elements(1));

    let cid = random_cids(1)[0];
    group.bench_function("to_string", |b| {
        b.iter(|| black_box(cid.to_string()));
    });

    let text = cid.to_string();
    group.bench_function("parse", |b| {
        b.iter(|| black_box(text.parse::<Cid>().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_cid);
criterion_main!(benches);
