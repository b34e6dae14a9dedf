//! Benchmarks for the hot paths of sample admission: the limit arbiter,
//! name formatting, and hash-tap throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use sample_collector::limits::{sample_limit_status, Limits};
use sample_collector::models::{ContentType, ParentRef};
use sample_collector::naming::sample_base_name;
use sample_collector::stream::{shared, CryptoHashAlgs, CryptoHashStream, DevNullStream, MemoryStream};
use sample_collector::stream::ByteStream;

/// Benchmark the arbiter with every ceiling configured
fn bench_limit_arbiter(c: &mut Criterion) {
    let global = Limits {
        max_sample_count: Some(100_000),
        max_bytes_per_sample: Some(1 << 30),
        max_bytes_total: Some(1 << 40),
        ..Limits::default()
    };
    let local = global.clone();

    c.bench_function("limit_arbiter_full_ceilings", |b| {
        b.iter(|| sample_limit_status(black_box(&global), black_box(&local), black_box(4096)))
    });
}

/// Benchmark sample name formatting including sanitization
fn bench_sample_naming(c: &mut Criterion) {
    let parent = ParentRef {
        sequence: 4,
        segment_high: 1,
        segment_low: 0x2A51,
    };

    c.bench_function("sample_base_name", |b| {
        b.iter(|| {
            sample_base_name(
                black_box(ContentType::Data),
                black_box(&parent),
                black_box("some file: with#odd chars.exe"),
                black_box("Zone.Identifier"),
                black_box(3),
            )
        })
    });
}

/// Benchmark hash-tap throughput over an in-memory source
fn bench_hash_tap(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto_hash_tap");
    let size = 1024 * 1024;
    let data = vec![0xA5u8; size];

    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("md5_sha1_sha256_1mb", |b| {
        b.iter(|| {
            let inner = shared(MemoryStream::from_vec(data.clone()));
            let mut tap = CryptoHashStream::open_to_read(CryptoHashAlgs::all(), inner);
            let mut sink = DevNullStream::new();
            tap.copy_to(&mut sink).unwrap();
            black_box(tap.digests())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_limit_arbiter,
    bench_sample_naming,
    bench_hash_tap
);
criterion_main!(benches);
