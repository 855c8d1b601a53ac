//! Codec benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cxa_core::{codec, Command, Source};

fn encode_benchmark(c: &mut Criterion) {
    let cmd = Command::set_source(Source::A1Balanced);

    c.bench_function("encode_set_source", |b| {
        b.iter(|| black_box(codec::encode(black_box(&cmd))))
    });
}

fn decode_benchmark(c: &mut Criterion) {
    let single = b"#04,01,14\r".to_vec();
    let burst = b"#02,01,1\r#02,03,0\r#04,01,20\r#14,01,1.1\r#14,02,v104\r".to_vec();

    c.bench_function("decode_single_reply", |b| {
        b.iter(|| black_box(codec::decode(black_box(&single)).unwrap()))
    });

    c.bench_function("decode_reply_burst", |b| {
        b.iter(|| black_box(codec::decode(black_box(&burst)).unwrap()))
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
