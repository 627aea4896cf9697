//! Benchmarks for the Socket.IO codec and frame normalization
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use wind_dashboard::sample::{FrameNormalizer, RawFrame, Sample};
use wind_dashboard::socketio::{EnginePacket, SocketPacket};

fn create_sample(channels: usize) -> Sample {
    Sample::new(
        1234.5,
        (0..channels).map(|i| (i as f64 * 0.37).sin() * 100.0).collect(),
    )
}

fn bench_packets(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet");

    for channels in [3, 43, 256] {
        let sample = create_sample(channels);
        let packet = EnginePacket::Message(SocketPacket::event("data", &sample).unwrap());
        let text = packet.encode();

        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_function(format!("encode_{}", channels), |b| {
            b.iter(|| black_box(&packet).encode())
        });

        group.bench_function(format!("decode_{}", channels), |b| {
            b.iter(|| EnginePacket::decode(black_box(&text)).unwrap())
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let normalizer = FrameNormalizer::default();

    let flat = RawFrame::Flat((0..64).map(|i| i as f64).collect());
    group.bench_function("flat_64", |b| {
        b.iter(|| normalizer.process(black_box(flat.clone())))
    });

    let rows = RawFrame::Rows((0..16).map(|r| (0..64).map(|i| (r * i) as f64).collect()).collect());
    group.bench_function("rows_16x64", |b| {
        b.iter(|| normalizer.process(black_box(rows.clone())))
    });

    group.finish();
}

criterion_group!(benches, bench_packets, bench_normalize);
criterion_main!(benches);
