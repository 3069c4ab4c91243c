// Benchmarks for frame scanning and LWW reduction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ronframe::rdt::lww;
use ronframe::ron::{Batch, Frame, Op, Term, Uuid};

// =============================================================================
// Benchmark Helpers
// =============================================================================

/// A replica that wrote `keys` fields, every one at time `time`.
fn replica(origin: &str, time: usize, keys: usize) -> Frame {
    let kind = lww::TYPE;
    let object: Uuid = "bench".parse().unwrap();
    let event: Uuid = format!("{time}+{origin}").parse().unwrap();
    let mut frame = Frame::new();
    frame.push(&Op::new(kind, object, event, Uuid::ZERO, "", Term::Header));
    for key in 0..keys {
        let location: Uuid = format!("k{key:05}").parse().unwrap();
        frame.push(&Op::new(kind, object, event, location, format!("={key}"), Term::Regular));
    }
    return frame;
}

fn batch(replicas: usize, keys: usize) -> Batch {
    return (0..replicas)
        .map(|i| replica(&format!("r{i}"), i + 1, keys))
        .collect();
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    for keys in [100, 1_000, 10_000] {
        let frame = replica("alice", 1, keys);
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(keys), &frame, |b, frame| {
            b.iter(|| black_box(frame.ops().count()))
        });
    }
    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("lww_reduce");
    for replicas in [2, 8, 32] {
        let input = batch(replicas, 1_000);
        group.throughput(Throughput::Elements((replicas * 1_000) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(replicas), &input, |b, input| {
            b.iter(|| black_box(lww::reduce(input).map(|frame| frame.len())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan, bench_reduce);
criterion_main!(benches);
