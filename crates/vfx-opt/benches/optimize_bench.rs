//! Benchmarks for op chain optimization.
//!
//! Run with: `cargo bench -p vfx-opt`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vfx_opt::ops::{ExponentOp, LogOp, MatrixOffsetOp};
use vfx_opt::{optimize_op_vec, NullSink, OpChain, OpRcPtr, TransformDirection};

use TransformDirection::{Forward as Fwd, Inverse as Inv};

/// Palindrome of `depth` ops followed by their inverses: collapses fully.
fn nested_chain(depth: usize) -> OpChain {
    let make = |i: usize, dir| -> OpRcPtr {
        let v = 1.0 + (i % 7) as f64 * 0.1;
        match i % 3 {
            0 => ExponentOp::shared([v, v, v, 1.0], dir).unwrap(),
            1 => std::sync::Arc::new(LogOp::with_base(2.0 + v, dir).unwrap()),
            _ => std::sync::Arc::new(MatrixOffsetOp::scale([v; 4], dir).unwrap()),
        }
    };
    let mut chain: OpChain = (0..depth).map(|i| make(i, Fwd)).collect();
    chain.extend((0..depth).rev().map(|i| make(i, Inv)));
    chain
}

/// Nothing to remove: every op differs from its neighbour.
fn irreducible_chain(len: usize) -> OpChain {
    (0..len)
        .map(|i| {
            let v = 1.5 + i as f64 * 0.01;
            ExponentOp::shared([v, v, v, 1.0], Fwd).unwrap()
        })
        .collect()
}

fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");

    for size in [8, 64, 512].iter() {
        group.throughput(Throughput::Elements(*size as u64 * 2));

        let nested = nested_chain(*size);
        group.bench_with_input(BenchmarkId::new("nested_inverse", size), &nested, |b, chain| {
            b.iter(|| {
                let mut chain = chain.clone();
                optimize_op_vec(black_box(&mut chain), &NullSink)
            })
        });

        let flat = irreducible_chain(*size * 2);
        group.bench_with_input(BenchmarkId::new("irreducible", size), &flat, |b, chain| {
            b.iter(|| {
                let mut chain = chain.clone();
                optimize_op_vec(black_box(&mut chain), &NullSink)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);
