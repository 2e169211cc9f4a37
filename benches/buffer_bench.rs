// benches/buffer_bench.rs
use blockbuf::prelude::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation");

    for count in [256usize, 4096, 65536].iter() {
        group.bench_with_input(BenchmarkId::new("cached", count), count, |b, &count| {
            let ctx = MemoryContext::default();
            b.iter(|| {
                let buf = Buffer::<f32>::empty(&ctx, black_box(count), AllocKind::Host).unwrap();
                black_box(buf.data());
            });
        });

        group.bench_with_input(BenchmarkId::new("uncached", count), count, |b, &count| {
            let ctx = MemoryContext::new(ContextConfig::uncached());
            b.iter(|| {
                let buf = Buffer::<f32>::empty(&ctx, black_box(count), AllocKind::Host).unwrap();
                black_box(buf.data());
            });
        });
    }

    group.finish();
}

fn bench_sharing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sharing");
    let buf = Buffer::from_vec(vec![0u8; 4096]);

    group.bench_function("clone_drop", |b| {
        b.iter(|| {
            let copy = black_box(&buf).clone();
            black_box(copy.count());
        });
    });

    group.bench_function("slice", |b| {
        b.iter(|| {
            let view = buf.slice(black_box(128..1024)).unwrap();
            black_box(view.data());
        });
    });

    group.finish();
}

fn bench_row_pull(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_pull");
    let ctx = MemoryContext::default();
    let rows = 1024;
    let cols = 16;

    let floats = HomogenTable::from_vec(
        (0..rows * cols).map(|v| v as f32).collect(),
        rows,
        cols,
        DataLayout::RowMajor,
    )
    .unwrap();
    let ints = HomogenTable::from_vec(
        (0..rows * cols).map(|v| v as i32).collect(),
        rows,
        cols,
        DataLayout::RowMajor,
    )
    .unwrap();

    group.bench_function("zero_copy", |b| {
        let accessor = RowAccessor::<f32>::new(&floats).unwrap();
        b.iter(|| {
            let block = accessor
                .pull(&ctx, black_box(Range::new(0, 256)), AllocKind::Host)
                .unwrap();
            black_box(block.data());
        });
    });

    group.bench_function("convert_fresh", |b| {
        let accessor = RowAccessor::<f32>::new(&ints).unwrap();
        b.iter(|| {
            let block = accessor
                .pull(&ctx, black_box(Range::new(0, 256)), AllocKind::Host)
                .unwrap();
            black_box(block.data());
        });
    });

    group.bench_function("convert_reused", |b| {
        let accessor = RowAccessor::<f32>::new(&ints).unwrap();
        let mut block = Buffer::new();
        b.iter(|| {
            let values = accessor
                .pull_into(&ctx, &mut block, black_box(Range::new(0, 256)), AllocKind::Host)
                .unwrap();
            black_box(values.len());
        });
    });

    group.finish();
}

fn bench_column_pull(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_pull");
    let ctx = MemoryContext::default();
    let rows = 4096;
    let cols = 8;

    for layout in [DataLayout::RowMajor, DataLayout::ColumnMajor] {
        let table = HomogenTable::from_vec(
            (0..rows * cols).map(|v| v as f64).collect(),
            rows,
            cols,
            layout,
        )
        .unwrap();
        let accessor = ColumnAccessor::<f64>::new(&table).unwrap();

        group.bench_function(format!("{:?}", layout), |b| {
            let mut block = Buffer::new();
            b.iter(|| {
                let values = accessor
                    .pull_into(&ctx, &mut block, black_box(3), Range::all(), AllocKind::Host)
                    .unwrap();
                black_box(values.len());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_allocation,
    bench_sharing,
    bench_row_pull,
    bench_column_pull
);

criterion_main!(benches);
