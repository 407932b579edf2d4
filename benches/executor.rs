use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::Rgba;
use std::sync::Arc;
use strata::prelude::*;

fn gradient(size: u32) -> Arc<PixelBuffer> {
    Arc::new(PixelBuffer::from_fn(size, size, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8, 255])
    }))
}

fn bench_tiled_vs_direct(c: &mut Criterion) {
    let input = gradient(512);
    let operations = [
        ("sepia", Operation::Sepia),
        ("saturation", Operation::Saturation { level: 1.4 }),
        ("box_blur_5", Operation::kernel(KernelKind::BoxBlur, 5).unwrap()),
    ];

    let mut group = c.benchmark_group("operation_512");
    for (name, operation) in &operations {
        group.bench_with_input(BenchmarkId::new("direct", name), operation, |b, op| {
            b.iter(|| op.apply_direct(black_box(&input)))
        });
        for bands in [2, 4, 8] {
            let executor = TiledExecutor::with_config(ExecutorConfig::new().with_bands(bands));
            group.bench_with_input(
                BenchmarkId::new(format!("tiled_{}", bands), name),
                operation,
                |b, op| b.iter(|| op.apply(black_box(&input), &executor).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_chain_edit(c: &mut Criterion) {
    let mut chain = LayerChain::new(gradient(256));
    chain.append(Operation::Brightness { level: 1.1 });
    chain.append(Operation::kernel(KernelKind::GaussianBlur, 5).unwrap());
    chain.append(Operation::Contrast { factor: 1.2 });
    chain.append(Operation::Sepia);

    c.bench_function("chain_toggle_last", |b| {
        b.iter(|| {
            chain.toggle(3, true).unwrap();
            chain.execute().unwrap()
        })
    });
}

criterion_group!(benches, bench_tiled_vs_direct, bench_chain_edit);
criterion_main!(benches);
