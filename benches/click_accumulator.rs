//! ClickAccumulator 性能基准测试

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use snaplink::clicks::ClickAccumulator;
use snaplink::storage::{LinkStore, MemoryStorage};
use std::sync::Arc;
use tokio::time::Duration;

fn create_accumulator() -> ClickAccumulator {
    ClickAccumulator::new(
        Arc::new(MemoryStorage::new()) as Arc<dyn LinkStore>,
        Duration::from_secs(3600), // 长间隔，避免定时刷盘
        u64::MAX,                  // 高阈值，避免阈值刷盘
        Duration::from_secs(60),
    )
}

/// 单线程 record_click 吞吐量
fn bench_record_single_key(c: &mut Criterion) {
    let accumulator = create_accumulator();

    c.bench_function("record_click/single_key", |b| {
        b.iter(|| {
            accumulator.record_click("hot_code");
        });
    });
}

/// 单线程轮询 1000 个不同短码
fn bench_record_different_keys(c: &mut Criterion) {
    let accumulator = create_accumulator();
    let codes: Vec<String> = (0..1000).map(|i| format!("code_{}", i)).collect();
    let mut idx = 0;

    c.bench_function("record_click/different_keys", |b| {
        b.iter(|| {
            accumulator.record_click(&codes[idx % codes.len()]);
            idx += 1;
        });
    });
}

/// 多任务并发 record_click
fn bench_concurrent_record(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("record_click/concurrent");

    for num_tasks in [2, 4, 8, 16] {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(
            BenchmarkId::new("tasks", num_tasks),
            &num_tasks,
            |b, &num_tasks| {
                b.to_async(&rt).iter(|| async {
                    let accumulator = Arc::new(create_accumulator());
                    let mut handles = vec![];

                    for _ in 0..num_tasks {
                        let acc = Arc::clone(&accumulator);
                        handles.push(tokio::spawn(async move {
                            for _ in 0..1000 / num_tasks {
                                acc.record_click("shared_code");
                            }
                        }));
                    }

                    for handle in handles {
                        handle.await.unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// 预填充后 flush（合并到内存存储）
fn bench_flush(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("flush");

    for num_codes in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(num_codes as u64));
        group.bench_with_input(
            BenchmarkId::new("codes", num_codes),
            &num_codes,
            |b, &num_codes| {
                b.iter_batched(
                    || {
                        let accumulator = create_accumulator();
                        for i in 0..num_codes {
                            accumulator.record_click(&format!("code_{}", i));
                        }
                        accumulator
                    },
                    |accumulator| rt.block_on(accumulator.flush()),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_record_single_key,
    bench_record_different_keys,
    bench_concurrent_record,
    bench_flush,
);
criterion_main!(benches);
