use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use sysmon::system::collector::Collector;
use sysmon::system::process::{ProcessSample, parse_stat_ticks};
use sysmon::system::procfs::MockProcFs;
use sysmon::system::ranking::top_n;
use sysmon::system::snapshot::Snapshot;

fn make_samples(n: usize) -> Vec<ProcessSample> {
    (0..n)
        .map(|i| {
            let pid = i as u32 + 1;
            ProcessSample::new(
                pid,
                format!("proc_{i}"),
                (i as u64 * 7919) % 100_000,
                (i as u64 * 104_729) % 50_000,
            )
        })
        .collect()
}

fn make_registry(n: usize) -> MockProcFs {
    (0..n).fold(MockProcFs::new(), |fs, i| {
        fs.with_process(i as u32 + 1, &format!("proc {i}"), i as u64 * 3, i as u64)
    })
}

fn bench_parse_stat(c: &mut Criterion) {
    let records = [
        "4018 (firefox) S 2190 2189 2189 0 -1 4194560 19293188 3117638 1823 557 51361 15728 5390 2925 20 0 187 0 16400 5144358912 184775",
        "77 (Web Content (x) 2) R 1 77 77 0 -1 0 0 0 0 0 900 100 0 0 20 0",
    ];
    c.bench_function("parse_stat_ticks", |b| {
        b.iter(|| {
            for record in &records {
                black_box(parse_stat_ticks(black_box(record)));
            }
        })
    });
}

fn bench_top_n(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_n_500_1000_2000");

    for size in [500usize, 1000, 2000] {
        let samples = make_samples(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &samples, |b, samples| {
            b.iter(|| {
                let ranked = top_n(Snapshot::from(black_box(samples.clone())), 10);
                black_box(ranked);
            })
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_500_1000_2000");

    for size in [500usize, 1000, 2000] {
        let collector = Collector::new(make_registry(size));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &collector,
            |b, collector| {
                b.iter(|| {
                    let snapshot = collector.snapshot(None);
                    black_box(snapshot.ok());
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse_stat, bench_top_n, bench_snapshot);
criterion_main!(benches);
