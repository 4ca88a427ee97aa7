//! Benchmarks for the ingest codec and the dietary trend computation
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::collections::BTreeMap;
use vitalstream::backend::{decode_batch, encode_batch, Metric};
use vitalstream::store::{build_trends, DailyNutrients};

fn create_test_metrics(count: usize) -> Vec<Metric> {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            Metric::new("heart_rate")
                .tag("source", "RingConn")
                .field("avg", 60.0 + (i % 40) as f64)
                .field("count", i as i64)
                .at(start + Duration::seconds(i as i64 * 60))
        })
        .collect()
}

fn bench_line_protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_protocol");

    for size in [100, 1000, 10000] {
        let metrics = create_test_metrics(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("encode_{}", size), |b| {
            b.iter(|| encode_batch(black_box(&metrics)).unwrap())
        });

        let body = encode_batch(&metrics).unwrap();

        group.bench_function(format!("decode_{}", size), |b| {
            b.iter(|| decode_batch(black_box(&body)).unwrap())
        });
    }

    group.finish();
}

fn bench_dietary_trends(c: &mut Criterion) {
    let mut group = c.benchmark_group("dietary");

    let first = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
    let last = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    // Priming week plus the 30-day output, with every fourth day missing
    let days: BTreeMap<NaiveDate, DailyNutrients> = (0..37)
        .filter(|i| i % 4 != 3)
        .map(|i| {
            let day = first - Duration::days(7) + Duration::days(i);
            let totals = DailyNutrients {
                calories: 1800.0 + (i * 37 % 500) as f64,
                protein: 120.0,
                carbs: 200.0,
                fat: 70.0,
            };
            (day, totals)
        })
        .collect();

    group.bench_function("build_trends_30d", |b| {
        b.iter(|| build_trends(black_box(&days), first, last))
    });

    group.finish();
}

criterion_group!(benches, bench_line_protocol, bench_dietary_trends);
criterion_main!(benches);
