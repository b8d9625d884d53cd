use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use groove_db::{PageRequest, plan};
use groove_view::SortDirection;
use serde_json::{Value, json};

fn stamp(day: u64) -> Value {
    json!([2013, 5, day, 10, 0, 0, 0])
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner");

    let unbounded = PageRequest {
        scope: json!("u1"),
        cursor: None,
        range_start: None,
        range_end: None,
        direction: SortDirection::Asc,
        limit: Some(50),
    };
    group.bench_function("asc_unbounded", |b| b.iter(|| plan(black_box(&unbounded))));

    let resumed = PageRequest {
        scope: json!("u1"),
        cursor: Some(stamp(2)),
        range_start: Some(stamp(1)),
        range_end: Some(stamp(28)),
        direction: SortDirection::Desc,
        limit: Some(50),
    };
    group.bench_function("desc_resumed", |b| b.iter(|| plan(black_box(&resumed))));

    group.bench_function("desc_resumed_build", |b| {
        b.iter(|| plan(black_box(&resumed)).build())
    });

    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
