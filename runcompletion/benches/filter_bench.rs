//! Benchmarks for artifact filter parsing and evaluation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use runcompletion::filter::Filter;
use serde_json::json;

const EXPRESSION: &str =
    r#"pushed == 1 and (metrics.accuracy >= 0.9 or "prod" in tags) and not name matches "^tmp-""#;

fn filter_benchmark(c: &mut Criterion) {
    c.bench_function("parse", |b| {
        b.iter(|| Filter::parse(black_box(EXPRESSION)))
    });

    let filter = Filter::parse(EXPRESSION).expect("benchmark filter parses");
    let properties = json!({
        "name": "model-7",
        "pushed": 1,
        "metrics": {"accuracy": 0.93},
        "tags": ["prod", "nightly"],
    });
    let properties = properties.as_object().cloned().unwrap_or_default();

    c.bench_function("matches", |b| {
        b.iter(|| filter.matches(black_box(&properties)))
    });
}

criterion_group!(benches, filter_benchmark);
criterion_main!(benches);
