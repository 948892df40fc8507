//! Advisor benchmarks with confidence intervals.
//!
//! Measures the three hot paths at realistic observation counts: GP fit,
//! suggestion assembly, and prediction-curve extraction.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use indexmap::IndexMap;

use brewopt::model::{GaussianProcess, RbfKernel};
use brewopt::prelude::*;

fn advisor_with_observations(n: u32) -> BrewAdvisor {
    let machine = MachineSchema {
        id: "m1".into(),
        name: "Bench machine".into(),
        parameters: vec![
            ParameterSchema {
                id: "g".into(),
                name: "Grind".into(),
                spec: ParamSpec::Bounded {
                    min: 0.0,
                    max: 10.0,
                    step: 0.1,
                    default: None,
                },
            },
            ParameterSchema {
                id: "t".into(),
                name: "Temperature".into(),
                spec: ParamSpec::Unbounded { default: None },
            },
        ],
    };
    let mut catalog = InMemoryCatalog::new();
    catalog.insert(machine);

    let mut advisor = BrewAdvisor::new(
        Box::new(MemoryStore::new()),
        Box::new(catalog),
        Box::new(InMemoryRunHistory::new()),
        BrewRng::new(42),
        Box::new(ManualClock::at(0)),
    );

    for i in 0..n {
        let mut values = IndexMap::new();
        values.insert(
            "g".to_string(),
            ParamValue::Bounded(f64::from(i % 100) / 10.0),
        );
        values.insert(
            "t".to_string(),
            ParamValue::Unbounded(88.0 + f64::from(i % 7)),
        );
        let run = RunRecord {
            id: format!("r{i}"),
            bean_id: "b1".into(),
            machine_id: "m1".into(),
            values,
            rating: Some((i % 10 + 1) as u8),
        };
        advisor
            .update_with_run("b1", "m1", &run)
            .unwrap_or_else(|e| panic!("bench setup failed: {e}"));
    }
    advisor
}

fn bench_gp_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("gp_fit");
    group.sample_size(100);
    group.confidence_level(0.95);

    for n in [10usize, 50, 100] {
        let x: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64 / n as f64, (i * 7 % n) as f64 / n as f64])
            .collect();
        let y: Vec<f64> = (0..n).map(|i| (i % 10) as f64 / 9.0).collect();

        group.bench_with_input(BenchmarkId::new("fit", n), &n, |b, _| {
            b.iter(|| {
                let mut gp = GaussianProcess::new(RbfKernel::new(0.3, 1.0), 0.1);
                gp.fit(black_box(x.clone()), black_box(y.clone()))
                    .unwrap_or_else(|e| panic!("fit failed: {e}"));
                black_box(gp.n_observations())
            });
        });
    }

    group.finish();
}

fn bench_suggest(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggest");
    group.sample_size(50);
    group.confidence_level(0.95);

    for n in [10u32, 50, 100] {
        let mut advisor = advisor_with_observations(n);
        group.bench_with_input(BenchmarkId::new("suggest_parameters", n), &n, |b, _| {
            b.iter(|| black_box(advisor.suggest_parameters("b1", "m1")));
        });
    }

    group.finish();
}

fn bench_prediction_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction_curve");
    group.sample_size(50);
    group.confidence_level(0.95);

    for n in [10u32, 50, 100] {
        let mut advisor = advisor_with_observations(n);
        group.bench_with_input(BenchmarkId::new("curve_50_points", n), &n, |b, _| {
            b.iter(|| {
                black_box(advisor.prediction_curve("b1", "m1", 0, &CurveOptions::default()))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gp_fit, bench_suggest, bench_prediction_curve);
criterion_main!(benches);
