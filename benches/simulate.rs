use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use serde_json::json;

use affectsim::{
    Clause, Distribution, Expression, InMemoryRegistry, LookupRegistry, SimulationConfig,
    Simulator, StateSampler,
};

fn registry() -> Arc<dyn LookupRegistry> {
    Arc::new(InMemoryRegistry::with_defaults())
}

fn simple_expression() -> Expression {
    Expression::new(
        "bench_simple",
        vec![Clause::new(json!({">=": [{"var": "moodAxes.valence"}, 0]}))],
    )
}

fn compound_expression() -> Expression {
    Expression::new(
        "bench_compound",
        vec![
            Clause::new(json!({">=": [{"var": "emotions.joy"}, 0.3]})),
            Clause::new(json!({
                "and": [
                    {"<=": [{"var": "moodAxes.threat"}, 25]},
                    {"or": [
                        {">=": [{"var": "sexualArousal"}, 0.4]},
                        {">=": [{"var": "affectTraits.affection"}, 50]}
                    ]}
                ]
            })),
            Clause::new(json!({">=": [{"var": "previousEmotions.calm"}, 0.1]})),
        ],
    )
}

fn bench_state_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate/sampling");
    group.throughput(Throughput::Elements(1));
    group.bench_function("uniform", |b| {
        let mut sampler = StateSampler::with_seed(Distribution::Uniform, 42);
        b.iter(|| sampler.generate());
    });
    group.bench_function("gaussian", |b| {
        let mut sampler = StateSampler::with_seed(Distribution::Gaussian, 42);
        b.iter(|| sampler.generate());
    });
    group.finish();
}

fn bench_simple_run(c: &mut Criterion) {
    let samples = 10_000_u64;
    let mut group = c.benchmark_group("simulate/simple");
    group.throughput(Throughput::Elements(samples));
    group.bench_function("10k_samples", |b| {
        let expression = simple_expression();
        b.iter(|| {
            Simulator::new(registry())
                .with_config(SimulationConfig {
                    sample_count: samples,
                    ..SimulationConfig::default()
                })
                .with_seed(42)
                .run(&expression)
                .unwrap()
        });
    });
    group.finish();
}

fn bench_compound_run(c: &mut Criterion) {
    let samples = 10_000_u64;
    let mut group = c.benchmark_group("simulate/compound");
    group.throughput(Throughput::Elements(samples));

    group.bench_function("tracked", |b| {
        let expression = compound_expression();
        b.iter(|| {
            Simulator::new(registry())
                .with_config(SimulationConfig {
                    sample_count: samples,
                    ..SimulationConfig::default()
                })
                .with_seed(42)
                .run(&expression)
                .unwrap()
        });
    });

    // Clause tracking off isolates the sampling and evaluation cost.
    group.bench_function("untracked", |b| {
        let expression = compound_expression();
        b.iter(|| {
            Simulator::new(registry())
                .with_config(SimulationConfig {
                    sample_count: samples,
                    track_clauses: false,
                    ..SimulationConfig::default()
                })
                .with_seed(42)
                .run(&expression)
                .unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_state_sampling,
    bench_simple_run,
    bench_compound_run
);
criterion_main!(benches);
