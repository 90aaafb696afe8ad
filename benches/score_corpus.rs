use criterion::{criterion_group, criterion_main, Criterion};
use pii_anon::{
    entity_report, score_predictions, Alignment, Annotations, DivByZeroStrat, ScorerConfig,
    ScorerConfigBuilder, Span,
};
use pprof::criterion::{Output, PProfProfiler};
use rand::{rngs::StdRng, Rng, SeedableRng};

const LABELS: [&str; 5] = ["PER", "LOC", "FNR", "TLF", "EPOST"];

/// Random documents with up to 8 spans each. Predictions are the truth with shifted boundaries,
/// some spans dropped and some added.
fn build_corpus(n_docs: usize, seed: u64) -> (Vec<Annotations>, Vec<Annotations>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut truths = Vec::with_capacity(n_docs);
    let mut preds = Vec::with_capacity(n_docs);
    for _ in 0..n_docs {
        let mut truth = Vec::new();
        let mut pred = Vec::new();
        let mut cursor = 0;
        for _ in 0..rng.gen_range(0..8) {
            let start = cursor + rng.gen_range(0..5);
            let end = start + rng.gen_range(1..4);
            let label = LABELS[rng.gen_range(0..LABELS.len())];
            let span = Span::try_new(start, end, label).unwrap();
            match rng.gen_range(0..10) {
                0 => {}
                1 => pred.push(Span::try_new(start, end + 1, label).unwrap()),
                2 => pred.push(Span::try_new(end, end + 2, label).unwrap()),
                _ => pred.push(span.clone()),
            }
            truth.push(span);
            cursor = end;
        }
        truths.push(Annotations::new(truth));
        preds.push(Annotations::new(pred));
    }
    (truths, preds)
}

fn benchmark_first_pair(c: &mut Criterion) {
    let (truths, preds) = build_corpus(10_000, 7);
    let config = ScorerConfig::default();
    c.bench_function("first_pair_10k", |b| {
        b.iter(|| score_predictions(&truths, &preds, &config).unwrap())
    });
}

fn benchmark_greedy(c: &mut Criterion) {
    let (truths, preds) = build_corpus(10_000, 7);
    let config = ScorerConfigBuilder::default()
        .alignment(Alignment::Greedy)
        .build();
    c.bench_function("greedy_10k", |b| {
        b.iter(|| score_predictions(&truths, &preds, &config).unwrap())
    });
}

fn benchmark_entity_report(c: &mut Criterion) {
    let (truths, preds) = build_corpus(10_000, 7);
    c.bench_function("entity_report_10k", |b| {
        b.iter(|| entity_report(&truths, &preds, DivByZeroStrat::ReplaceBy0).unwrap())
    });
}

criterion_group!(
    name=scoring_benches;
    config = Criterion::default().sample_size(50).with_profiler(PProfProfiler::new(1000, Output::Flamegraph(None)));
    targets = benchmark_first_pair,
    benchmark_greedy,
    benchmark_entity_report
);
criterion_main!(scoring_benches);
