// Benchmarks for the progression search.
//
// `scale_voicings` measures the voicing enumeration alone; `run` and
// `run_from_graph` measure full searches, each with a fresh checker so the
// memo table starts empty every iteration.

use criterion::{Criterion, criterion_group, criterion_main};
use musictool_theory::SpecificChord;
use musictool_voicing::{ProgressionSearch, SearchConfig};
use std::hint::black_box;

fn config() -> SearchConfig {
    SearchConfig {
        limit: Some(1_000),
        ..SearchConfig::default()
    }
}

fn bench_voicings(c: &mut Criterion) {
    let search = ProgressionSearch::new(config()).unwrap();
    c.bench_function("scale_voicings", |b| {
        b.iter(|| black_box(search.voicings().unwrap()))
    });
}

fn bench_run(c: &mut Criterion) {
    c.bench_function("run", |b| {
        b.iter(|| {
            let search = ProgressionSearch::new(config()).unwrap();
            black_box(search.run().unwrap())
        })
    });
}

fn bench_graph(c: &mut Criterion) {
    let start: SpecificChord = "C3_E3_G3".parse().unwrap();
    let graph_config = SearchConfig {
        looped: false,
        ..config()
    };
    c.bench_function("run_from_graph", |b| {
        b.iter(|| {
            let search = ProgressionSearch::new(graph_config.clone()).unwrap();
            black_box(search.run_from_graph(&start).unwrap())
        })
    });
}

criterion_group!(benches, bench_voicings, bench_run, bench_graph);
criterion_main!(benches);
