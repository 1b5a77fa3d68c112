//! Benchmarks for dataset search and reverse lookup.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use portmatch_geo::Coordinate;
use portmatch_ports::DatasetIndex;

fn bench_dataset_search(c: &mut Criterion) {
    let index = DatasetIndex::builtin().expect("bundled datasets decode");

    let mut group = c.benchmark_group("dataset_search");
    for query in ["Juneau", "Port of Seattle", "Cozuml", "History of the Port of Tianjin"] {
        group.bench_function(query, |b| b.iter(|| index.search(black_box(query), 5)));
    }
    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let index = DatasetIndex::builtin().expect("bundled datasets decode");
    let juneau = Coordinate::new(58.2986, -134.4070);

    c.bench_function("nearest", |b| b.iter(|| index.nearest(black_box(&juneau), 3)));
}

criterion_group!(benches, bench_dataset_search, bench_nearest);
criterion_main!(benches);
