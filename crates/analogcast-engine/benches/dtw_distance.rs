// SPDX-License-Identifier: Apache-2.0

use analogcast_engine::{retrieve, window, Archive, Dtw, RetrievalQuery, SeriesStore, TimeSeries};
use analogcast_model::{EntityId, Month};
use analogcast_policies::NormalizationMode;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn wave(len: usize, phase: f64) -> Vec<f64> {
    (0..len)
        .map(|i| 50.0 + 40.0 * ((i as f64) * 0.37 + phase).sin())
        .collect()
}

fn bench_dtw(c: &mut Criterion) {
    let a = wave(24, 0.0);
    let b = wave(24, 0.8);
    c.bench_function("dtw_unconstrained_24", |bench| {
        bench.iter(|| Dtw::default().distance(black_box(&a), black_box(&b)).expect("dtw"))
    });
    c.bench_function("dtw_band3_24", |bench| {
        bench.iter(|| Dtw::new(Some(3)).distance(black_box(&a), black_box(&b)).expect("dtw"))
    });
}

fn bench_retrieve(c: &mut Criterion) {
    let start = Month::parse("2000-01").expect("month");
    let mut store = SeriesStore::new();
    for i in 0..200 {
        let id = EntityId::parse(&format!("E{i:03}")).expect("id");
        store
            .insert(TimeSeries::new(id, start, wave(240, f64::from(i) * 0.1)).expect("series"))
            .expect("insert");
    }
    let archive = Archive::build(&store, 6, NormalizationMode::MinMax).expect("archive");
    let series = store
        .get(&EntityId::parse("E000").expect("id"))
        .expect("series");
    let target = window(series, series.end(), 6, NormalizationMode::MinMax).expect("target");
    let query = RetrievalQuery {
        k: 8,
        exclude_self: true,
        horizon_count: 6,
        require_continuation: true,
    };
    c.bench_function("retrieve_top8_200x240", |bench| {
        bench.iter(|| {
            retrieve(&store, &archive, black_box(&target), &query, &Dtw::default()).expect("retrieve")
        })
    });
}

criterion_group!(benches, bench_dtw, bench_retrieve);
criterion_main!(benches);
