// SPDX-License-Identifier: Apache-2.0

use analogcast_core::canonical::{stable_json_bytes, stable_json_hash_hex};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn bench_canonical_hash(c: &mut Criterion) {
    let entities: Vec<_> = (0..200)
        .map(|i| {
            json!({
                "id": format!("E{i:03}"),
                "horizons": {"6m": {"p90": 12.0, "p10": 0.0}, "1m": {"p50": 3.5}},
                "index": i as f64 / 2.0,
            })
        })
        .collect();
    let payload = json!({"period": "2024-06", "entities": entities});

    c.bench_function("stable_json_bytes_snapshot", |b| {
        b.iter(|| stable_json_bytes(black_box(&payload)).expect("bytes"))
    });
    c.bench_function("stable_json_hash_snapshot", |b| {
        b.iter(|| stable_json_hash_hex(black_box(&payload)).expect("hash"))
    });
}

criterion_group!(benches, bench_canonical_hash);
criterion_main!(benches);
