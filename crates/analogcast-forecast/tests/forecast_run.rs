// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

use analogcast_core::canonical::stable_json_pretty_bytes;
use analogcast_forecast::{run_forecast, run_forecast_with_events, ForecastOptions, ForecastStage};
use analogcast_model::{
    Band, EntityId, ForecastSnapshot, HorizonKey, MinMaxDocument, Month, OmissionReason,
    RunManifest, ScenariosDocument,
};
use analogcast_policies::{ForecastConfig, NormalizationMode};

const MOTIF: [f64; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

fn column(prefix: f64, motif: &[f64], next: f64, tail: f64) -> Vec<f64> {
    let mut values = vec![prefix; 4];
    values.extend_from_slice(motif);
    values.push(next);
    values.extend(std::iter::repeat(tail).take(13));
    values
}

/// Three 24-month archive entities and a target `T` whose last six months
/// repeat `A`'s shape exactly and `B`'s up to one unit.
fn history_csv() -> String {
    let a = column(50.0, &MOTIF, 100.0, 50.0);
    let b = column(200.0, &[1.0, 2.0, 3.0, 4.0, 5.0, 7.0], 50.0, 200.0);
    let c: Vec<f64> = (0..24)
        .map(|i| if i % 2 == 0 { 1000.0 } else { 1300.0 })
        .collect();
    let mut t = vec![500.0; 18];
    t.extend_from_slice(&MOTIF);
    let mut out = String::from("# fixture\ndate,A,B,C,T\n");
    let start = Month::parse("2020-01").expect("month");
    for i in 0..24 {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            start.add_months(i as i32).iso_date(),
            a[i],
            b[i],
            c[i],
            t[i]
        ));
    }
    out
}

fn config() -> ForecastConfig {
    ForecastConfig {
        window_length: 6,
        k: 2,
        horizon_count: 3,
        reported_horizons: vec![1, 3],
        normalization: NormalizationMode::None,
        ..ForecastConfig::default()
    }
}

fn options(dir: &Path) -> ForecastOptions {
    let history = dir.join("history.csv");
    fs::write(&history, history_csv()).expect("write history");
    ForecastOptions {
        history_path: history,
        output_root: dir.join("site"),
        config: config(),
        ..ForecastOptions::default()
    }
}

fn id(s: &str) -> EntityId {
    EntityId::parse(s).expect("id")
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("read dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

#[test]
fn target_forecast_comes_from_its_two_nearest_analogs() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let result = run_forecast(&options(tmp.path())).expect("forecast");
    assert_eq!(result.period, Month::parse("2021-12").expect("month"));
    assert!(result.latest_moved);

    let t = result.snapshot.entity(&id("T")).expect("T forecast");
    let h1 = t.horizons[&HorizonKey::new(1).expect("key")];
    assert_eq!((h1.p10, h1.p50, h1.p90), (50.0, 75.0, 100.0));
    let h3 = t.horizons[&HorizonKey::new(3).expect("key")];
    assert_eq!(h3.p50, 125.0);
    assert_eq!(t.index, 62.7);
    assert_eq!(t.band, Band::Medium);
    assert_eq!(t.confidence, 0.603);
    assert_eq!(t.delta_mom, 0.0);
    let notes: Vec<&str> = t.drivers.iter().filter_map(|d| d.note.as_deref()).collect();
    assert_eq!(
        notes,
        vec![
            "A 2020-05..2020-10 (dtw 0.000)",
            "B 2020-05..2020-10 (dtw 1.000)"
        ]
    );
    assert!(t.drivers.iter().all(|d| d.impact == 0.5));
}

#[test]
fn default_normalization_still_reports_realized_next_month_values() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut opts = options(tmp.path());
    opts.config.normalization = ForecastConfig::default().normalization;
    let result = run_forecast(&opts).expect("forecast");

    let t = result.snapshot.entity(&id("T")).expect("T forecast");
    let sources: Vec<&str> = t
        .drivers
        .iter()
        .filter_map(|d| d.note.as_deref())
        .map(|note| &note[..1])
        .collect();
    assert_eq!(sources, vec!["A", "B"]);
    // A is followed by 100 and B by 50; shape-only matching leaves them as is.
    let h1 = t.horizons[&HorizonKey::new(1).expect("key")];
    assert_eq!((h1.p10, h1.p50, h1.p90), (50.0, 75.0, 100.0));
}

#[test]
fn publish_writes_every_artifact_and_no_temporaries() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let opts = options(tmp.path());
    let (result, events) = run_forecast_with_events(&opts).expect("forecast");
    let site = &opts.output_root;

    for rel in [
        "content/forecasts/2021-12.json",
        "content/forecasts/csv/2021-12.csv",
        "content/forecasts/manifests/2021-12.json",
        "content/forecasts/latest.json",
        "content/forecasts/LATEST",
        "public/data/matches.json",
        "public/data/scenarios.json",
        "public/data/minmax.json",
        "public/data/hist.csv",
    ] {
        assert!(site.join(rel).is_file(), "missing {rel}");
    }
    assert!(!site.join("public/data/grid").exists());
    let leftovers: Vec<PathBuf> = files_under(site)
        .into_iter()
        .filter(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            name.ends_with(".tmp") || name == ".publish.lock"
        })
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
    assert_eq!(
        fs::read_to_string(site.join("content/forecasts/LATEST")).expect("marker"),
        "2021-12\n"
    );
    assert_eq!(
        fs::read(site.join("content/forecasts/latest.json")).expect("latest"),
        fs::read(&result.snapshot_path).expect("snapshot")
    );

    let manifest: RunManifest =
        serde_json::from_slice(&fs::read(&result.manifest_path).expect("manifest")).expect("parse");
    assert_eq!(manifest, result.manifest);
    for (rel, sha) in &manifest.artifacts {
        let bytes = fs::read(site.join(rel)).expect("artifact");
        assert_eq!(&analogcast_core::sha256_hex(&bytes), sha, "{rel}");
    }
    assert_eq!(manifest.entity_count + manifest.omitted_count, 4);

    let stages: Vec<&ForecastStage> = events.iter().map(|e| &e.stage).collect();
    assert_eq!(stages.first(), Some(&&ForecastStage::Prepare));
    assert_eq!(stages.last(), Some(&&ForecastStage::Finalize));
    assert!(events.iter().any(|e| e.name == "forecast.publish.complete"));
}

#[test]
fn snapshot_round_trips_losslessly() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let result = run_forecast(&options(tmp.path())).expect("forecast");
    let bytes = fs::read(&result.snapshot_path).expect("snapshot");
    let parsed: ForecastSnapshot = serde_json::from_slice(&bytes).expect("parse");
    parsed.validate_strict().expect("valid");
    assert_eq!(parsed, result.snapshot);
    assert_eq!(stable_json_pretty_bytes(&parsed).expect("encode"), bytes);
}

#[test]
fn scenarios_denormalize_back_to_forecast_units() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let opts = options(tmp.path());
    let result = run_forecast(&opts).expect("forecast");
    let site = &opts.output_root;
    let scenarios: ScenariosDocument = serde_json::from_slice(
        &fs::read(site.join("public/data/scenarios.json")).expect("scenarios"),
    )
    .expect("parse scenarios");
    let minmax: MinMaxDocument =
        serde_json::from_slice(&fs::read(site.join("public/data/minmax.json")).expect("minmax"))
            .expect("parse minmax");
    let t = &scenarios["T"];
    assert_eq!(t.origin, result.period);
    assert_eq!(t.temporal.index, ["2022-01-01", "2022-02-01", "2022-03-01"]);
    assert_eq!(t.clusters.len(), 2);
    let scale = minmax["T"];
    assert_eq!((scale.min, scale.max), (1.0, 6.0));
    let p50 = scale.denormalize(t.temporal.p50[0].expect("h1 p50"));
    assert!((p50 - 75.0).abs() < 1e-6, "{p50}");
    assert_eq!(t.exceedance["25"][0], Some(1.0));
    assert_eq!(t.intervals["0.8"].lower.len(), 3);

    let hist = fs::read_to_string(site.join("public/data/hist.csv")).expect("hist");
    let mut lines = hist.lines();
    assert_eq!(lines.next(), Some("date,A,B,C,T"));
    assert_eq!(hist.lines().count(), 25);
}

#[test]
fn grid_entities_get_point_files() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let entities = tmp.path().join("entities.json");
    fs::write(
        &entities,
        r#"[
  {"id": "T", "name": "Target cell", "entityType": "grid", "lat": 10.5, "lon": -3.25},
  {"id": "A", "name": "Alpha", "entityType": "country", "iso3": "AAA"}
]"#,
    )
    .expect("write entities");
    let opts = ForecastOptions {
        entities_path: Some(entities),
        ..options(tmp.path())
    };
    let result = run_forecast(&opts).expect("forecast");
    let grid = opts.output_root.join("public/data/grid");
    for h in 1..=3 {
        assert!(grid.join(format!("2021-12-m{h}.json")).is_file());
        assert!(grid.join(format!("2021-12-m{h}.csv")).is_file());
    }
    assert!(!grid.join("2021-12-m4.json").exists());
    let csv = fs::read_to_string(grid.join("2021-12-m1.csv")).expect("grid csv");
    assert_eq!(csv, "id,lat,lon,v\nT,10.5,-3.25,75\n");
    let geo: serde_json::Value =
        serde_json::from_slice(&fs::read(grid.join("2021-12.geo.json")).expect("geojson"))
            .expect("parse geojson");
    assert_eq!(geo["type"], "FeatureCollection");
    assert_eq!(geo["features"][0]["geometry"]["coordinates"][0], -3.25);
    assert_eq!(geo["features"][0]["properties"]["m3"], 125.0);

    let t = result.snapshot.entity(&id("T")).expect("T");
    assert_eq!(t.name, "Target cell");
    let a = result.snapshot.entity(&id("A"));
    if let Some(a) = a {
        assert_eq!(a.iso3.as_deref(), Some("AAA"));
    }
    let matches: serde_json::Value = serde_json::from_slice(
        &fs::read(opts.output_root.join("public/data/matches.json")).expect("matches"),
    )
    .expect("parse matches");
    assert!(matches.get("Target cell").is_some());
}

#[test]
fn published_periods_are_immutable_unless_overwritten() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let opts = options(tmp.path());
    let first = run_forecast(&opts).expect("first run");
    let before = fs::read(&first.snapshot_path).expect("snapshot");

    let err = run_forecast(&opts).expect_err("second run conflicts");
    assert_eq!(err.code, analogcast_core::ErrorCode::Conflict);

    let again = run_forecast(&ForecastOptions {
        overwrite: true,
        ..opts.clone()
    })
    .expect("overwrite");
    assert_eq!(fs::read(&again.snapshot_path).expect("snapshot"), before);
}

#[test]
fn deltas_and_latest_follow_publication_order() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let opts = options(tmp.path());
    let november = Month::parse("2021-11").expect("month");
    let earlier = run_forecast(&ForecastOptions {
        period: Some(november),
        ..opts.clone()
    })
    .expect("november");
    assert!(earlier.latest_moved);

    let december = run_forecast(&opts).expect("december");
    assert!(december.latest_moved);
    for e in &december.snapshot.entities {
        let expected = earlier
            .snapshot
            .entity(&e.id)
            .map_or(0.0, |prior| analogcast_engine::round_to(e.index - prior.index, 1));
        assert_eq!(e.delta_mom, expected, "{}", e.id);
        assert_eq!(e.delta_yoy, 0.0);
    }

    let october = run_forecast(&ForecastOptions {
        period: Some(Month::parse("2021-10").expect("month")),
        ..opts.clone()
    })
    .expect("october");
    assert!(!october.latest_moved);
    assert_eq!(
        fs::read_to_string(opts.output_root.join("content/forecasts/LATEST")).expect("marker"),
        "2021-12\n"
    );
}

#[test]
fn short_entities_are_omitted_not_fatal() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let csv = history_csv().replace("date,A,B,C,T", "date,A,B,C,T,S");
    let mut lines: Vec<String> = csv.lines().map(ToString::to_string).collect();
    let last = lines.len() - 1;
    for (i, line) in lines.iter_mut().enumerate().skip(2) {
        line.push(',');
        if i >= last - 2 {
            line.push('7');
        }
    }
    let history = tmp.path().join("history-with-short.csv");
    fs::write(&history, lines.join("\n")).expect("write");
    let result = run_forecast(&ForecastOptions {
        history_path: history,
        ..options(tmp.path())
    })
    .expect("forecast");
    let omission = result
        .snapshot
        .omitted
        .iter()
        .find(|o| o.id == id("S"))
        .expect("S omitted");
    assert_eq!(omission.reason, OmissionReason::InsufficientHistory);
    assert!(result.snapshot.entity(&id("T")).is_some());
}
