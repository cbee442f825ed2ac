// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

use analogcast_core::ErrorCode;
use analogcast_forecast::{run_forecast, ForecastOptions, TimestampPolicy};
use analogcast_model::Month;
use analogcast_policies::{ForecastConfig, NormalizationMode};

fn fixture(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write fixture");
    path
}

/// A ramp and a saw-tooth over 18 months, enough for a 4-month window.
fn history() -> String {
    let start = Month::parse("2022-01").expect("month");
    let mut out = String::from("date,RAMP,SAW\n");
    for i in 0..18 {
        out.push_str(&format!(
            "{},{},{}\n",
            start.add_months(i),
            i * 3,
            if i % 3 == 0 { 9 } else { 1 }
        ));
    }
    out
}

fn options(dir: &Path, history_body: &str) -> ForecastOptions {
    ForecastOptions {
        history_path: fixture(dir, "history.csv", history_body),
        output_root: dir.join("site"),
        config: ForecastConfig {
            window_length: 4,
            k: 3,
            horizon_count: 2,
            reported_horizons: vec![1, 2],
            normalization: NormalizationMode::ZScore,
            ..ForecastConfig::default()
        },
        ..ForecastOptions::default()
    }
}

#[test]
fn invalid_config_aborts_before_any_write() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut opts = options(tmp.path(), &history());
    opts.config.reported_horizons = vec![2];
    let err = run_forecast(&opts).expect_err("config must contain 1m");
    assert_eq!(err.code, ErrorCode::InvalidConfig);
    assert!(!opts.output_root.exists());
}

#[test]
fn history_gaps_abort_before_any_write() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let body = history().replace("2022-05,12,1", "2022-05,,1");
    let opts = options(tmp.path(), &body);
    let err = run_forecast(&opts).expect_err("interior blank");
    assert_eq!(err.code, ErrorCode::MissingMonth);
    assert!(err.message.contains("RAMP"), "{err}");
    assert!(!opts.output_root.exists());
}

#[test]
fn negative_and_non_numeric_values_are_rejected() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let negative = history().replace("2022-05,12,1", "2022-05,-12,1");
    let err = run_forecast(&options(tmp.path(), &negative)).expect_err("negative");
    assert_eq!(err.code, ErrorCode::InvalidSeriesValue);
    let text = history().replace("2022-05,12,1", "2022-05,twelve,1");
    let err = run_forecast(&options(tmp.path(), &text)).expect_err("text");
    assert_eq!(err.code, ErrorCode::InvalidSeriesValue);
}

#[test]
fn malformed_header_and_ragged_rows_are_invalid_input() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let no_date = history().replace("date,RAMP,SAW", "month,RAMP,SAW");
    let err = run_forecast(&options(tmp.path(), &no_date)).expect_err("header");
    assert_eq!(err.code, ErrorCode::InvalidInput);
    let ragged = history().replace("2022-05,12,1", "2022-05,12");
    let err = run_forecast(&options(tmp.path(), &ragged)).expect_err("ragged");
    assert_eq!(err.code, ErrorCode::InvalidInput);
    let duplicate = history().replace("date,RAMP,SAW", "date,RAMP,RAMP");
    let err = run_forecast(&options(tmp.path(), &duplicate)).expect_err("duplicate");
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[test]
fn missing_inputs_are_not_found() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut opts = options(tmp.path(), &history());
    opts.history_path = tmp.path().join("absent.csv");
    assert_eq!(run_forecast(&opts).expect_err("absent").code, ErrorCode::NotFound);

    let mut opts = options(tmp.path(), &history());
    opts.entities_path = Some(tmp.path().join("absent.json"));
    assert_eq!(run_forecast(&opts).expect_err("absent").code, ErrorCode::NotFound);
}

#[test]
fn period_after_history_is_out_of_range() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut opts = options(tmp.path(), &history());
    opts.period = Some(Month::parse("2030-01").expect("month"));
    assert_eq!(run_forecast(&opts).expect_err("late").code, ErrorCode::OutOfRange);
}

#[test]
fn zero_threads_and_bad_timestamps_are_usage_errors() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut opts = options(tmp.path(), &history());
    opts.max_threads = Some(0);
    assert_eq!(run_forecast(&opts).expect_err("threads").code, ErrorCode::UsageError);

    let mut opts = options(tmp.path(), &history());
    opts.timestamp_policy = TimestampPolicy::Fixed("last tuesday".to_string());
    assert_eq!(run_forecast(&opts).expect_err("timestamp").code, ErrorCode::UsageError);
}

#[test]
fn thread_count_does_not_change_output_bytes() {
    let one = tempfile::tempdir().expect("tempdir");
    let many = tempfile::tempdir().expect("tempdir");
    let mut single = options(one.path(), &history());
    single.max_threads = Some(1);
    let mut parallel = options(many.path(), &history());
    parallel.max_threads = Some(4);
    let a = run_forecast(&single).expect("single");
    let b = run_forecast(&parallel).expect("parallel");
    assert_eq!(a.manifest.artifacts, b.manifest.artifacts);
    assert_eq!(
        fs::read(&a.snapshot_path).expect("a"),
        fs::read(&b.snapshot_path).expect("b")
    );
}
