// SPDX-License-Identifier: Apache-2.0

use analogcast_policies::{
    canonical_config_json, load_config_from_path, load_effective_config, validate_forecast_config,
    ConfigSource, ForecastConfig, NormalizationMode, PartialHorizonPolicy, WeightingPolicy,
    WORKSPACE_CONFIG_PATH,
};

#[test]
fn partial_document_inherits_defaults() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"k": 2, "horizon_count": 3, "reported_horizons": [1, 3], "weighting": "inverse_distance", "normalization": "zscore"}"#,
    )
    .expect("write");
    let cfg = load_config_from_path(&path).expect("config");
    assert_eq!(cfg.k, 2);
    assert_eq!(cfg.horizon_count, 3);
    assert_eq!(cfg.weighting, WeightingPolicy::InverseDistance);
    assert_eq!(cfg.normalization, NormalizationMode::ZScore);
    assert_eq!(cfg.partial_horizons, PartialHorizonPolicy::Renormalize);
    assert_eq!(cfg.window_length, 6);
    assert_eq!(cfg.dtw_band, None);
}

#[test]
fn unknown_fields_and_schema_versions_are_rejected() {
    assert!(serde_json::from_str::<ForecastConfig>(r#"{"kk": 3}"#).is_err());
    assert!(serde_json::from_str::<ForecastConfig>(r#"{"schema_version": "2"}"#).is_err());
    assert!(serde_json::from_str::<ForecastConfig>(r#"{"weighting": "softmax"}"#).is_err());
}

#[test]
fn validation_table() {
    let cases: Vec<(&str, Box<dyn Fn(&mut ForecastConfig)>)> = vec![
        ("window_length", Box::new(|c| c.window_length = 1)),
        ("k zero", Box::new(|c| c.k = 0)),
        ("k large", Box::new(|c| c.k = 257)),
        ("horizon zero", Box::new(|c| c.horizon_count = 0)),
        ("horizon large", Box::new(|c| c.horizon_count = 25)),
        ("reported missing 1", Box::new(|c| c.reported_horizons = vec![3, 6])),
        ("reported unsorted", Box::new(|c| c.reported_horizons = vec![1, 6, 3])),
        ("reported beyond H", Box::new(|c| c.reported_horizons = vec![1, 12])),
        ("reported empty", Box::new(|c| c.reported_horizons = Vec::new())),
        ("index cap", Box::new(|c| c.index_cap = 0.0)),
        ("bands", Box::new(|c| c.band_thresholds = [66.0, 33.0])),
        ("band edge", Box::new(|c| c.band_thresholds = [0.0, 66.0])),
        ("interval", Box::new(|c| c.intervals = vec![1.0])),
        ("exceedance", Box::new(|c| c.exceedance_thresholds = vec![-1.0])),
        ("exported", Box::new(|c| c.max_exported_matches = 0)),
    ];
    for (name, mutate) in cases {
        let mut cfg = ForecastConfig::default();
        mutate(&mut cfg);
        assert!(validate_forecast_config(&cfg).is_err(), "{name} should be rejected");
    }
}

#[test]
fn explicit_path_wins_and_must_exist() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let missing = tmp.path().join("missing.json");
    assert!(load_effective_config(Some(&missing), tmp.path()).is_err());

    let path = tmp.path().join("cfg.json");
    std::fs::write(&path, r#"{"k": 3}"#).expect("write");
    let (cfg, source) = load_effective_config(Some(&path), tmp.path()).expect("config");
    assert_eq!(cfg.k, 3);
    assert_eq!(source, ConfigSource::Flag(path));
}

#[test]
fn workspace_file_is_used_when_present() {
    if std::env::var_os(analogcast_core::ENV_CONFIG).is_some() {
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join(WORKSPACE_CONFIG_PATH);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(&path, r#"{"window_length": 4}"#).expect("write");
    let (cfg, source) = load_effective_config(None, tmp.path()).expect("config");
    assert_eq!(cfg.window_length, 4);
    assert_eq!(source.label(), "workspace");
}

#[test]
fn canonical_json_is_key_sorted() {
    let json = canonical_config_json(&ForecastConfig::default()).expect("json");
    let band = json.find("\"band_thresholds\"").expect("band");
    let window = json.find("\"window_length\"").expect("window");
    assert!(band < window);
    assert!(json.contains("\"normalization\":\"minmax\""));
}
