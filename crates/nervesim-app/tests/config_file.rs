use std::io::Write;

use nervesim_app::load_config;
use nervesim_core::SimConfig;

#[test]
fn partial_config_file_fills_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "dt": 0.005, "initial_food_count": 8, "rng_seed": 42 }}"#).expect("write");

    let config = load_config(file.path()).expect("loads");
    assert_eq!(config.dt, 0.005);
    assert_eq!(config.initial_food_count, 8);
    assert_eq!(config.rng_seed, Some(42));
    assert_eq!(config.bounce_magnitude, SimConfig::default().bounce_magnitude);
}

#[test]
fn invalid_values_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "history_capacity": 0 }}"#).expect("write");
    let err = load_config(file.path()).expect_err("rejected");
    assert!(format!("{err:#}").contains("history_capacity"));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.json");
    let err = load_config(&path).expect_err("missing");
    assert!(err.to_string().contains("absent.json"));
}
