use std::io::Write;
use std::time::Duration;
use tempo_governor::{ConfigError, GovernorConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_full_config() {
    let file = write_config(
        r#"
min_interval_secs = 30
max_interval_secs = 900.5
backoff_factor = 2.0
"#,
    );

    let config = GovernorConfig::load(file.path()).unwrap();
    assert_eq!(config.min_interval, Duration::from_secs(30));
    assert_eq!(config.max_interval, Duration::from_millis(900_500));
    assert!((config.backoff_factor - 2.0).abs() < f64::EPSILON);
}

#[test]
fn load_empty_config_uses_defaults() {
    let file = write_config("");
    assert_eq!(GovernorConfig::load(file.path()).unwrap(), GovernorConfig::default());
}

#[test]
fn load_rejects_invalid_values() {
    let file = write_config("min_interval_secs = 120\nmax_interval_secs = 60\n");
    let err = GovernorConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MaxBelowMin { .. }));
    assert!(err.is_invalid_value());
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GovernorConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn config_round_trips_through_toml() {
    let config = GovernorConfig::new()
        .with_min_interval(Duration::from_millis(2500))
        .with_backoff_factor(1.25);
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("min_interval_secs = 2.5"));
    assert_eq!(GovernorConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn example_config_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/governor.example.toml");
    assert_eq!(GovernorConfig::load(path).unwrap(), GovernorConfig::default());
}
