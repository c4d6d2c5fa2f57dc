use kswatch_config::*;
use proptest::prelude::*;
use tempfile::tempdir;

#[test]
fn test_app_config_default() {
    let config = AppConfig::default();
    assert_eq!(config.detector.confidence, Confidence::P05);
    assert_eq!(config.detector.normal_count, 3);
    assert_eq!(config.detector.max_fingerprints, 20);
    assert_eq!(config.detector.distance_method, DistanceMethod::Exact);
    assert_eq!(config.detector.capacity_policy, CapacityPolicy::ReplaceWeakest);
    assert_eq!(config.persistence.backend, StorageBackend::Memory);
    assert_eq!(config.persistence.autosave_secs, None);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_confidence_coefficient_table() {
    let table: Vec<(u8, f64, f64)> = Confidence::ALL
        .iter()
        .map(|c| (c.level(), c.significance(), c.coefficient()))
        .collect();

    assert_eq!(
        table,
        vec![
            (0, 0.10, 1.22),
            (1, 0.05, 1.36),
            (2, 0.025, 1.48),
            (3, 0.01, 1.63),
            (4, 0.005, 1.73),
            (5, 0.001, 1.95),
        ]
    );
}

#[test]
fn test_confidence_rejects_unknown_level() {
    assert!(Confidence::try_from(6).is_err());
    assert_eq!(Confidence::try_from(3).unwrap(), Confidence::P01);
}

#[test]
fn test_config_validation() {
    let manager = ConfigManager::new();
    let mut config = AppConfig::default();
    assert!(manager.validate_config(&config).is_ok());

    config.detector.max_fingerprints = 0;
    assert!(manager.validate_config(&config).is_err());

    let mut config = AppConfig::default();
    config.logging.level = "chatty".to_string();
    assert!(manager.validate_config(&config).is_err());

    let mut config = AppConfig::default();
    config.persistence.autosave_secs = Some(0);
    assert!(manager.validate_config(&config).is_err());
}

#[test]
fn test_load_from_toml_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[detector]
confidence = 3
normal_count = 5
max_fingerprints = 4
distance_method = "merge_scan"
capacity_policy = "discard"

[persistence]
autosave_secs = 30

[persistence.backend]
kind = "disk"
path = "/var/lib/kswatch"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let mut manager = ConfigManager::with_path(path).env_prefix("KSWATCH_TEST_FILE");
    let config = manager.load_config().unwrap();

    assert_eq!(config.detector.confidence, Confidence::P01);
    assert_eq!(config.detector.normal_count, 5);
    assert_eq!(config.detector.max_fingerprints, 4);
    assert_eq!(config.detector.distance_method, DistanceMethod::MergeScan);
    assert_eq!(config.detector.capacity_policy, CapacityPolicy::Discard);
    assert_eq!(config.persistence.autosave_secs, Some(30));
    assert_eq!(
        config.persistence.backend,
        StorageBackend::Disk {
            path: "/var/lib/kswatch".into()
        }
    );
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_load_rejects_invalid_confidence() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[detector]\nconfidence = 9\n").unwrap();

    let mut manager = ConfigManager::with_path(path).env_prefix("KSWATCH_TEST_BAD");
    assert!(manager.load_config().is_err());
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let mut manager =
        ConfigManager::with_path(dir.path().join("absent.toml")).env_prefix("KSWATCH_TEST_NONE");
    assert_eq!(manager.load_config().unwrap(), AppConfig::default());
}

#[test]
fn test_save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut manager = ConfigManager::with_path(path.clone()).env_prefix("KSWATCH_TEST_SAVE");

    let mut config = AppConfig::default();
    config.detector.confidence = Confidence::P001;
    config.detector.max_fingerprints = 7;
    manager.save_config(&config).unwrap();

    assert!(path.exists());
    assert_eq!(manager.load_config().unwrap(), config);
}

proptest! {
    #[test]
    fn prop_confidence_level_round_trips(level in 0u8..6) {
        let confidence = Confidence::try_from(level).unwrap();
        prop_assert_eq!(u8::from(confidence), level);
    }
}
