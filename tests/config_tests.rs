// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use snapcam::Config;
use snapcam::config::CaptureBackendType;
use std::path::PathBuf;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(config.mirror_front, "Front camera should be mirrored by default");
    assert_eq!(config.backend, CaptureBackendType::V4l2);
    assert_eq!(config.torch_intensity, 1.0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_rejects_out_of_range_torch() {
    let config = Config {
        torch_intensity: 1.5,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_file_backend_with_source_is_valid() {
    let config = Config {
        backend: CaptureBackendType::File,
        file_source: Some(PathBuf::from("scene.png")),
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_json_roundtrip() {
    let config = Config {
        library_dir: Some(PathBuf::from("/tmp/photos")),
        front_device: Some("/dev/video2".to_string()),
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"backend\":\"v4l2\""));
    let parsed: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_cache_and_log_dirs_are_app_scoped() {
    let config = Config::default();
    assert!(config.capture_cache_dir().ends_with("snapcam/captures"));
    assert!(config.log_dir().ends_with("snapcam"));
}
