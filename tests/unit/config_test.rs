//! Tests for configuration validation

use std::path::PathBuf;

use scout_dispatch::config::{
    CategoryConfig, DispatchConfig, NotifierBackendConfig, MAX_REQUEST_TTL_SECS,
};

fn category(name: &str, earning: f64) -> CategoryConfig {
    CategoryConfig {
        name: name.to_string(),
        earning,
        sub_tasks: Vec::new(),
    }
}

#[test]
fn test_default_config_validation() {
    let cfg = DispatchConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.max_offers_per_task, 5);
    assert_eq!(cfg.categories.len(), 3);
    assert_eq!(cfg.notifications, NotifierBackendConfig::InMemory);
}

#[test]
fn test_config_invalid_max_offers() {
    let invalid = DispatchConfig {
        max_offers_per_task: 0,
        ..DispatchConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_ttl() {
    let invalid = DispatchConfig {
        request_ttl_secs: Some(0),
        ..DispatchConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_ttl_upper_bound() {
    let at_limit = DispatchConfig {
        request_ttl_secs: Some(MAX_REQUEST_TTL_SECS),
        ..DispatchConfig::default()
    };
    assert!(at_limit.validate().is_ok());
    assert_eq!(
        at_limit.request_ttl(),
        Some(chrono::Duration::days(30))
    );

    let err = DispatchConfig::from_json_str(
        r#"{ "request_ttl_secs": 1000000000000000000, "categories": [{ "name": "House Visit", "earning": 1.0 }] }"#,
    )
    .unwrap_err();
    assert!(err.contains("request_ttl_secs must not exceed"));

    let err = DispatchConfig::from_json_str(
        r#"{ "request_ttl_secs": 18446744073709551615, "categories": [{ "name": "House Visit", "earning": 1.0 }] }"#,
    )
    .unwrap_err();
    assert!(err.contains("request_ttl_secs"));
}

#[test]
fn test_request_ttl_out_of_range_is_none() {
    for secs in [1_000_000_000_000_000_000, u64::MAX] {
        let cfg = DispatchConfig {
            request_ttl_secs: Some(secs),
            ..DispatchConfig::default()
        };
        assert_eq!(cfg.request_ttl(), None);
    }
}

#[test]
fn test_config_invalid_default_rating() {
    let invalid = DispatchConfig {
        default_scout_rating: 5.5,
        ..DispatchConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_categories() {
    let empty = DispatchConfig {
        categories: Vec::new(),
        ..DispatchConfig::default()
    };
    assert!(empty.validate().is_err());

    let negative = DispatchConfig {
        categories: vec![category("House Visit", -1.0)],
        ..DispatchConfig::default()
    };
    assert!(negative.validate().unwrap_err().contains("negative"));

    let unnamed = DispatchConfig {
        categories: vec![category("  ", 10.0)],
        ..DispatchConfig::default()
    };
    assert!(unnamed.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let raw = r#"{
        "max_offers_per_task": 3,
        "request_ttl_secs": 900,
        "categories": [
            { "name": "House Visit", "earning": 120.0, "sub_tasks": ["Show house"] }
        ],
        "notifications": { "backend": "file", "path": "/var/lib/scout/notifications" }
    }"#;
    let cfg = DispatchConfig::from_json_str(raw).unwrap();

    assert_eq!(cfg.max_offers_per_task, 3);
    assert_eq!(cfg.conflict_window_minutes, 60);
    assert_eq!(cfg.request_ttl(), Some(chrono::Duration::seconds(900)));
    assert_eq!(cfg.limits().conflict_window, chrono::Duration::minutes(60));
    assert_eq!(
        cfg.notifications,
        NotifierBackendConfig::File {
            path: PathBuf::from("/var/lib/scout/notifications")
        }
    );
}

#[test]
fn test_config_from_json_rejects_invalid() {
    let err = DispatchConfig::from_json_str(r#"{ "categories": [] }"#).unwrap_err();
    assert!(err.contains("category"));

    let err = DispatchConfig::from_json_str("not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}
