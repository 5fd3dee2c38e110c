use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("SHOPWAY_API_BASE_URL", "https://example.test/wp-json/shopway/v1/");
    m
}

#[test]
fn build_widget_config_fails_without_api_base_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SHOPWAY_API_BASE_URL"),
        "expected MissingEnvVar(SHOPWAY_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_widget_config_rejects_non_http_base_url() {
    let mut map = full_env();
    map.insert("SHOPWAY_API_BASE_URL", "ftp://example.test");
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPWAY_API_BASE_URL"),
        "got: {result:?}"
    );
}

#[test]
fn build_widget_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_widget_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.request_timeout_secs, 15);
    assert_eq!(cfg.user_agent, "shopway/0.1 (route-widget)");
    assert_eq!(cfg.cluster_disable_at_zoom, 17);
    assert!((cfg.cluster_radius_px - 80.0).abs() < f64::EPSILON);
    assert!((cfg.route_padding_px - 60.0).abs() < f64::EPSILON);
    assert!((cfg.sheet_peek_fraction - 0.35).abs() < f64::EPSILON);
    assert!((cfg.sheet_open_fraction - 0.92).abs() < f64::EPSILON);
    assert!((cfg.snap_velocity - 0.5).abs() < f64::EPSILON);
    assert_eq!(cfg.collapse_delay_ms, 400);
    assert_eq!(cfg.rotation_duration_ms, 600);
}

#[test]
fn request_timeout_override() {
    let mut map = full_env();
    map.insert("SHOPWAY_REQUEST_TIMEOUT_SECS", "5");
    let cfg = build_widget_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout().as_secs(), 5);
}

#[test]
fn request_timeout_zero_is_rejected() {
    let mut map = full_env();
    map.insert("SHOPWAY_REQUEST_TIMEOUT_SECS", "0");
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPWAY_REQUEST_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn request_timeout_invalid() {
    let mut map = full_env();
    map.insert("SHOPWAY_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPWAY_REQUEST_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn route_padding_below_minimum_is_rejected() {
    let mut map = full_env();
    map.insert("SHOPWAY_ROUTE_PADDING_PX", "20");
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPWAY_ROUTE_PADDING_PX"),
        "got: {result:?}"
    );
}

#[test]
fn sheet_fraction_out_of_range_is_rejected() {
    let mut map = full_env();
    map.insert("SHOPWAY_SHEET_OPEN", "1.2");
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPWAY_SHEET_OPEN"),
        "got: {result:?}"
    );
}

#[test]
fn sheet_peek_must_be_below_open() {
    let mut map = full_env();
    map.insert("SHOPWAY_SHEET_PEEK", "0.9");
    map.insert("SHOPWAY_SHEET_OPEN", "0.5");
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPWAY_SHEET_PEEK"),
        "got: {result:?}"
    );
}

#[test]
fn cluster_zoom_override_and_invalid() {
    let mut map = full_env();
    map.insert("SHOPWAY_CLUSTER_DISABLE_AT_ZOOM", "15");
    let cfg = build_widget_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.cluster_disable_at_zoom, 15);

    map.insert("SHOPWAY_CLUSTER_DISABLE_AT_ZOOM", "300");
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPWAY_CLUSTER_DISABLE_AT_ZOOM"),
        "got: {result:?}"
    );
}

#[test]
fn snap_velocity_rejects_nan() {
    let mut map = full_env();
    map.insert("SHOPWAY_SNAP_VELOCITY", "NaN");
    let result = build_widget_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPWAY_SNAP_VELOCITY"),
        "got: {result:?}"
    );
}
