use crate::app_config::WidgetConfig;
use crate::ConfigError;

/// Load widget configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_widget_config() -> Result<WidgetConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_widget_config_from_env()
}

/// Load widget configuration from environment variables already in the process.
///
/// Unlike [`load_widget_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_widget_config_from_env() -> Result<WidgetConfig, ConfigError> {
    build_widget_config(|key| std::env::var(key))
}

/// Build widget configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a plain `HashMap`.
fn build_widget_config<F>(lookup: F) -> Result<WidgetConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        or_default(var, default)
            .parse::<u8>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let parse_fraction = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = parse_f64(var, default)?;
        if value > 0.0 && value <= 0.95 {
            Ok(value)
        } else {
            Err(invalid(var, format!("{value} is outside (0, 0.95]")))
        }
    };

    let api_base_url = require("SHOPWAY_API_BASE_URL")?;
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(invalid(
            "SHOPWAY_API_BASE_URL",
            "must start with http:// or https://".to_string(),
        ));
    }

    let payload_path = PathBuf::from(or_default("SHOPWAY_PAYLOAD_PATH", "./config/payload.json"));
    let log_level = or_default("SHOPWAY_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("SHOPWAY_REQUEST_TIMEOUT_SECS", "15")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "SHOPWAY_REQUEST_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }
    let user_agent = or_default("SHOPWAY_USER_AGENT", "shopway/0.1 (route-widget)");

    let cluster_radius_px = parse_f64("SHOPWAY_CLUSTER_RADIUS_PX", "80")?;
    let cluster_disable_at_zoom = parse_u8("SHOPWAY_CLUSTER_DISABLE_AT_ZOOM", "17")?;

    let route_padding_px = parse_f64("SHOPWAY_ROUTE_PADDING_PX", "60")?;
    if route_padding_px < 60.0 {
        return Err(invalid(
            "SHOPWAY_ROUTE_PADDING_PX",
            format!("{route_padding_px} is below the 60px minimum"),
        ));
    }

    let sheet_peek_fraction = parse_fraction("SHOPWAY_SHEET_PEEK", "0.35")?;
    let sheet_open_fraction = parse_fraction("SHOPWAY_SHEET_OPEN", "0.92")?;
    if sheet_peek_fraction >= sheet_open_fraction {
        return Err(invalid(
            "SHOPWAY_SHEET_PEEK",
            format!("peek {sheet_peek_fraction} must be below open {sheet_open_fraction}"),
        ));
    }

    let snap_velocity = parse_f64("SHOPWAY_SNAP_VELOCITY", "0.5")?;
    let collapse_delay_ms = parse_u64("SHOPWAY_COLLAPSE_DELAY_MS", "400")?;
    let rotation_duration_ms = parse_u64("SHOPWAY_ROTATION_DURATION_MS", "600")?;

    Ok(WidgetConfig {
        api_base_url,
        payload_path,
        log_level,
        request_timeout_secs,
        user_agent,
        cluster_radius_px,
        cluster_disable_at_zoom,
        route_padding_px,
        sheet_peek_fraction,
        sheet_open_fraction,
        snap_velocity,
        collapse_delay_ms,
        rotation_duration_ms,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
