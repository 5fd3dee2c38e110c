use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for a widget host.
#[derive(Clone)]
pub struct WidgetConfig {
    pub api_base_url: String,
    pub payload_path: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub cluster_radius_px: f64,
    pub cluster_disable_at_zoom: u8,
    pub route_padding_px: f64,
    pub sheet_peek_fraction: f64,
    pub sheet_open_fraction: f64,
    /// Release speed above which a drag counts as a fling, in px/ms.
    pub snap_velocity: f64,
    pub collapse_delay_ms: u64,
    pub rotation_duration_ms: u64,
}

impl WidgetConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn collapse_delay(&self) -> Duration {
        Duration::from_millis(self.collapse_delay_ms)
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/".to_string(),
            payload_path: PathBuf::from("./config/payload.json"),
            log_level: "info".to_string(),
            request_timeout_secs: 15,
            user_agent: "shopway/0.1 (route-widget)".to_string(),
            cluster_radius_px: 80.0,
            cluster_disable_at_zoom: 17,
            route_padding_px: 60.0,
            sheet_peek_fraction: 0.35,
            sheet_open_fraction: 0.92,
            snap_velocity: 0.5,
            collapse_delay_ms: 400,
            rotation_duration_ms: 600,
        }
    }
}

/// Strips the query string so tokens passed in the URL never reach logs.
fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?[redacted]"),
        None => url.to_string(),
    }
}

impl std::fmt::Debug for WidgetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("api_base_url", &redact_url(&self.api_base_url))
            .field("payload_path", &self.payload_path)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("cluster_radius_px", &self.cluster_radius_px)
            .field("cluster_disable_at_zoom", &self.cluster_disable_at_zoom)
            .field("route_padding_px", &self.route_padding_px)
            .field("sheet_peek_fraction", &self.sheet_peek_fraction)
            .field("sheet_open_fraction", &self.sheet_open_fraction)
            .field("snap_velocity", &self.snap_velocity)
            .field("collapse_delay_ms", &self.collapse_delay_ms)
            .field("rotation_duration_ms", &self.rotation_duration_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_query_string() {
        let cfg = WidgetConfig {
            api_base_url: "https://example.test/wp-admin/admin-ajax.php?nonce=abc123".to_string(),
            ..WidgetConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("abc123"), "{rendered}");
        assert!(rendered.contains("admin-ajax.php?[redacted]"));
    }
}
