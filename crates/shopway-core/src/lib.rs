pub mod app_config;
pub mod config;
pub mod format;
pub mod geo;
pub mod model;
pub mod payload;

pub use app_config::WidgetConfig;
pub use config::{load_widget_config, load_widget_config_from_env};
pub use format::{format_distance, format_distance_in, format_duration, Lang};
pub use geo::{bearing, distance, path_length, Bounds, Position};
pub use model::{
    Commerce, DeliveryZone, Route, RouteSegment, StartPoint, Step, TransportMode,
};
pub use payload::{load_payload, nearest_commerces, Destination, InitialPayload, Settings};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("coordinate out of range: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("invalid transport mode: {0}")]
    InvalidTransportMode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read payload file {path}: {source}")]
    PayloadIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse payload file {path}: {reason}")]
    PayloadParse { path: String, reason: String },

    #[error("payload validation failed: {}", .0.join("; "))]
    PayloadInvalid(Vec<String>),
}
