use thiserror::Error;

/// Failures of the map layer. All of them are fatal for the widget instance
/// that hit them and are reported to the host instead of retried.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("map container '{0}' not found")]
    ContainerMissing(String),

    #[error("map rendering library unavailable: {0}")]
    RendererUnavailable(String),

    #[error("tile layer rejected: {0}")]
    TileLayer(String),
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("map initialization failed: {0}")]
    Map(#[from] MapError),

    #[error("payload has nothing to show: no destinations, start points or delivery zones")]
    EmptyPayload,
}
