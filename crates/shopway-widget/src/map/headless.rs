//! In-memory [`MapBackend`] that records every call.
//!
//! Used by the CLI host and by tests to observe camera, layers and markers
//! without a rendering environment.

use std::collections::BTreeMap;

use shopway_core::Position;

use super::{LayerId, MapBackend, PolygonView, PolylineStyle, Viewport};
use crate::cluster::MarkerView;
use crate::error::MapError;
use crate::rotation::BearingOptions;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPolyline {
    pub points: Vec<Position>,
    pub style: PolylineStyle,
}

#[derive(Debug, Clone)]
pub struct HeadlessMap {
    available: bool,
    rotation: bool,
    viewport: Viewport,
    container: Option<String>,
    destroyed: bool,
    center: Position,
    zoom: f64,
    bearing: f64,
    bearing_calls: Vec<(f64, BearingOptions)>,
    zoom_control: bool,
    tile_layers: Vec<String>,
    next_layer: u64,
    polylines: BTreeMap<LayerId, RecordedPolyline>,
    markers: Vec<MarkerView>,
    polygons: Vec<PolygonView>,
    views: Vec<(Position, f64)>,
}

impl HeadlessMap {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            available: true,
            rotation: true,
            viewport,
            container: None,
            destroyed: false,
            center: Position::clamped(0.0, 0.0),
            zoom: 0.0,
            bearing: 0.0,
            bearing_calls: Vec::new(),
            zoom_control: true,
            tile_layers: Vec::new(),
            next_layer: 1,
            polylines: BTreeMap::new(),
            markers: Vec::new(),
            polygons: Vec::new(),
            views: Vec::new(),
        }
    }

    /// A backend whose rendering library failed to load.
    #[must_use]
    pub fn unavailable(viewport: Viewport) -> Self {
        Self {
            available: false,
            ..Self::new(viewport)
        }
    }

    #[must_use]
    pub fn without_rotation(mut self) -> Self {
        self.rotation = false;
        self
    }

    fn allocate_layer(&mut self) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        id
    }

    #[must_use]
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    #[must_use]
    pub fn zoom_control(&self) -> bool {
        self.zoom_control
    }

    #[must_use]
    pub fn tile_layers(&self) -> &[String] {
        &self.tile_layers
    }

    #[must_use]
    pub fn polylines(&self) -> &BTreeMap<LayerId, RecordedPolyline> {
        &self.polylines
    }

    #[must_use]
    pub fn markers(&self) -> &[MarkerView] {
        &self.markers
    }

    #[must_use]
    pub fn polygons(&self) -> &[PolygonView] {
        &self.polygons
    }

    /// Every `(center, zoom)` the camera was moved to, oldest first.
    #[must_use]
    pub fn views(&self) -> &[(Position, f64)] {
        &self.views
    }

    #[must_use]
    pub fn bearing_calls(&self) -> &[(f64, BearingOptions)] {
        &self.bearing_calls
    }
}

impl MapBackend for HeadlessMap {
    fn create(&mut self, container: &str, center: Position, zoom: f64) -> Result<(), MapError> {
        if !self.available {
            return Err(MapError::RendererUnavailable(
                "headless renderer disabled".to_string(),
            ));
        }
        if container.trim().is_empty() {
            return Err(MapError::ContainerMissing(container.to_string()));
        }
        self.container = Some(container.to_string());
        self.destroyed = false;
        self.set_view(center, zoom);
        Ok(())
    }

    fn add_tile_layer(
        &mut self,
        url_template: &str,
        _attribution: &str,
    ) -> Result<LayerId, MapError> {
        if !url_template.contains("{z}") {
            return Err(MapError::TileLayer(format!(
                "template without {{z}}: {url_template}"
            )));
        }
        self.tile_layers.push(url_template.to_string());
        Ok(self.allocate_layer())
    }

    fn set_zoom_control(&mut self, enabled: bool) {
        self.zoom_control = enabled;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_view(&mut self, center: Position, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
        self.views.push((center, zoom));
    }

    fn center(&self) -> Position {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn add_polyline(&mut self, points: &[Position], style: &PolylineStyle) -> LayerId {
        let id = self.allocate_layer();
        self.polylines.insert(
            id,
            RecordedPolyline {
                points: points.to_vec(),
                style: style.clone(),
            },
        );
        id
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.polylines.remove(&id);
    }

    fn render_markers(&mut self, markers: &[MarkerView]) {
        self.markers = markers.to_vec();
    }

    fn render_polygons(&mut self, polygons: &[PolygonView]) {
        self.polygons = polygons.to_vec();
    }

    fn supports_rotation(&self) -> bool {
        self.rotation
    }

    fn set_bearing(&mut self, degrees: f64, options: BearingOptions) {
        self.bearing = degrees;
        self.bearing_calls.push((degrees, options));
    }

    fn bearing(&self) -> f64 {
        self.bearing
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.polylines.clear();
        self.markers.clear();
        self.polygons.clear();
    }
}
