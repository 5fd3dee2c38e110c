//! Map abstraction and the controller owning one map instance.
//!
//! [`MapBackend`] is the seam to whatever actually draws tiles. The widget
//! only talks to [`MapController`], which adds the behavior every backend
//! shares: base tile layer setup, fit-bounds framing, and the rotation
//! capability flag computed once at [`MapController::init`].

pub mod headless;
pub mod projection;

use std::fmt;

use shopway_core::{Bounds, Position};
use uuid::Uuid;

use crate::cluster::MarkerView;
use crate::error::MapError;
use crate::rotation::{self, BearingOptions};

pub use headless::HeadlessMap;

pub const TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// Opaque identity of an initialized map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapHandle(Uuid);

impl MapHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map-{}", self.0.simple())
    }
}

/// Size of the map container in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 390.0,
            height: 844.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineStyle {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    /// SVG dash pattern; `None` draws a solid stroke.
    pub dash_array: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonView {
    pub zone_id: i64,
    pub ring: Vec<Position>,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameTarget {
    Center { center: Position, zoom: f64 },
    Bounds(Bounds),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    pub padding_px: f64,
    pub max_zoom: Option<f64>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            padding_px: 20.0,
            max_zoom: None,
        }
    }
}

/// Operations a map rendering library has to provide.
pub trait MapBackend {
    /// Creates the map inside `container`.
    ///
    /// # Errors
    ///
    /// [`MapError::ContainerMissing`] or [`MapError::RendererUnavailable`].
    fn create(&mut self, container: &str, center: Position, zoom: f64) -> Result<(), MapError>;

    /// # Errors
    ///
    /// [`MapError::TileLayer`] when the layer cannot be attached.
    fn add_tile_layer(&mut self, url_template: &str, attribution: &str)
        -> Result<LayerId, MapError>;

    fn set_zoom_control(&mut self, enabled: bool);

    fn viewport(&self) -> Viewport;

    fn resize(&mut self, viewport: Viewport);

    fn zoom_range(&self) -> (f64, f64) {
        (0.0, 19.0)
    }

    fn set_view(&mut self, center: Position, zoom: f64);

    fn center(&self) -> Position;

    fn zoom(&self) -> f64;

    fn add_polyline(&mut self, points: &[Position], style: &PolylineStyle) -> LayerId;

    fn remove_layer(&mut self, id: LayerId);

    fn render_markers(&mut self, markers: &[MarkerView]);

    fn render_polygons(&mut self, polygons: &[PolygonView]);

    /// Whether the library can rotate the map freely.
    fn supports_rotation(&self) -> bool;

    fn set_bearing(&mut self, degrees: f64, options: BearingOptions);

    fn bearing(&self) -> f64;

    fn destroy(&mut self);
}

/// Owns a [`MapBackend`] for the lifetime of one widget instance.
#[derive(Debug)]
pub struct MapController<B> {
    backend: B,
    handle: Option<MapHandle>,
    rotation: bool,
}

impl<B: MapBackend> MapController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handle: None,
            rotation: false,
        }
    }

    /// Creates the map, attaches the base tile layer and hides the stock
    /// zoom buttons. Calling it again on a live map returns the same handle.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`MapError`]; the instance stays uninitialized.
    pub fn init(
        &mut self,
        container: &str,
        center: Position,
        zoom: f64,
    ) -> Result<MapHandle, MapError> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }

        self.backend.create(container, center, zoom)?;
        self.backend.add_tile_layer(TILE_URL, TILE_ATTRIBUTION)?;
        self.backend.set_zoom_control(false);

        self.rotation = self.backend.supports_rotation();
        if !self.rotation {
            tracing::trace!("map rotation not supported, bearing calls disabled");
        }

        let handle = MapHandle::new();
        self.handle = Some(handle);
        tracing::debug!(map = %handle, container, rotation = self.rotation, "map initialized");
        Ok(handle)
    }

    #[must_use]
    pub fn handle(&self) -> Option<MapHandle> {
        self.handle
    }

    #[must_use]
    pub fn rotation_supported(&self) -> bool {
        self.rotation
    }

    /// Moves the camera to a point or fits a bounding box.
    pub fn frame(&mut self, target: FrameTarget, options: FrameOptions) {
        if self.handle.is_none() {
            return;
        }
        match target {
            FrameTarget::Center { center, zoom } => self.backend.set_view(center, zoom),
            FrameTarget::Bounds(bounds) => {
                let (min_zoom, mut max_zoom) = self.backend.zoom_range();
                if let Some(cap) = options.max_zoom {
                    max_zoom = max_zoom.min(cap);
                }
                let zoom = projection::fit_zoom(
                    &bounds,
                    self.backend.viewport(),
                    options.padding_px,
                    min_zoom,
                    max_zoom,
                );
                self.backend
                    .set_view(projection::bounds_center(&bounds), zoom);
            }
        }
    }

    /// Rotates the map. Returns `false` without touching the backend when
    /// rotation is unsupported.
    pub fn set_bearing(&mut self, degrees: f64, options: BearingOptions) -> bool {
        if !self.rotation || self.handle.is_none() {
            tracing::trace!(degrees, "bearing change skipped");
            return false;
        }
        self.backend.set_bearing(rotation::normalize(degrees), options);
        true
    }

    pub fn reset_bearing(&mut self, options: BearingOptions) -> bool {
        self.set_bearing(0.0, options)
    }

    #[must_use]
    pub fn bearing(&self) -> f64 {
        if self.rotation {
            self.backend.bearing()
        } else {
            0.0
        }
    }

    pub fn draw_polyline(&mut self, points: &[Position], style: &PolylineStyle) -> Option<LayerId> {
        self.handle?;
        Some(self.backend.add_polyline(points, style))
    }

    pub fn remove_layer(&mut self, id: LayerId) {
        if self.handle.is_some() {
            self.backend.remove_layer(id);
        }
    }

    pub fn render_markers(&mut self, markers: &[MarkerView]) {
        if self.handle.is_some() {
            self.backend.render_markers(markers);
        }
    }

    pub fn render_polygons(&mut self, polygons: &[PolygonView]) {
        if self.handle.is_some() {
            self.backend.render_polygons(polygons);
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.backend.resize(viewport);
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.backend.viewport()
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.backend.zoom()
    }

    #[must_use]
    pub fn center(&self) -> Position {
        self.backend.center()
    }

    /// Tears the map down. Later calls on the controller are ignored.
    pub fn destroy(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.destroy();
            self.rotation = false;
            tracing::debug!(map = %handle, "map destroyed");
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    fn controller() -> MapController<HeadlessMap> {
        MapController::new(HeadlessMap::new(Viewport::default()))
    }

    #[test]
    fn init_attaches_tiles_and_hides_zoom_control() {
        let mut map = controller();
        let handle = map.init("map", pos(48.85, 2.35), 13.0).unwrap();
        assert_eq!(map.handle(), Some(handle));
        assert_eq!(map.backend().tile_layers(), [TILE_URL.to_string()]);
        assert!(!map.backend().zoom_control());
        assert!(map.rotation_supported());
    }

    #[test]
    fn init_twice_returns_same_handle() {
        let mut map = controller();
        let first = map.init("map", pos(48.85, 2.35), 13.0).unwrap();
        let second = map.init("map", pos(0.0, 0.0), 3.0).unwrap();
        assert_eq!(first, second);
        assert_eq!(map.backend().tile_layers().len(), 1);
    }

    #[test]
    fn init_fails_without_container() {
        let mut map = controller();
        let err = map.init("", pos(48.85, 2.35), 13.0).unwrap_err();
        assert!(matches!(err, MapError::ContainerMissing(_)));
        assert!(map.handle().is_none());
    }

    #[test]
    fn init_fails_without_renderer() {
        let mut map = MapController::new(HeadlessMap::unavailable(Viewport::default()));
        let err = map.init("map", pos(48.85, 2.35), 13.0).unwrap_err();
        assert!(matches!(err, MapError::RendererUnavailable(_)));
    }

    #[test]
    fn bearing_calls_are_silent_without_rotation() {
        let mut map =
            MapController::new(HeadlessMap::new(Viewport::default()).without_rotation());
        map.init("map", pos(48.85, 2.35), 13.0).unwrap();
        assert!(!map.set_bearing(135.0, BearingOptions::instant()));
        assert!(!map.reset_bearing(BearingOptions::instant()));
        assert_relative_eq!(map.bearing(), 0.0);
        assert!(map.backend().bearing_calls().is_empty());
    }

    #[test]
    fn set_bearing_normalizes() {
        let mut map = controller();
        map.init("map", pos(48.85, 2.35), 13.0).unwrap();
        assert!(map.set_bearing(-90.0, BearingOptions::animated(600)));
        assert_relative_eq!(map.bearing(), 270.0);
    }

    #[test]
    fn frame_bounds_centers_and_zooms() {
        let mut map = controller();
        map.init("map", pos(0.0, 0.0), 3.0).unwrap();
        let bounds = Bounds::from_points([pos(48.85, 2.34), pos(48.86, 2.351)]).unwrap();
        map.frame(
            FrameTarget::Bounds(bounds),
            FrameOptions {
                padding_px: 60.0,
                max_zoom: None,
            },
        );
        assert!(bounds.contains(map.center()));
        assert!(map.zoom() >= 14.0);
    }

    #[test]
    fn frame_respects_max_zoom_cap() {
        let mut map = controller();
        map.init("map", pos(0.0, 0.0), 3.0).unwrap();
        map.frame(
            FrameTarget::Bounds(Bounds::from_point(pos(48.85, 2.35))),
            FrameOptions {
                padding_px: 60.0,
                max_zoom: Some(16.0),
            },
        );
        assert_relative_eq!(map.zoom(), 16.0);
    }

    #[test]
    fn calls_after_destroy_are_ignored() {
        let mut map = controller();
        map.init("map", pos(48.85, 2.35), 13.0).unwrap();
        map.destroy();
        assert!(map.backend().is_destroyed());
        let style = PolylineStyle {
            color: "#000",
            weight: 1.0,
            opacity: 1.0,
            dash_array: None,
        };
        assert!(map.draw_polyline(&[pos(0.0, 0.0), pos(1.0, 1.0)], &style).is_none());
        map.destroy();
    }
}
