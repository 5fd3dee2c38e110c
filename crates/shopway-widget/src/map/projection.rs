//! Spherical Web Mercator with 256 px tiles, as used by slippy maps.

use std::f64::consts::PI;

use shopway_core::{Bounds, Position};

use super::Viewport;

pub const TILE_SIZE: f64 = 256.0;

/// Latitude beyond which Web Mercator is undefined.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Pixel coordinates of `p` at `zoom`; `y` grows southwards.
#[must_use]
pub fn project(p: Position, zoom: f64) -> [f64; 2] {
    let size = world_size(zoom);
    let lat = p.lat().clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lng() + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    [x, y]
}

/// Inverse of [`project`].
#[must_use]
pub fn unproject(xy: [f64; 2], zoom: f64) -> Position {
    let size = world_size(zoom);
    let lng = (xy[0] / size * 360.0 - 180.0).clamp(-180.0, 180.0);
    let n = PI * (1.0 - 2.0 * xy[1] / size);
    let lat = n.sinh().atan().to_degrees();
    Position::clamped(lat.clamp(-MAX_LATITUDE, MAX_LATITUDE), lng)
}

/// Center of `bounds` in projected space, which differs from the plain
/// lat/lng midpoint away from the equator.
#[must_use]
pub fn bounds_center(bounds: &Bounds) -> Position {
    let a = project(bounds.south_west(), 0.0);
    let b = project(bounds.north_east(), 0.0);
    unproject([(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0], 0.0)
}

/// Largest integer zoom at which `bounds` fits inside `viewport` minus
/// `padding_px` on every side, clamped to `[min_zoom, max_zoom]`.
#[must_use]
pub fn fit_zoom(
    bounds: &Bounds,
    viewport: Viewport,
    padding_px: f64,
    min_zoom: f64,
    max_zoom: f64,
) -> f64 {
    let a = project(bounds.south_west(), 0.0);
    let b = project(bounds.north_east(), 0.0);
    let span_x = (b[0] - a[0]).abs();
    let span_y = (a[1] - b[1]).abs();

    let avail_x = (viewport.width - 2.0 * padding_px).max(1.0);
    let avail_y = (viewport.height - 2.0 * padding_px).max(1.0);

    let scale_x = if span_x > 0.0 { avail_x / span_x } else { f64::INFINITY };
    let scale_y = if span_y > 0.0 { avail_y / span_y } else { f64::INFINITY };
    let scale = scale_x.min(scale_y);
    if !scale.is_finite() {
        return max_zoom;
    }
    scale.log2().floor().clamp(min_zoom, max_zoom)
}
