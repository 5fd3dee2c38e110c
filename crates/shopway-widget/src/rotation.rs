//! Bearing helpers for the "face up-route" camera rotation.

use shopway_core::{bearing, Position};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingOptions {
    pub animate: bool,
    pub duration_ms: u64,
}

impl BearingOptions {
    #[must_use]
    pub fn instant() -> Self {
        Self {
            animate: false,
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn animated(duration_ms: u64) -> Self {
        Self {
            animate: duration_ms > 0,
            duration_ms,
        }
    }
}

/// Wraps any angle into `[0, 360)`. Non-finite input maps to north.
#[must_use]
pub fn normalize(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Heading of the first leg of a polyline.
///
/// Leading duplicate points are skipped; a line that never moves has no
/// heading.
#[must_use]
pub fn up_route_bearing(points: &[Position]) -> Option<f64> {
    let first = *points.first()?;
    let next = points.iter().copied().find(|p| *p != first)?;
    Some(bearing(first, next))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    #[test]
    fn normalize_wraps_both_directions() {
        assert_relative_eq!(normalize(-90.0), 270.0);
        assert_relative_eq!(normalize(720.0), 0.0);
        assert_relative_eq!(normalize(359.5), 359.5);
        assert_relative_eq!(normalize(f64::NAN), 0.0);
    }

    #[test]
    fn up_route_bearing_uses_first_leg() {
        let east = up_route_bearing(&[pos(0.0, 0.0), pos(0.0, 1.0), pos(5.0, 1.0)]).unwrap();
        assert_relative_eq!(east, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn up_route_bearing_skips_repeated_start() {
        let p = pos(48.86, 2.34);
        let b = up_route_bearing(&[p, p, pos(47.86, 2.34)]).unwrap();
        assert_relative_eq!(b, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn up_route_bearing_none_for_stationary_line() {
        let p = pos(48.86, 2.34);
        assert!(up_route_bearing(&[p, p]).is_none());
        assert!(up_route_bearing(&[]).is_none());
    }

    #[test]
    fn animated_zero_duration_is_instant() {
        assert_eq!(BearingOptions::animated(0), BearingOptions::instant());
    }
}
