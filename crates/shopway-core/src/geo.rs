//! Great-circle geometry on WGS84 coordinates.
//!
//! Everything in here is pure: no I/O, no logging, no allocation beyond the
//! returned values. Distances are meters on a spherical Earth.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated WGS84 point in decimal degrees.
///
/// Construction goes through [`Position::new`] (or serde, which calls it), so
/// a `Position` always satisfies `-90 <= lat <= 90` and `-180 <= lng <= 180`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawPosition {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawPosition> for Position {
    type Error = CoreError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl Position {
    /// Creates a position, rejecting NaN and out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] when either component is not
    /// finite or falls outside the WGS84 range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        if valid {
            Ok(Self { lat, lng })
        } else {
            Err(CoreError::InvalidCoordinate { lat, lng })
        }
    }

    /// Creates a position by clamping into the valid range. NaN becomes 0.
    #[must_use]
    pub fn clamped(lat: f64, lng: f64) -> Self {
        let fix = |v: f64, limit: f64| if v.is_nan() { 0.0 } else { v.clamp(-limit, limit) };
        Self {
            lat: fix(lat, 90.0),
            lng: fix(lng, 180.0),
        }
    }

    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

/// Haversine distance between two points, in meters.
///
/// Returns exactly `0.0` for identical points. The intermediate term is
/// clamped to `[0, 1]` so rounding on antipodal inputs cannot produce NaN.
#[must_use]
pub fn distance(a: Position, b: Position) -> f64 {
    if a == b {
        return 0.0;
    }
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial forward azimuth from `from` towards `to`, in degrees `[0, 360)`.
///
/// Coincident points have no direction; they yield `0.0`.
#[must_use]
pub fn bearing(from: Position, to: Position) -> f64 {
    if from == to {
        return 0.0;
    }
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let d_lambda = (to.lng - from.lng).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    let theta = y.atan2(x).to_degrees();
    if !theta.is_finite() {
        return 0.0;
    }
    let normalized = if theta < 0.0 { theta + 360.0 } else { theta };
    // -0.0 + 360.0 and tiny negative values can land exactly on 360.
    if normalized >= 360.0 {
        normalized - 360.0
    } else {
        normalized
    }
}

/// Sum of the haversine lengths of consecutive points.
#[must_use]
pub fn path_length(points: &[Position]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Axis-aligned lat/lng rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Degenerate bounds covering a single point.
    #[must_use]
    pub fn from_point(p: Position) -> Self {
        Self {
            south: p.lat,
            west: p.lng,
            north: p.lat,
            east: p.lng,
        }
    }

    /// Smallest bounds containing every point, or `None` for an empty input.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::from_point(first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: Position) {
        self.south = self.south.min(p.lat);
        self.north = self.north.max(p.lat);
        self.west = self.west.min(p.lng);
        self.east = self.east.max(p.lng);
    }

    #[must_use]
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    #[must_use]
    pub fn contains(&self, p: Position) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lng)
    }

    #[must_use]
    pub fn center(&self) -> Position {
        // Both midpoints stay inside the valid range because the corners do.
        Position {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }

    #[must_use]
    pub fn south_west(&self) -> Position {
        Position {
            lat: self.south,
            lng: self.west,
        }
    }

    #[must_use]
    pub fn north_east(&self) -> Position {
        Position {
            lat: self.north,
            lng: self.east,
        }
    }

    #[must_use]
    pub fn is_point(&self) -> bool {
        self.south == self.north && self.west == self.east
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    #[test]
    fn position_rejects_out_of_range() {
        assert!(Position::new(90.1, 0.0).is_err());
        assert!(Position::new(0.0, -180.5).is_err());
        assert!(Position::new(f64::NAN, 0.0).is_err());
        assert!(Position::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn position_deserialize_validates() {
        let ok: Result<Position, _> = serde_json::from_str(r#"{"lat":48.85,"lng":2.35}"#);
        assert!(ok.is_ok());
        let bad: Result<Position, _> = serde_json::from_str(r#"{"lat":148.85,"lng":2.35}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn clamped_pulls_values_into_range() {
        let p = Position::clamped(95.0, f64::NAN);
        assert_relative_eq!(p.lat(), 90.0);
        assert_relative_eq!(p.lng(), 0.0);
    }

    #[test]
    fn distance_to_self_is_zero() {
        for p in [pos(0.0, 0.0), pos(48.85, 2.35), pos(-90.0, 180.0), pos(12.3, -45.6)] {
            assert!(distance(p, p).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = pos(48.86, 2.34);
        let b = pos(48.85, 2.35);
        assert_relative_eq!(distance(a, b), distance(b, a), epsilon = 1e-9);
    }

    #[test]
    fn distance_paris_block_is_about_1340m() {
        let d = distance(pos(48.86, 2.34), pos(48.85, 2.35));
        assert!((1_300.0..1_400.0).contains(&d), "got {d}");
    }

    #[test]
    fn distance_antipodal_is_half_circumference() {
        let d = distance(pos(0.0, 0.0), pos(0.0, 180.0));
        assert!(d.is_finite());
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_M, max_relative = 1e-9);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = pos(0.0, 0.0);
        assert_relative_eq!(bearing(origin, pos(1.0, 0.0)), 0.0, epsilon = 1e-9);
        assert_relative_eq!(bearing(origin, pos(0.0, 1.0)), 90.0, epsilon = 1e-9);
        assert_relative_eq!(bearing(origin, pos(-1.0, 0.0)), 180.0, epsilon = 1e-9);
        assert_relative_eq!(bearing(origin, pos(0.0, -1.0)), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn bearing_same_point_is_zero() {
        let p = pos(48.85, 2.35);
        assert!(bearing(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn bearing_is_in_range_and_reverses_by_180() {
        let pairs = [
            (pos(0.0, 0.0), pos(0.0, 1.0)),
            (pos(0.0, 0.0), pos(1.0, 0.0)),
            (pos(0.0, -1.0), pos(0.0, 1.0)),
            (pos(-10.0, 20.0), pos(10.0, 20.0)),
        ];
        for (a, b) in pairs {
            let forward = bearing(a, b);
            let back = bearing(b, a);
            assert!((0.0..360.0).contains(&forward));
            assert!((0.0..360.0).contains(&back));
            let diff = (forward - back).rem_euclid(360.0);
            assert_relative_eq!(diff, 180.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn bearing_stays_below_360() {
        let b = bearing(pos(10.0, 0.0), pos(11.0, -1e-12));
        assert!((0.0..360.0).contains(&b), "got {b}");
    }

    #[test]
    fn bounds_union_and_center() {
        let a = Bounds::from_points([pos(48.85, 2.35), pos(48.86, 2.34)]).unwrap();
        let b = Bounds::from_point(pos(48.84, 2.36));
        let u = a.union(&b);
        assert_relative_eq!(u.south, 48.84);
        assert_relative_eq!(u.north, 48.86);
        assert_relative_eq!(u.west, 2.34);
        assert_relative_eq!(u.east, 2.36);
        assert!(u.contains(pos(48.85, 2.35)));
        assert_relative_eq!(u.center().lat(), 48.85, epsilon = 1e-12);
    }

    #[test]
    fn bounds_from_empty_is_none() {
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn path_length_sums_segments() {
        let pts = [pos(0.0, 0.0), pos(0.0, 1.0), pos(0.0, 2.0)];
        assert_relative_eq!(
            path_length(&pts),
            2.0 * distance(pts[0], pts[1]),
            max_relative = 1e-9
        );
        assert!(path_length(&pts[..1]).abs() < f64::EPSILON);
    }
}
