use serde::{Deserialize, Serialize};

use crate::geo::{path_length, Position};
use crate::CoreError;

/// Routing profile sent to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Car,
    Bike,
    Foot,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Car => write!(f, "car"),
            TransportMode::Bike => write!(f, "bike"),
            TransportMode::Foot => write!(f, "foot"),
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" | "driving" => Ok(TransportMode::Car),
            "bike" | "cycling" => Ok(TransportMode::Bike),
            "foot" | "walking" => Ok(TransportMode::Foot),
            other => Err(CoreError::InvalidTransportMode(other.to_string())),
        }
    }
}

/// A storefront listed by the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commerce {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: Option<String>,
    pub logo_url: Option<String>,
    /// Weak reference into the delivery zones; resolved by lookup only.
    pub delivery_zone_id: Option<i64>,
}

impl Commerce {
    /// Storefront location, or `None` when coordinates are missing or invalid.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        Position::new(self.lat?, self.lng?).ok()
    }
}

/// Area a vehicle may approach before the visitor continues on foot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZone {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Polygon outline; at least three points when present.
    pub geometry: Option<Vec<Position>>,
    pub icon_url: Option<String>,
}

impl DeliveryZone {
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        Position::new(self.lat, self.lng).ok()
    }
}

/// Administrator-defined origin such as a building entrance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPoint {
    pub id: i64,
    pub label: String,
    pub lat: f64,
    pub lng: f64,
    pub icon_url: Option<String>,
}

impl StartPoint {
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        Position::new(self.lat, self.lng).ok()
    }
}

/// One leg of a computed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    #[serde(default)]
    pub geometry: Vec<Position>,
    /// Meters, as reported by the backend.
    #[serde(default)]
    pub distance: f64,
    /// Seconds, as reported by the backend.
    #[serde(default)]
    pub duration: f64,
}

impl RouteSegment {
    /// A polyline needs two points.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.geometry.len() >= 2
    }

    /// Reported distance, or the geometry length when the backend sent none.
    #[must_use]
    pub fn length_m(&self) -> f64 {
        if self.distance > 0.0 {
            self.distance
        } else {
            path_length(&self.geometry)
        }
    }
}

/// Turn-by-turn instruction attached to a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "type")]
    pub kind: String,
    pub modifier: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub distance: f64,
}

/// Result of a route computation, in the backend's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub vehicle_route: Option<RouteSegment>,
    pub walking_route: Option<RouteSegment>,
    pub start_point_id: Option<i64>,
    pub delivery_zone_id: Option<i64>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Route {
    /// Drops segments too short to draw.
    ///
    /// The vehicle segment is mandatory: `None` means "no route found". A
    /// missing or degenerate walking segment is simply removed.
    #[must_use]
    pub fn into_drawable(mut self) -> Option<Self> {
        if !self.vehicle_route.as_ref().is_some_and(RouteSegment::is_drawable) {
            return None;
        }
        if !self.walking_route.as_ref().is_some_and(RouteSegment::is_drawable) {
            self.walking_route = None;
        }
        Some(self)
    }

    #[must_use]
    pub fn total_distance(&self) -> f64 {
        self.segments().map(RouteSegment::length_m).sum()
    }

    #[must_use]
    pub fn total_duration(&self) -> f64 {
        self.segments().map(|s| s.duration).sum()
    }

    pub fn segments(&self) -> impl Iterator<Item = &RouteSegment> {
        self.vehicle_route.iter().chain(self.walking_route.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(points: &[(f64, f64)]) -> RouteSegment {
        RouteSegment {
            geometry: points
                .iter()
                .map(|&(lat, lng)| Position::new(lat, lng).unwrap())
                .collect(),
            distance: 0.0,
            duration: 60.0,
        }
    }

    fn route(vehicle: Option<RouteSegment>, walking: Option<RouteSegment>) -> Route {
        Route {
            vehicle_route: vehicle,
            walking_route: walking,
            start_point_id: Some(1),
            delivery_zone_id: Some(3),
            steps: vec![],
        }
    }

    #[test]
    fn transport_mode_round_trips_through_str() {
        for mode in [TransportMode::Car, TransportMode::Bike, TransportMode::Foot] {
            assert_eq!(mode.to_string().parse::<TransportMode>().unwrap(), mode);
        }
        assert_eq!("walking".parse::<TransportMode>().unwrap(), TransportMode::Foot);
        assert!("boat".parse::<TransportMode>().is_err());
    }

    #[test]
    fn commerce_without_coordinates_has_no_position() {
        let json = r#"{"id": 1, "name": "Bakery", "address": "1 rue X", "lat": null}"#;
        let commerce: Commerce = serde_json::from_str(json).unwrap();
        assert!(commerce.position().is_none());
        assert!(commerce.delivery_zone_id.is_none());
    }

    #[test]
    fn route_deserializes_wire_shape() {
        let json = r#"{
            "vehicleRoute": {"geometry": [{"lat": 48.86, "lng": 2.34}, {"lat": 48.851, "lng": 2.351}], "distance": 1200, "duration": 240},
            "walkingRoute": {"geometry": [{"lat": 48.851, "lng": 2.351}, {"lat": 48.85, "lng": 2.35}], "distance": 130, "duration": 95},
            "startPointId": 1,
            "deliveryZoneId": 3,
            "steps": [{"type": "turn", "modifier": "left", "name": "Rue de Rivoli", "distance": 200}]
        }"#;
        let route: Route = serde_json::from_str(json).unwrap();
        assert_eq!(route.delivery_zone_id, Some(3));
        assert_eq!(route.steps[0].kind, "turn");
        assert!((route.total_distance() - 1330.0).abs() < 1e-9);
        assert!((route.total_duration() - 335.0).abs() < 1e-9);
    }

    #[test]
    fn into_drawable_requires_vehicle_geometry() {
        assert!(route(None, Some(seg(&[(0.0, 0.0), (0.0, 1.0)]))).into_drawable().is_none());
        assert!(route(Some(seg(&[(0.0, 0.0)])), None).into_drawable().is_none());
        assert!(route(Some(seg(&[])), None).into_drawable().is_none());
    }

    #[test]
    fn into_drawable_drops_degenerate_walking_segment() {
        let r = route(
            Some(seg(&[(0.0, 0.0), (0.0, 1.0)])),
            Some(seg(&[(0.0, 1.0)])),
        )
        .into_drawable()
        .unwrap();
        assert!(r.walking_route.is_none());
        assert!(r.vehicle_route.is_some());
    }

    #[test]
    fn segment_length_falls_back_to_geometry() {
        let s = seg(&[(0.0, 0.0), (0.0, 1.0)]);
        assert!(s.length_m() > 111_000.0);
    }
}
