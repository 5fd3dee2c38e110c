//! Wire types for the route endpoint.

use serde::Deserialize;
use shopway_core::{Position, TransportMode};

/// Parameters of a single route computation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub start: Position,
    pub profile: TransportMode,
    pub commerce_id: Option<i64>,
    pub destination_id: Option<i64>,
}

impl RouteRequest {
    /// Query pairs in the order the backend documents them.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("startLat", self.start.lat().to_string()),
            ("startLng", self.start.lng().to_string()),
            ("profile", self.profile.to_string()),
        ];
        if let Some(id) = self.commerce_id {
            pairs.push(("commerceId", id.to_string()));
        }
        if let Some(id) = self.destination_id {
            pairs.push(("destinationId", id.to_string()));
        }
        pairs
    }
}

/// `{"success": bool, "data": ...}` envelope wrapping every response.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FailureData {
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_skip_missing_ids() {
        let request = RouteRequest {
            start: Position::new(48.86, 2.34).unwrap(),
            profile: TransportMode::Bike,
            commerce_id: Some(7),
            destination_id: None,
        };
        let pairs = request.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("startLat", "48.86".to_string()),
                ("startLng", "2.34".to_string()),
                ("profile", "bike".to_string()),
                ("commerceId", "7".to_string()),
            ]
        );
    }
}
