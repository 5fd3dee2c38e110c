//! Initial data handed to a widget at mount time.
//!
//! The host page embeds this payload; for the CLI it lives in a JSON or YAML
//! file. [`load_payload`] parses and validates it in one go.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::Lang;
use crate::geo::{distance, Bounds, Position};
use crate::model::{Commerce, DeliveryZone, StartPoint, TransportMode};
use crate::ConfigError;

/// A served location grouping commerces, with an optional outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
    /// Operating-area polygon.
    pub zone: Option<Vec<Position>>,
    #[serde(default)]
    pub commerces: Vec<Commerce>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub default_profile: TransportMode,
    #[serde(default)]
    pub lang: Lang,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPayload {
    #[serde(default)]
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub start_points: Vec<StartPoint>,
    #[serde(default)]
    pub delivery_zones: Vec<DeliveryZone>,
    #[serde(default)]
    pub settings: Settings,
}

impl InitialPayload {
    pub fn commerces(&self) -> impl Iterator<Item = &Commerce> {
        self.destinations.iter().flat_map(|d| d.commerces.iter())
    }

    /// Finds a commerce together with the destination that lists it.
    #[must_use]
    pub fn find_commerce(&self, id: i64) -> Option<(&Destination, &Commerce)> {
        self.destinations.iter().find_map(|d| {
            d.commerces
                .iter()
                .find(|c| c.id == id)
                .map(|c| (d, c))
        })
    }

    #[must_use]
    pub fn find_zone(&self, id: i64) -> Option<&DeliveryZone> {
        self.delivery_zones.iter().find(|z| z.id == id)
    }

    #[must_use]
    pub fn find_start_point(&self, id: i64) -> Option<&StartPoint> {
        self.start_points.iter().find(|s| s.id == id)
    }

    /// Bounds of everything the widget serves: destination outlines (or
    /// centers when no outline exists), start points and delivery zones.
    #[must_use]
    pub fn operating_area(&self) -> Option<Bounds> {
        let outlines = self.destinations.iter().flat_map(|d| match &d.zone {
            Some(zone) if !zone.is_empty() => zone.clone(),
            _ => Position::new(d.lat, d.lng).into_iter().collect(),
        });
        let starts = self.start_points.iter().filter_map(StartPoint::position);
        let zones = self.delivery_zones.iter().flat_map(|z| {
            z.geometry
                .clone()
                .unwrap_or_default()
                .into_iter()
                .chain(z.position())
        });
        Bounds::from_points(outlines.chain(starts).chain(zones))
    }

    /// Validates the payload, returning warnings for non-fatal issues.
    ///
    /// Dangling `deliveryZoneId` references are warnings: such commerces are
    /// still listed, they just cannot be routed to.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PayloadInvalid`] listing every hard problem
    /// found (duplicate ids, coordinates out of range, short zone outlines).
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut commerce_ids = HashSet::new();
        for destination in &self.destinations {
            if Position::new(destination.lat, destination.lng).is_err() {
                errors.push(format!("destination {}: coordinates out of range", destination.id));
            }
            if let Some(zone) = &destination.zone {
                if !zone.is_empty() && zone.len() < 3 {
                    errors.push(format!(
                        "destination {}: zone outline needs at least 3 points, got {}",
                        destination.id,
                        zone.len()
                    ));
                }
            }
            for commerce in &destination.commerces {
                if !commerce_ids.insert(commerce.id) {
                    errors.push(format!("duplicate commerce id {}", commerce.id));
                }
                if commerce.lat.is_some() && commerce.lng.is_some() && commerce.position().is_none() {
                    errors.push(format!("commerce {}: coordinates out of range", commerce.id));
                }
                match commerce.delivery_zone_id {
                    Some(zone_id) if self.find_zone(zone_id).is_none() => warnings.push(format!(
                        "commerce {} references unknown delivery zone {zone_id}",
                        commerce.id
                    )),
                    None => warnings.push(format!("commerce {} has no delivery zone", commerce.id)),
                    Some(_) => {}
                }
            }
        }

        let mut start_ids = HashSet::new();
        for start in &self.start_points {
            if !start_ids.insert(start.id) {
                errors.push(format!("duplicate start point id {}", start.id));
            }
            if start.position().is_none() {
                errors.push(format!("start point {}: coordinates out of range", start.id));
            }
        }

        let mut zone_ids = HashSet::new();
        for zone in &self.delivery_zones {
            if !zone_ids.insert(zone.id) {
                errors.push(format!("duplicate delivery zone id {}", zone.id));
            }
            if zone.position().is_none() {
                errors.push(format!("delivery zone {}: coordinates out of range", zone.id));
            }
            if let Some(geometry) = &zone.geometry {
                if geometry.len() < 3 {
                    errors.push(format!(
                        "delivery zone {}: geometry needs at least 3 points, got {}",
                        zone.id,
                        geometry.len()
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigError::PayloadInvalid(errors))
        }
    }
}

/// Load and validate an initial payload from a `.json`, `.yaml` or `.yml` file.
///
/// Validation warnings are logged at `warn` level and do not fail the load.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_payload(path: &Path) -> Result<InitialPayload, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PayloadIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let payload: InitialPayload = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| ConfigError::PayloadParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| ConfigError::PayloadParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?
    };

    for warning in payload.validate()? {
        tracing::warn!(path = %path.display(), "{warning}");
    }

    Ok(payload)
}

/// Commerces ordered by distance from `from`, nearest first.
///
/// Commerces without coordinates are skipped. Returns at most `limit` entries.
#[must_use]
pub fn nearest_commerces(
    payload: &InitialPayload,
    from: Position,
    limit: usize,
) -> Vec<(f64, &Commerce)> {
    let mut ranked: Vec<(f64, &Commerce)> = payload
        .commerces()
        .filter_map(|c| c.position().map(|p| (distance(from, p), c)))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
