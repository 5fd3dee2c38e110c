//! Pure route view-model: what to draw, where to look and what to print.
//!
//! Nothing here touches the map. [`plan_route`] turns a validated [`Route`]
//! into a [`RoutePlan`]; the orchestrator applies it.

use serde::Serialize;
use shopway_core::{format_distance_in, format_duration, Bounds, Lang, Position, Route, Step};

use crate::cluster::ActiveIds;
use crate::map::PolylineStyle;
use crate::rotation::up_route_bearing;

pub const VEHICLE_STYLE: PolylineStyle = PolylineStyle {
    color: "#1d4ed8",
    weight: 6.0,
    opacity: 0.9,
    dash_array: None,
};

pub const WALKING_STYLE: PolylineStyle = PolylineStyle {
    color: "#ea580c",
    weight: 4.0,
    opacity: 0.95,
    dash_array: Some("6 8"),
};

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineSpec {
    pub points: Vec<Position>,
    pub style: PolylineStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentSummary {
    pub distance: String,
    pub duration: String,
}

/// Text shown by the route views of the bottom sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub commerce_id: i64,
    pub total_distance: String,
    pub total_duration: String,
    pub vehicle: Option<SegmentSummary>,
    pub walking: Option<SegmentSummary>,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub vehicle: Option<PolylineSpec>,
    pub walking: Option<PolylineSpec>,
    /// Union of the drawn segments' bounds.
    pub frame: Option<Bounds>,
    /// Heading of the vehicle segment's first leg.
    pub bearing: Option<f64>,
    pub active: ActiveIds,
    pub summary: RouteSummary,
}

#[must_use]
pub fn plan_route(route: &Route, commerce_id: i64, lang: Lang) -> RoutePlan {
    let vehicle = route
        .vehicle_route
        .as_ref()
        .filter(|s| s.is_drawable())
        .map(|s| PolylineSpec {
            points: s.geometry.clone(),
            style: VEHICLE_STYLE,
        });
    let walking = route
        .walking_route
        .as_ref()
        .filter(|s| s.is_drawable())
        .map(|s| PolylineSpec {
            points: s.geometry.clone(),
            style: WALKING_STYLE,
        });

    let frame = [vehicle.as_ref(), walking.as_ref()]
        .into_iter()
        .flatten()
        .filter_map(|spec| Bounds::from_points(spec.points.iter().copied()))
        .reduce(|a, b| a.union(&b));

    let bearing = vehicle
        .as_ref()
        .and_then(|spec| up_route_bearing(&spec.points));

    let segment = |s: &shopway_core::RouteSegment| SegmentSummary {
        distance: format_distance_in(s.length_m(), lang),
        duration: format_duration(s.duration),
    };

    let summary = RouteSummary {
        commerce_id,
        total_distance: format_distance_in(route.total_distance(), lang),
        total_duration: format_duration(route.total_duration()),
        vehicle: route.vehicle_route.as_ref().map(segment),
        walking: route.walking_route.as_ref().map(segment),
        steps: route.steps.iter().map(|s| describe_step(s, lang)).collect(),
    };

    RoutePlan {
        vehicle,
        walking,
        frame,
        bearing,
        active: ActiveIds {
            commerce: Some(commerce_id),
            start_point: route.start_point_id,
            zone: route.delivery_zone_id,
        },
        summary,
    }
}

/// One human-readable instruction line, e.g. `"Tourner à droite sur Rue de
/// Rivoli (400 m)"`.
#[must_use]
pub fn describe_step(step: &Step, lang: Lang) -> String {
    let modifier = step
        .modifier
        .as_deref()
        .map(|m| modifier_label(m, lang));

    let mut line = match (lang, step.kind.as_str()) {
        (Lang::Fr, "depart") => "Départ".to_string(),
        (Lang::En, "depart") => "Depart".to_string(),
        (Lang::Fr, "arrive") => "Arrivée".to_string(),
        (Lang::En, "arrive") => "Arrive".to_string(),
        (Lang::Fr, "turn" | "end of road" | "fork") => {
            format!("Tourner {}", modifier.unwrap_or_default())
        }
        (Lang::En, "turn" | "end of road" | "fork") => {
            format!("Turn {}", modifier.unwrap_or_default())
        }
        (Lang::Fr, "roundabout" | "rotary") => "Prendre le rond-point".to_string(),
        (Lang::En, "roundabout" | "rotary") => "Take the roundabout".to_string(),
        (Lang::Fr, "merge") => "S'insérer".to_string(),
        (Lang::En, "merge") => "Merge".to_string(),
        (Lang::Fr, _) => "Continuer".to_string(),
        (Lang::En, _) => "Continue".to_string(),
    }
    .trim_end()
    .to_string();

    if let Some(name) = step.name.as_deref().filter(|n| !n.trim().is_empty()) {
        let joiner = match lang {
            Lang::Fr => "sur",
            Lang::En => "onto",
        };
        line = format!("{line} {joiner} {}", name.trim());
    }
    if step.distance > 0.0 {
        line = format!("{line} ({})", format_distance_in(step.distance, lang));
    }
    line
}

fn modifier_label(modifier: &str, lang: Lang) -> &'static str {
    match (lang, modifier) {
        (Lang::Fr, "left") => "à gauche",
        (Lang::Fr, "right") => "à droite",
        (Lang::Fr, "slight left") => "légèrement à gauche",
        (Lang::Fr, "slight right") => "légèrement à droite",
        (Lang::Fr, "sharp left") => "franchement à gauche",
        (Lang::Fr, "sharp right") => "franchement à droite",
        (Lang::Fr, "uturn") => "et faire demi-tour",
        (Lang::Fr, _) => "tout droit",
        (Lang::En, "left") => "left",
        (Lang::En, "right") => "right",
        (Lang::En, "slight left") => "slightly left",
        (Lang::En, "slight right") => "slightly right",
        (Lang::En, "sharp left") => "sharp left",
        (Lang::En, "sharp right") => "sharp right",
        (Lang::En, "uturn") => "around",
        (Lang::En, _) => "straight",
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use shopway_core::RouteSegment;

    use super::*;

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    fn route() -> Route {
        Route {
            vehicle_route: Some(RouteSegment {
                geometry: vec![
                    pos(48.86, 2.34),
                    pos(48.858, 2.343),
                    pos(48.855, 2.346),
                    pos(48.853, 2.349),
                    pos(48.851, 2.351),
                ],
                distance: 1450.0,
                duration: 300.0,
            }),
            walking_route: Some(RouteSegment {
                geometry: vec![pos(48.851, 2.351), pos(48.85, 2.35)],
                distance: 135.0,
                duration: 100.0,
            }),
            start_point_id: Some(1),
            delivery_zone_id: Some(3),
            steps: vec![
                Step {
                    kind: "depart".to_string(),
                    modifier: None,
                    name: None,
                    distance: 0.0,
                },
                Step {
                    kind: "turn".to_string(),
                    modifier: Some("right".to_string()),
                    name: Some("Rue de Rivoli".to_string()),
                    distance: 400.0,
                },
            ],
        }
    }

    #[test]
    fn plan_styles_segments_distinctly() {
        let plan = plan_route(&route(), 7, Lang::Fr);
        let vehicle = plan.vehicle.unwrap();
        let walking = plan.walking.unwrap();
        assert_eq!(vehicle.points.len(), 5);
        assert_eq!(walking.points.len(), 2);
        assert!(vehicle.style.dash_array.is_none());
        assert!(walking.style.dash_array.is_some());
        assert_ne!(vehicle.style.color, walking.style.color);
    }

    #[test]
    fn plan_frames_union_of_segments() {
        let plan = plan_route(&route(), 7, Lang::Fr);
        let frame = plan.frame.unwrap();
        assert!(frame.contains(pos(48.86, 2.34)));
        assert!(frame.contains(pos(48.85, 2.35)));
        assert_relative_eq!(frame.south, 48.85);
        assert_relative_eq!(frame.north, 48.86);
    }

    #[test]
    fn plan_frames_vehicle_alone_without_walking() {
        let mut r = route();
        r.walking_route = None;
        let plan = plan_route(&r, 7, Lang::Fr);
        assert!(plan.walking.is_none());
        let frame = plan.frame.unwrap();
        assert_relative_eq!(frame.south, 48.851);
        assert!(plan.summary.walking.is_none());
    }

    #[test]
    fn plan_bearing_follows_first_leg() {
        let plan = plan_route(&route(), 7, Lang::Fr);
        let b = plan.bearing.unwrap();
        assert!((90.0..180.0).contains(&b), "south-east, got {b}");
    }

    #[test]
    fn plan_carries_response_ids() {
        let plan = plan_route(&route(), 7, Lang::Fr);
        assert_eq!(
            plan.active,
            ActiveIds {
                commerce: Some(7),
                start_point: Some(1),
                zone: Some(3),
            }
        );
    }

    #[test]
    fn summary_formats_totals_per_language() {
        let fr = plan_route(&route(), 7, Lang::Fr).summary;
        assert_eq!(fr.total_distance, "1,6 km");
        assert_eq!(fr.total_duration, "7 min");
        assert_eq!(fr.walking.unwrap().distance, "135 m");

        let en = plan_route(&route(), 7, Lang::En).summary;
        assert_eq!(en.total_distance, "1.6 km");
    }

    #[test]
    fn describe_step_lines() {
        let r = route();
        assert_eq!(describe_step(&r.steps[0], Lang::Fr), "Départ");
        assert_eq!(
            describe_step(&r.steps[1], Lang::Fr),
            "Tourner à droite sur Rue de Rivoli (400 m)"
        );
        assert_eq!(
            describe_step(&r.steps[1], Lang::En),
            "Turn right onto Rue de Rivoli (400 m)"
        );
    }

    #[test]
    fn describe_unknown_step_continues() {
        let step = Step {
            kind: "new name".to_string(),
            modifier: None,
            name: Some("  ".to_string()),
            distance: 1200.0,
        };
        assert_eq!(describe_step(&step, Lang::Fr), "Continuer (1,2 km)");
    }
}
