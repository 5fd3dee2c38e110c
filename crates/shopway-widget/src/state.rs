//! Per-instance application state.
//!
//! Fields are private with public getters. Writers are `pub(crate)` and only
//! the orchestrator calls them, so every transition goes through one entry
//! point.

use shopway_core::{Position, Route, TransportMode};
use uuid::Uuid;

use crate::map::{LayerId, MapHandle};
use crate::view_model::RouteSummary;

/// UI field a user-correctable error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Destination,
    Start,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Destination => write!(f, "destination"),
            Field::Start => write!(f, "start"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// The route currently drawn on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    pub commerce_id: i64,
    pub route: Route,
    pub summary: RouteSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawnLayers {
    pub vehicle: Option<LayerId>,
    pub walking: Option<LayerId>,
}

impl DrawnLayers {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicle.is_none() && self.walking.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    instance_id: Uuid,
    map: Option<MapHandle>,
    transport_mode: TransportMode,
    user_position: Option<Position>,
    start_position: Option<Position>,
    start_label: Option<String>,
    dest_position: Option<Position>,
    selected_commerce_id: Option<i64>,
    selected_zone_id: Option<i64>,
    active_route: Option<ActiveRoute>,
    layers: DrawnLayers,
    no_route: Option<i64>,
    field_errors: Vec<FieldError>,
    expanded: bool,
    sheet_expanded: bool,
}

impl AppState {
    #[must_use]
    pub fn new(transport_mode: TransportMode) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            map: None,
            transport_mode,
            user_position: None,
            start_position: None,
            start_label: None,
            dest_position: None,
            selected_commerce_id: None,
            selected_zone_id: None,
            active_route: None,
            layers: DrawnLayers::default(),
            no_route: None,
            field_errors: Vec::new(),
            expanded: false,
            sheet_expanded: false,
        }
    }

    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    #[must_use]
    pub fn map(&self) -> Option<MapHandle> {
        self.map
    }

    #[must_use]
    pub fn transport_mode(&self) -> TransportMode {
        self.transport_mode
    }

    #[must_use]
    pub fn user_position(&self) -> Option<Position> {
        self.user_position
    }

    #[must_use]
    pub fn start_position(&self) -> Option<Position> {
        self.start_position
    }

    #[must_use]
    pub fn start_label(&self) -> Option<&str> {
        self.start_label.as_deref()
    }

    #[must_use]
    pub fn dest_position(&self) -> Option<Position> {
        self.dest_position
    }

    #[must_use]
    pub fn selected_commerce_id(&self) -> Option<i64> {
        self.selected_commerce_id
    }

    #[must_use]
    pub fn selected_zone_id(&self) -> Option<i64> {
        self.selected_zone_id
    }

    #[must_use]
    pub fn active_route(&self) -> Option<&ActiveRoute> {
        self.active_route.as_ref()
    }

    #[must_use]
    pub fn layers(&self) -> DrawnLayers {
        self.layers
    }

    /// Commerce shown without a route because its delivery zone is missing.
    #[must_use]
    pub fn no_route(&self) -> Option<i64> {
        self.no_route
    }

    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    #[must_use]
    pub fn field_error(&self, field: Field) -> Option<&FieldError> {
        self.field_errors.iter().find(|e| e.field == field)
    }

    #[must_use]
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    #[must_use]
    pub fn sheet_expanded(&self) -> bool {
        self.sheet_expanded
    }

    /// True when nothing route related is selected, drawn or flagged.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.selected_commerce_id.is_none()
            && self.selected_zone_id.is_none()
            && self.dest_position.is_none()
            && self.active_route.is_none()
            && self.layers.is_empty()
            && self.no_route.is_none()
            && self.field_errors.is_empty()
    }

    pub(crate) fn set_map(&mut self, map: Option<MapHandle>) {
        self.map = map;
    }

    pub(crate) fn set_transport_mode(&mut self, mode: TransportMode) {
        self.transport_mode = mode;
    }

    pub(crate) fn set_user_position(&mut self, position: Position, label: Option<String>) {
        self.user_position = Some(position);
        self.set_start(position, label);
    }

    pub(crate) fn set_start(&mut self, position: Position, label: Option<String>) {
        self.start_position = Some(position);
        self.start_label = label;
        self.clear_field_error(Field::Start);
    }

    pub(crate) fn select(&mut self, commerce_id: i64, zone_id: Option<i64>, dest: Position) {
        self.selected_commerce_id = Some(commerce_id);
        self.selected_zone_id = zone_id;
        self.dest_position = Some(dest);
        self.no_route = None;
        self.clear_field_error(Field::Destination);
    }

    pub(crate) fn set_no_route(&mut self, commerce_id: Option<i64>) {
        self.no_route = commerce_id;
    }

    pub(crate) fn set_active_route(&mut self, route: Option<ActiveRoute>) {
        self.active_route = route;
    }

    pub(crate) fn set_layers(&mut self, layers: DrawnLayers) {
        self.layers = layers;
    }

    /// Replaces any error already attached to the same field.
    pub(crate) fn set_field_error(&mut self, field: Field, message: impl Into<String>) {
        self.clear_field_error(field);
        self.field_errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub(crate) fn clear_field_error(&mut self, field: Field) {
        self.field_errors.retain(|e| e.field != field);
    }

    pub(crate) fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    pub(crate) fn set_sheet_expanded(&mut self, expanded: bool) {
        self.sheet_expanded = expanded;
    }

    /// Forgets the selection and the drawn route. Start position, transport
    /// mode and UI flags survive.
    pub(crate) fn clear_selection(&mut self) {
        self.selected_commerce_id = None;
        self.selected_zone_id = None;
        self.dest_position = None;
        self.active_route = None;
        self.layers = DrawnLayers::default();
        self.no_route = None;
        self.field_errors.clear();
    }
}
