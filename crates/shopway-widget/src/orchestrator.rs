//! Route orchestration: selection, request correlation, drawing, reset.
//!
//! The orchestrator is the only writer of [`AppState`]. Network I/O is not
//! done here: [`RouteOrchestrator::begin_selection`] hands back a
//! [`PendingRequest`] carrying a fresh token, and the driver reports the
//! outcome through [`RouteOrchestrator::complete_selection`]. A response
//! whose token is no longer current is dropped.

use shopway_client::{RouteError, RouteRequest};
use shopway_core::{InitialPayload, Lang, Position, Route, TransportMode, WidgetConfig};

use crate::cluster::{ClusterConfig, ClusterManager};
use crate::error::WidgetError;
use crate::events::{Effect, EventBus, Signal, WidgetCommand};
use crate::map::{
    projection, FrameOptions, FrameTarget, MapBackend, MapController, MapHandle, Viewport,
};
use crate::rotation::BearingOptions;
use crate::sheet::{BottomSheet, DrawerHeight, SheetConfig, SheetOutput};
use crate::state::{ActiveRoute, AppState, DrawnLayers, Field};
use crate::view_model::plan_route;

/// Lower bound on fit-bounds padding after a route is drawn.
pub const MIN_ROUTE_PADDING_PX: f64 = 60.0;

const INITIAL_ZOOM: f64 = 13.0;
const ROUTE_MAX_ZOOM: f64 = 18.0;
const AREA_MAX_ZOOM: f64 = 17.0;
const AREA_PADDING_PX: f64 = 24.0;
const CLUSTER_PADDING_PX: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting { token: u64, commerce_id: i64 },
    Displayed,
}

/// A route request the driver has to perform.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub token: u64,
    pub request: RouteRequest,
}

/// What happened to a route response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Displayed,
    /// Superseded or arrived after unmount; ignored.
    Stale,
    Failed,
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub container: String,
    pub route_padding_px: f64,
    pub rotation_duration_ms: u64,
    pub cluster: ClusterConfig,
    pub sheet: SheetConfig,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            container: "shopway-map".to_string(),
            route_padding_px: MIN_ROUTE_PADDING_PX,
            rotation_duration_ms: 600,
            cluster: ClusterConfig::default(),
            sheet: SheetConfig::default(),
        }
    }
}

impl OrchestratorOptions {
    #[must_use]
    pub fn from_widget_config(config: &WidgetConfig, container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            route_padding_px: config.route_padding_px,
            rotation_duration_ms: config.rotation_duration_ms,
            cluster: ClusterConfig {
                radius_px: config.cluster_radius_px,
                disable_at_zoom: f64::from(config.cluster_disable_at_zoom),
            },
            sheet: SheetConfig::from_widget_config(config),
        }
    }
}

/// User-facing texts owned by the orchestrator.
#[derive(Debug, Clone, Copy)]
enum Notice {
    StartMissing,
    StartInvalid,
    UnknownCommerce,
    NoCoordinates,
}

impl Notice {
    fn text(self, lang: Lang) -> &'static str {
        match (self, lang) {
            (Notice::StartMissing, Lang::Fr) => "Choisissez un point de départ.",
            (Notice::StartMissing, Lang::En) => "Choose a starting point.",
            (Notice::StartInvalid, Lang::Fr) => "Position de départ invalide.",
            (Notice::StartInvalid, Lang::En) => "Invalid starting position.",
            (Notice::UnknownCommerce, Lang::Fr) => "Commerce introuvable.",
            (Notice::UnknownCommerce, Lang::En) => "Unknown shop.",
            (Notice::NoCoordinates, Lang::Fr) => "Ce commerce n'est pas localisé.",
            (Notice::NoCoordinates, Lang::En) => "This shop has no location.",
        }
    }
}

pub struct RouteOrchestrator<B> {
    state: AppState,
    phase: Phase,
    next_token: u64,
    map: MapController<B>,
    clusters: ClusterManager,
    sheet: BottomSheet,
    bus: EventBus,
    payload: InitialPayload,
    options: OrchestratorOptions,
    effects: Vec<Effect>,
    unmounted: bool,
}

impl<B: MapBackend> RouteOrchestrator<B> {
    pub fn new(
        backend: B,
        payload: InitialPayload,
        options: OrchestratorOptions,
        bus: EventBus,
    ) -> Self {
        let map = MapController::new(backend);
        let sheet = BottomSheet::new(options.sheet, map.viewport().height);
        Self {
            state: AppState::new(payload.settings.default_profile),
            phase: Phase::Idle,
            next_token: 0,
            map,
            clusters: ClusterManager::new(options.cluster),
            sheet,
            bus,
            payload,
            options,
            effects: Vec::new(),
            unmounted: false,
        }
    }

    /// Creates the map, fills the marker layer and frames the operating
    /// area.
    ///
    /// # Errors
    ///
    /// [`WidgetError::EmptyPayload`] when there is nothing to frame, or
    /// [`WidgetError::Map`] when the map cannot be created.
    pub fn mount(&mut self) -> Result<MapHandle, WidgetError> {
        let area = self
            .payload
            .operating_area()
            .ok_or(WidgetError::EmptyPayload)?;
        let handle = self.map.init(
            &self.options.container,
            projection::bounds_center(&area),
            INITIAL_ZOOM,
        )?;
        self.state.set_map(Some(handle));

        let count = self.clusters.rebuild(self.payload.commerces());
        self.clusters
            .set_overlays(&self.payload.start_points, &self.payload.delivery_zones);
        self.frame_operating_area();

        tracing::info!(
            instance = %self.state.instance_id(),
            map = %handle,
            commerces = count,
            "widget mounted"
        );
        Ok(handle)
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn sheet(&self) -> &BottomSheet {
        &self.sheet
    }

    #[must_use]
    pub fn clusters(&self) -> &ClusterManager {
        &self.clusters
    }

    #[must_use]
    pub fn map(&self) -> &MapController<B> {
        &self.map
    }

    #[must_use]
    pub fn payload(&self) -> &InitialPayload {
        &self.payload
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    fn lang(&self) -> Lang {
        self.payload.settings.lang
    }

    /// Records the visitor's origin. Invalid coordinates mark the start
    /// field instead.
    pub fn set_position(&mut self, lat: f64, lng: f64, label: Option<String>) {
        match Position::new(lat, lng) {
            Ok(position) => {
                tracing::debug!(%position, "start position ready");
                self.state.set_user_position(position, label);
            }
            Err(err) => {
                tracing::debug!(error = %err, "start position rejected");
                self.fail_field(Field::Start, Notice::StartInvalid.text(self.lang()));
            }
        }
    }

    /// Selection from the list: routes from the known start position.
    pub fn choose_commerce(&mut self, commerce_id: i64) -> Option<PendingRequest> {
        let Some(start) = self.state.start_position() else {
            self.fail_field(Field::Start, Notice::StartMissing.text(self.lang()));
            return None;
        };
        self.begin_selection(commerce_id, start)
    }

    /// Starts a route computation for `commerce_id` from `start`.
    ///
    /// Returns the request to perform, or `None` when no request is needed:
    /// unknown commerce (field error) or no configured delivery zone
    /// (details shown without a route). Any request already in flight is
    /// superseded.
    pub fn begin_selection(&mut self, commerce_id: i64, start: Position) -> Option<PendingRequest> {
        if self.unmounted {
            return None;
        }
        let lang = self.lang();

        let Some((destination, commerce)) = self.payload.find_commerce(commerce_id) else {
            tracing::debug!(commerce_id, "selection of unknown commerce");
            self.fail_field(Field::Destination, Notice::UnknownCommerce.text(lang));
            return None;
        };
        let destination_id = destination.id;
        let zone_id = commerce.delivery_zone_id;
        let dest = commerce
            .position()
            .or_else(|| Position::new(destination.lat, destination.lng).ok());
        let zone_known = zone_id.is_some_and(|id| self.payload.find_zone(id).is_some());

        let Some(dest) = dest else {
            self.fail_field(Field::Destination, Notice::NoCoordinates.text(lang));
            return None;
        };

        if self.state.start_position() != Some(start) {
            self.state.set_start(start, None);
        }
        self.state.select(commerce_id, zone_id, dest);

        if !zone_known {
            tracing::warn!(
                commerce_id,
                zone_id = ?zone_id,
                "commerce has no configured route, showing details only"
            );
            self.clear_route_display();
            self.phase = Phase::Idle;
            self.state.set_no_route(Some(commerce_id));
            self.sheet.route_unavailable(commerce_id);
            self.sync_sheet_flags();
            self.bus.emit(Signal::RouteUnavailable { commerce_id });
            return None;
        }

        self.next_token += 1;
        let token = self.next_token;
        if let Phase::Requesting {
            token: previous, ..
        } = self.phase
        {
            tracing::debug!(previous, token, "superseding in-flight route request");
        }
        self.phase = Phase::Requesting { token, commerce_id };

        let request = RouteRequest {
            start,
            profile: self.state.transport_mode(),
            commerce_id: Some(commerce_id),
            destination_id: Some(destination_id),
        };
        tracing::debug!(commerce_id, token, profile = %request.profile, "route requested");
        Some(PendingRequest { token, request })
    }

    /// Applies the outcome of the request identified by `token`.
    pub fn complete_selection(
        &mut self,
        token: u64,
        result: Result<Route, RouteError>,
    ) -> Completion {
        let commerce_id = match self.phase {
            Phase::Requesting {
                token: current,
                commerce_id,
            } if current == token && self.state.selected_commerce_id() == Some(commerce_id) => {
                commerce_id
            }
            _ => {
                tracing::trace!(token, "dropping stale route response");
                return Completion::Stale;
            }
        };

        let route = match result.and_then(|r| r.into_drawable().ok_or(RouteError::EmptyGeometry)) {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!(commerce_id, token, error = %err, "route request failed");
                self.phase = Phase::Idle;
                self.fail_field(Field::Destination, err.user_message(self.lang()));
                return Completion::Failed;
            }
        };

        self.display_route(commerce_id, route);
        Completion::Displayed
    }

    fn display_route(&mut self, commerce_id: i64, route: Route) {
        let plan = plan_route(&route, commerce_id, self.lang());

        self.remove_route_layers();
        let vehicle = plan
            .vehicle
            .as_ref()
            .and_then(|spec| self.map.draw_polyline(&spec.points, &spec.style));
        let walking = plan
            .walking
            .as_ref()
            .and_then(|spec| self.map.draw_polyline(&spec.points, &spec.style));
        self.state.set_layers(DrawnLayers { vehicle, walking });

        if let Some(bounds) = plan.frame {
            self.map.frame(
                FrameTarget::Bounds(bounds),
                FrameOptions {
                    padding_px: self.options.route_padding_px.max(MIN_ROUTE_PADDING_PX),
                    max_zoom: Some(ROUTE_MAX_ZOOM),
                },
            );
        }
        if let Some(bearing) = plan.bearing {
            self.map.set_bearing(
                bearing,
                BearingOptions::animated(self.options.rotation_duration_ms),
            );
        }

        self.clusters.mask_to_active(plan.active);
        self.redraw_markers();

        self.state.set_active_route(Some(ActiveRoute {
            commerce_id,
            route,
            summary: plan.summary.clone(),
        }));
        self.phase = Phase::Displayed;

        let outputs = self.sheet.route_computed(commerce_id);
        self.apply_sheet_outputs(outputs);

        tracing::info!(
            commerce_id,
            distance = %plan.summary.total_distance,
            duration = %plan.summary.total_duration,
            "route displayed"
        );
        self.bus.emit(Signal::RouteComputed {
            commerce_id,
            summary: plan.summary,
        });
    }

    /// Clears the route and returns the camera to the operating area.
    ///
    /// Returns `false` when there was nothing to clear; the state is then
    /// left untouched.
    pub fn reset(&mut self) -> bool {
        if self.unmounted
            || (self.phase == Phase::Idle
                && self.state.is_pristine()
                && !self.clusters.is_masked()
                && !self.sheet.view().is_route())
        {
            tracing::trace!("reset on idle widget ignored");
            return false;
        }

        self.remove_route_layers();
        self.clusters.unmask();
        self.state.clear_selection();
        self.phase = Phase::Idle;
        self.map.reset_bearing(BearingOptions::animated(
            self.options.rotation_duration_ms,
        ));
        let outputs = self.sheet.route_stopped();
        self.apply_sheet_outputs(outputs);
        self.frame_operating_area();

        tracing::info!(instance = %self.state.instance_id(), "route reset");
        true
    }

    /// Switches the routing profile. A selected route is recomputed.
    pub fn set_transport_mode(&mut self, mode: TransportMode) -> Option<PendingRequest> {
        if self.state.transport_mode() == mode {
            return None;
        }
        self.state.set_transport_mode(mode);
        tracing::debug!(%mode, "transport mode changed");

        let routed = matches!(self.phase, Phase::Requesting { .. } | Phase::Displayed);
        match (routed, self.state.selected_commerce_id(), self.state.start_position()) {
            (true, Some(commerce_id), Some(start)) => self.begin_selection(commerce_id, start),
            _ => None,
        }
    }

    /// Frames the bounds of a cluster from the last marker layout.
    pub fn zoom_to_cluster(&mut self, index: usize) -> bool {
        let Some(bounds) = self.clusters.cluster_bounds(index) else {
            tracing::trace!(index, "click on unknown cluster");
            return false;
        };
        self.map.frame(
            FrameTarget::Bounds(bounds),
            FrameOptions {
                padding_px: CLUSTER_PADDING_PX,
                max_zoom: None,
            },
        );
        self.redraw_markers();
        true
    }

    /// Follows a camera move made by the visitor and re-clusters the
    /// markers for the new zoom.
    pub fn view_changed(&mut self, center: Position, zoom: f64) {
        self.map
            .frame(FrameTarget::Center { center, zoom }, FrameOptions::default());
        tracing::trace!(%center, zoom, "map view changed");
        self.redraw_markers();
    }

    /// Dispatches one inbound command; follow-up work lands in the effect
    /// queue.
    pub fn handle(&mut self, command: WidgetCommand) {
        if self.unmounted {
            tracing::trace!(?command, "command after unmount ignored");
            return;
        }
        match command {
            WidgetCommand::Signal(Signal::PositionReady { lat, lng, label }) => {
                self.set_position(lat, lng, Some(label));
            }
            WidgetCommand::Signal(Signal::CommerceChosen { commerce_id }) => {
                if let Some(pending) = self.choose_commerce(commerce_id) {
                    self.effects.push(Effect::Fetch(pending));
                }
            }
            WidgetCommand::Signal(Signal::StopRoute) => {
                self.reset();
            }
            WidgetCommand::Signal(signal) => {
                tracing::trace!(?signal, "outbound signal received as input, ignored");
            }
            WidgetCommand::Sheet(input) => {
                let outputs = self.sheet.input(input);
                self.apply_sheet_outputs(outputs);
            }
            WidgetCommand::Pointer(input) => {
                let outputs = self.sheet.pointer(input);
                self.apply_sheet_outputs(outputs);
            }
            WidgetCommand::ClusterClicked(index) => {
                self.zoom_to_cluster(index);
            }
            WidgetCommand::SetTransportMode(mode) => {
                if let Some(pending) = self.set_transport_mode(mode) {
                    self.effects.push(Effect::Fetch(pending));
                }
            }
            WidgetCommand::ViewChanged { center, zoom } => {
                self.view_changed(center, zoom);
            }
            WidgetCommand::Resize { width, height } => {
                self.map.resize(Viewport { width, height });
                self.sheet.resize(height);
                self.redraw_markers();
            }
            WidgetCommand::ToggleExpanded => {
                self.state.set_expanded(!self.state.expanded());
            }
            WidgetCommand::Unmount => self.unmount(),
        }
    }

    /// Takes the queued effects.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn collapse_timer_fired(&mut self) {
        if self.sheet.collapse_timer_fired() {
            self.sync_sheet_flags();
        }
    }

    /// Detaches the drag machine and destroys the map. Responses still in
    /// flight become stale.
    pub fn unmount(&mut self) {
        if self.unmounted {
            return;
        }
        self.sheet.detach();
        self.map.destroy();
        self.state.set_map(None);
        self.phase = Phase::Idle;
        self.effects.clear();
        self.unmounted = true;
        tracing::info!(instance = %self.state.instance_id(), "widget unmounted");
    }

    fn apply_sheet_outputs(&mut self, outputs: Vec<SheetOutput>) {
        for output in outputs {
            match output {
                SheetOutput::CommerceChosen(commerce_id) => {
                    self.bus.emit(Signal::CommerceChosen { commerce_id });
                    if let Some(pending) = self.choose_commerce(commerce_id) {
                        self.effects.push(Effect::Fetch(pending));
                    }
                }
                SheetOutput::StopRoute => {
                    self.bus.emit(Signal::StopRoute);
                    self.reset();
                }
                SheetOutput::ScheduleCollapse(delay) => {
                    self.effects.push(Effect::ScheduleCollapse(delay));
                }
                SheetOutput::CancelCollapse => self.effects.push(Effect::CancelCollapse),
                SheetOutput::Snapped(_) => {}
            }
        }
        self.sync_sheet_flags();
    }

    fn sync_sheet_flags(&mut self) {
        self.state
            .set_sheet_expanded(self.sheet.drawer() == DrawerHeight::Open);
    }

    fn fail_field(&mut self, field: Field, message: impl Into<String>) {
        let message = message.into();
        self.state.set_field_error(field, message.clone());
        self.bus.emit(Signal::RouteFailed { field, message });
    }

    fn remove_route_layers(&mut self) {
        let layers = self.state.layers();
        for id in [layers.vehicle, layers.walking].into_iter().flatten() {
            self.map.remove_layer(id);
        }
        self.state.set_layers(DrawnLayers::default());
    }

    fn clear_route_display(&mut self) {
        self.remove_route_layers();
        self.state.set_active_route(None);
        if self.clusters.is_masked() {
            self.clusters.unmask();
            self.redraw_markers();
        }
    }

    fn redraw_markers(&mut self) {
        let markers = self.clusters.layout(self.map.zoom());
        self.map.render_markers(&markers);
        let polygons = self.clusters.polygons();
        self.map.render_polygons(&polygons);
    }

    fn frame_operating_area(&mut self) {
        if let Some(area) = self.payload.operating_area() {
            self.map.frame(
                FrameTarget::Bounds(area),
                FrameOptions {
                    padding_px: AREA_PADDING_PX,
                    max_zoom: Some(AREA_MAX_ZOOM),
                },
            );
        }
        self.redraw_markers();
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
