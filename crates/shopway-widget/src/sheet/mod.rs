//! Bottom sheet: a four-view machine plus an orthogonal drawer height.
//!
//! View transitions come from taps and from orchestrator notifications;
//! drawer height comes from drags ([`drag`]) and the auto-collapse timer.
//! Inputs that do not apply to the current view are ignored.

pub mod drag;

use std::time::Duration;

use shopway_core::WidgetConfig;

use self::drag::{snap_target, DragMachine, DragOutcome, PointerInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetView {
    List,
    Detail { commerce_id: i64 },
    RouteMini { commerce_id: i64 },
    RouteDetail { commerce_id: i64 },
}

impl SheetView {
    #[must_use]
    pub fn is_route(&self) -> bool {
        matches!(self, SheetView::RouteMini { .. } | SheetView::RouteDetail { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrawerHeight {
    Closed,
    Peek,
    Open,
}

impl DrawerHeight {
    #[must_use]
    pub fn raised(self) -> Self {
        match self {
            DrawerHeight::Closed => DrawerHeight::Peek,
            DrawerHeight::Peek | DrawerHeight::Open => DrawerHeight::Open,
        }
    }

    #[must_use]
    pub fn lowered(self) -> Self {
        match self {
            DrawerHeight::Open => DrawerHeight::Peek,
            DrawerHeight::Peek | DrawerHeight::Closed => DrawerHeight::Closed,
        }
    }

    /// Collapsing never grows a closed drawer.
    #[must_use]
    pub fn collapsed(self) -> Self {
        self.min(DrawerHeight::Peek)
    }

    #[must_use]
    pub fn fraction(self, config: &SheetConfig) -> f64 {
        match self {
            DrawerHeight::Closed => 0.0,
            DrawerHeight::Peek => config.peek_fraction,
            DrawerHeight::Open => config.open_fraction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BottomSheetState {
    pub view: SheetView,
    pub drawer: DrawerHeight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetConfig {
    pub peek_fraction: f64,
    pub open_fraction: f64,
    /// Fling threshold in px/ms.
    pub snap_velocity: f64,
    pub collapse_delay: Duration,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            peek_fraction: 0.35,
            open_fraction: 0.92,
            snap_velocity: 0.5,
            collapse_delay: Duration::from_millis(400),
        }
    }
}

impl SheetConfig {
    #[must_use]
    pub fn from_widget_config(config: &WidgetConfig) -> Self {
        Self {
            peek_fraction: config.sheet_peek_fraction,
            open_fraction: config.sheet_open_fraction,
            snap_velocity: config.snap_velocity,
            collapse_delay: config.collapse_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetInput {
    TapItem { commerce_id: i64 },
    Back,
    Choose { commerce_id: i64 },
    View,
    Stop,
}

/// What the sheet asks of the outside world after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetOutput {
    CommerceChosen(i64),
    StopRoute,
    ScheduleCollapse(Duration),
    CancelCollapse,
    /// A released drag settled the drawer.
    Snapped(DrawerHeight),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BottomSheet {
    config: SheetConfig,
    state: BottomSheetState,
    viewport_height: f64,
    live_height_px: Option<f64>,
    drag: DragMachine,
    collapse_pending: bool,
}

impl BottomSheet {
    #[must_use]
    pub fn new(config: SheetConfig, viewport_height: f64) -> Self {
        Self {
            config,
            state: BottomSheetState {
                view: SheetView::List,
                drawer: DrawerHeight::Peek,
            },
            viewport_height,
            live_height_px: None,
            drag: DragMachine::new(),
            collapse_pending: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> BottomSheetState {
        self.state
    }

    #[must_use]
    pub fn view(&self) -> SheetView {
        self.state.view
    }

    #[must_use]
    pub fn drawer(&self) -> DrawerHeight {
        self.state.drawer
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Current height in pixels, following the finger during a drag.
    #[must_use]
    pub fn height_px(&self) -> f64 {
        self.live_height_px
            .unwrap_or_else(|| self.state.drawer.fraction(&self.config) * self.viewport_height)
    }

    pub fn input(&mut self, input: SheetInput) -> Vec<SheetOutput> {
        let view = self.state.view;
        match (view, input) {
            (SheetView::List, SheetInput::TapItem { commerce_id }) => {
                self.state.view = SheetView::Detail { commerce_id };
                Vec::new()
            }
            (SheetView::Detail { .. }, SheetInput::Back) => {
                self.state.view = SheetView::List;
                Vec::new()
            }
            (SheetView::RouteDetail { commerce_id }, SheetInput::Back) => {
                self.state.view = SheetView::RouteMini { commerce_id };
                Vec::new()
            }
            (SheetView::List | SheetView::Detail { .. }, SheetInput::Choose { commerce_id }) => {
                self.collapse();
                vec![SheetOutput::CommerceChosen(commerce_id)]
            }
            (SheetView::RouteMini { commerce_id }, SheetInput::View) => {
                self.state.view = SheetView::RouteDetail { commerce_id };
                Vec::new()
            }
            (SheetView::RouteMini { .. } | SheetView::RouteDetail { .. }, SheetInput::Stop) => {
                self.state.view = SheetView::List;
                let mut out = vec![SheetOutput::StopRoute];
                if std::mem::take(&mut self.collapse_pending) {
                    out.push(SheetOutput::CancelCollapse);
                }
                out
            }
            (view, input) => {
                tracing::trace!(?view, ?input, "sheet input ignored");
                Vec::new()
            }
        }
    }

    /// A route is on the map: show the mini summary and collapse shortly.
    pub fn route_computed(&mut self, commerce_id: i64) -> Vec<SheetOutput> {
        self.state.view = SheetView::RouteMini { commerce_id };
        self.collapse_pending = true;
        vec![SheetOutput::ScheduleCollapse(self.config.collapse_delay)]
    }

    /// The commerce has no route: show its details alone.
    pub fn route_unavailable(&mut self, commerce_id: i64) {
        self.state.view = SheetView::Detail { commerce_id };
    }

    /// Back to the list after the route was stopped from outside the sheet.
    pub fn route_stopped(&mut self) -> Vec<SheetOutput> {
        if self.state.view.is_route() {
            self.state.view = SheetView::List;
        }
        if std::mem::take(&mut self.collapse_pending) {
            vec![SheetOutput::CancelCollapse]
        } else {
            Vec::new()
        }
    }

    /// Returns `true` when the drawer moved. A drag in progress wins.
    pub fn collapse_timer_fired(&mut self) -> bool {
        if !std::mem::take(&mut self.collapse_pending) || self.drag.is_dragging() {
            return false;
        }
        let before = self.state.drawer;
        self.collapse();
        before != self.state.drawer
    }

    fn collapse(&mut self) {
        self.state.drawer = self.state.drawer.collapsed();
    }

    /// Feeds a pointer event to the drag machine.
    ///
    /// A drag takes over from a pending auto-collapse, which is cancelled
    /// when the drag starts. A release reports the snapped height.
    pub fn pointer(&mut self, input: PointerInput) -> Vec<SheetOutput> {
        let current = self.height_px();
        match self.drag.handle(input, current, self.viewport_height) {
            DragOutcome::Started => {
                self.live_height_px = Some(current);
                if std::mem::take(&mut self.collapse_pending) {
                    tracing::trace!("drag started, pending collapse cancelled");
                    vec![SheetOutput::CancelCollapse]
                } else {
                    Vec::new()
                }
            }
            DragOutcome::Moved { height_px } => {
                self.live_height_px = Some(height_px);
                Vec::new()
            }
            DragOutcome::Released {
                height_px,
                velocity,
            } => {
                self.live_height_px = None;
                let fraction = if self.viewport_height > 0.0 {
                    height_px / self.viewport_height
                } else {
                    0.0
                };
                let target = snap_target(fraction, velocity, &self.config);
                tracing::trace!(fraction, velocity, ?target, "drawer snapped");
                self.state.drawer = target;
                vec![SheetOutput::Snapped(target)]
            }
            DragOutcome::Cancelled { .. } => {
                self.live_height_px = None;
                Vec::new()
            }
            DragOutcome::Ignored => Vec::new(),
        }
    }

    pub fn resize(&mut self, viewport_height: f64) {
        self.viewport_height = viewport_height.max(0.0);
    }

    /// Detaches pointer handling for good.
    pub fn detach(&mut self) {
        self.drag.detach();
        self.live_height_px = None;
        self.collapse_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::drag::PointerPhase;
    use super::*;

    fn sheet() -> BottomSheet {
        BottomSheet::new(SheetConfig::default(), 800.0)
    }

    fn pointer(phase: PointerPhase, y: f64, t: f64) -> PointerInput {
        PointerInput {
            pointer_id: 1,
            client_y: y,
            time_ms: t,
            phase,
        }
    }

    fn press() -> PointerPhase {
        PointerPhase::Down {
            on_interactive: false,
            content_scroll_top: 0.0,
        }
    }

    fn snapped(outputs: &[SheetOutput]) -> Option<DrawerHeight> {
        outputs.iter().find_map(|out| match out {
            SheetOutput::Snapped(drawer) => Some(*drawer),
            _ => None,
        })
    }

    /// Drags from the peek height to `target_px` slowly, then releases.
    fn slow_drag_to(sheet: &mut BottomSheet, target_px: f64) -> Option<DrawerHeight> {
        let start = sheet.height_px();
        sheet.pointer(pointer(press(), 500.0, 0.0));
        let end_y = 500.0 - (target_px - start);
        sheet.pointer(pointer(PointerPhase::Move, end_y, 500.0));
        snapped(&sheet.pointer(pointer(PointerPhase::Up, end_y, 1000.0)))
    }

    /// Quick upward flick from peek; lands on `Open`.
    fn fling_open(sheet: &mut BottomSheet) {
        sheet.pointer(pointer(press(), 500.0, 0.0));
        sheet.pointer(pointer(PointerPhase::Up, 400.0, 50.0));
        assert_eq!(sheet.drawer(), DrawerHeight::Open);
    }

    #[test]
    fn starts_on_list_at_peek() {
        let s = sheet();
        assert_eq!(
            s.state(),
            BottomSheetState {
                view: SheetView::List,
                drawer: DrawerHeight::Peek,
            }
        );
        assert_relative_eq!(s.height_px(), 280.0);
    }

    #[test]
    fn list_detail_back() {
        let mut s = sheet();
        assert!(s.input(SheetInput::TapItem { commerce_id: 7 }).is_empty());
        assert_eq!(s.view(), SheetView::Detail { commerce_id: 7 });
        s.input(SheetInput::Back);
        assert_eq!(s.view(), SheetView::List);
    }

    #[test]
    fn choose_emits_and_collapses() {
        let mut s = sheet();
        fling_open(&mut s);
        let out = s.input(SheetInput::Choose { commerce_id: 7 });
        assert_eq!(out, vec![SheetOutput::CommerceChosen(7)]);
        assert_eq!(s.drawer(), DrawerHeight::Peek);
    }

    #[test]
    fn route_views_round_trip() {
        let mut s = sheet();
        let out = s.route_computed(7);
        assert_eq!(
            out,
            vec![SheetOutput::ScheduleCollapse(Duration::from_millis(400))]
        );
        assert_eq!(s.view(), SheetView::RouteMini { commerce_id: 7 });
        s.input(SheetInput::View);
        assert_eq!(s.view(), SheetView::RouteDetail { commerce_id: 7 });
        s.input(SheetInput::Back);
        assert_eq!(s.view(), SheetView::RouteMini { commerce_id: 7 });
    }

    #[test]
    fn stop_from_route_view_returns_to_list() {
        let mut s = sheet();
        s.route_computed(7);
        s.input(SheetInput::View);
        let out = s.input(SheetInput::Stop);
        assert_eq!(
            out,
            vec![SheetOutput::StopRoute, SheetOutput::CancelCollapse]
        );
        assert_eq!(s.view(), SheetView::List);
    }

    #[test]
    fn invalid_inputs_are_ignored() {
        let mut s = sheet();
        assert!(s.input(SheetInput::Stop).is_empty());
        assert!(s.input(SheetInput::View).is_empty());
        assert!(s.input(SheetInput::Back).is_empty());
        assert_eq!(s.view(), SheetView::List);

        s.route_computed(7);
        assert!(s.input(SheetInput::TapItem { commerce_id: 8 }).is_empty());
        assert!(s.input(SheetInput::Choose { commerce_id: 8 }).is_empty());
        assert_eq!(s.view(), SheetView::RouteMini { commerce_id: 7 });
    }

    #[test]
    fn collapse_timer_fires_once() {
        let mut s = sheet();
        fling_open(&mut s);
        s.route_computed(7);
        assert!(s.collapse_timer_fired());
        assert_eq!(s.drawer(), DrawerHeight::Peek);
        assert!(!s.collapse_timer_fired());
    }

    #[test]
    fn drag_after_route_cancels_pending_collapse() {
        let mut s = sheet();
        s.route_computed(7);

        let out = s.pointer(pointer(press(), 500.0, 0.0));
        assert_eq!(out, vec![SheetOutput::CancelCollapse]);
        s.pointer(pointer(PointerPhase::Move, 200.0, 300.0));
        let out = s.pointer(pointer(PointerPhase::Up, 200.0, 600.0));
        assert_eq!(out, vec![SheetOutput::Snapped(DrawerHeight::Open)]);

        assert!(!s.collapse_timer_fired());
        assert_eq!(s.drawer(), DrawerHeight::Open);
    }

    #[test]
    fn drag_without_pending_collapse_emits_nothing_on_press() {
        let mut s = sheet();
        assert!(s.pointer(pointer(press(), 500.0, 0.0)).is_empty());
    }

    #[test]
    fn collapse_never_grows_closed_drawer() {
        assert_eq!(DrawerHeight::Closed.collapsed(), DrawerHeight::Closed);
        assert_eq!(DrawerHeight::Open.collapsed(), DrawerHeight::Peek);
    }

    #[test]
    fn slow_release_at_ten_percent_closes() {
        let mut s = sheet();
        assert_eq!(slow_drag_to(&mut s, 80.0), Some(DrawerHeight::Closed));
        assert_eq!(s.drawer(), DrawerHeight::Closed);
    }

    #[test]
    fn slow_release_at_half_peeks() {
        let mut s = sheet();
        assert_eq!(slow_drag_to(&mut s, 400.0), Some(DrawerHeight::Peek));
    }

    #[test]
    fn fast_upward_release_at_forty_percent_opens() {
        let mut s = sheet();
        s.pointer(pointer(press(), 500.0, 0.0));
        s.pointer(pointer(PointerPhase::Move, 480.0, 30.0));
        assert_relative_eq!(s.height_px(), 300.0);
        let out = s.pointer(pointer(PointerPhase::Up, 460.0, 60.0));
        assert_eq!(snapped(&out), Some(DrawerHeight::Open));
    }

    #[test]
    fn detach_stops_dragging() {
        let mut s = sheet();
        s.pointer(pointer(press(), 500.0, 0.0));
        assert!(s.is_dragging());
        s.detach();
        assert!(!s.is_dragging());
        assert!(s.pointer(pointer(PointerPhase::Up, 100.0, 50.0)).is_empty());
        assert_relative_eq!(s.height_px(), 280.0);
    }
}
