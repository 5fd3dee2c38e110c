//! Pointer-drag machine for the drawer height.
//!
//! Two states, `Idle` and `Dragging`. Only one pointer may drive a drag; the
//! capture ends on both pointer-up and pointer-cancel.

use std::collections::VecDeque;

use super::{DrawerHeight, SheetConfig};

/// Velocity is measured over this trailing window before release.
pub const VELOCITY_WINDOW_MS: f64 = 100.0;

/// Highest live drawer height, as a fraction of the viewport.
pub const MAX_HEIGHT_FRACTION: f64 = 0.95;

/// Release below this fraction lands on `Closed`.
pub const CLOSED_BAND: f64 = 0.15;

/// Release above this fraction lands on `Open`.
pub const OPEN_BAND: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerPhase {
    /// Pointer pressed on the handle or header.
    Down {
        on_interactive: bool,
        content_scroll_top: f64,
    },
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: u32,
    pub client_y: f64,
    pub time_ms: f64,
    pub phase: PointerPhase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    Ignored,
    Started,
    Moved { height_px: f64 },
    /// `velocity` is in px/ms, positive when the drawer grows.
    Released { height_px: f64, velocity: f64 },
    Cancelled { restore_px: f64 },
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging {
        pointer_id: u32,
        start_y: f64,
        start_height: f64,
        samples: VecDeque<(f64, f64)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragMachine {
    state: DragState,
    detached: bool,
}

impl Default for DragMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DragMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            detached: false,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Drops any drag in progress and ignores all further input.
    pub fn detach(&mut self) {
        self.state = DragState::Idle;
        self.detached = true;
    }

    pub fn handle(
        &mut self,
        input: PointerInput,
        current_height_px: f64,
        viewport_height: f64,
    ) -> DragOutcome {
        if self.detached {
            return DragOutcome::Ignored;
        }
        let max_height = (viewport_height * MAX_HEIGHT_FRACTION).max(0.0);

        match (&mut self.state, input.phase) {
            (
                DragState::Idle,
                PointerPhase::Down {
                    on_interactive,
                    content_scroll_top,
                },
            ) => {
                if on_interactive || content_scroll_top > 0.0 {
                    return DragOutcome::Ignored;
                }
                let mut samples = VecDeque::new();
                samples.push_back((input.time_ms, input.client_y));
                self.state = DragState::Dragging {
                    pointer_id: input.pointer_id,
                    start_y: input.client_y,
                    start_height: current_height_px,
                    samples,
                };
                DragOutcome::Started
            }
            (
                DragState::Dragging {
                    pointer_id,
                    start_y,
                    start_height,
                    samples,
                },
                PointerPhase::Move,
            ) if *pointer_id == input.pointer_id => {
                let height_px =
                    (*start_height + (*start_y - input.client_y)).clamp(0.0, max_height);
                record_sample(samples, input.time_ms, input.client_y);
                DragOutcome::Moved { height_px }
            }
            (
                DragState::Dragging {
                    pointer_id,
                    start_y,
                    start_height,
                    samples,
                },
                PointerPhase::Up,
            ) if *pointer_id == input.pointer_id => {
                let height_px =
                    (*start_height + (*start_y - input.client_y)).clamp(0.0, max_height);
                record_sample(samples, input.time_ms, input.client_y);
                let velocity = release_velocity(samples);
                self.state = DragState::Idle;
                DragOutcome::Released {
                    height_px,
                    velocity,
                }
            }
            (
                DragState::Dragging {
                    pointer_id,
                    start_height,
                    ..
                },
                PointerPhase::Cancel,
            ) if *pointer_id == input.pointer_id => {
                let restore_px = *start_height;
                self.state = DragState::Idle;
                DragOutcome::Cancelled { restore_px }
            }
            _ => DragOutcome::Ignored,
        }
    }
}

fn record_sample(samples: &mut VecDeque<(f64, f64)>, time_ms: f64, client_y: f64) {
    samples.push_back((time_ms, client_y));
    while samples
        .front()
        .is_some_and(|(t, _)| *t < time_ms - VELOCITY_WINDOW_MS)
    {
        samples.pop_front();
    }
}

/// Upward speed between the oldest and newest sample of the window.
fn release_velocity(samples: &VecDeque<(f64, f64)>) -> f64 {
    let (Some(&(t0, y0)), Some(&(t1, y1))) = (samples.front(), samples.back()) else {
        return 0.0;
    };
    let dt = t1 - t0;
    if dt <= 0.0 {
        return 0.0;
    }
    (y0 - y1) / dt
}

/// Drawer state a release at `fraction` of the viewport settles on.
///
/// A fling faster than `snap_velocity` moves one state from the release band
/// in the direction of motion; a slow release keeps the band.
#[must_use]
pub fn snap_target(fraction: f64, velocity: f64, config: &SheetConfig) -> DrawerHeight {
    let band = if fraction < CLOSED_BAND {
        DrawerHeight::Closed
    } else if fraction <= OPEN_BAND {
        DrawerHeight::Peek
    } else {
        DrawerHeight::Open
    };

    if velocity.abs() > config.snap_velocity {
        if velocity > 0.0 {
            band.raised()
        } else {
            band.lowered()
        }
    } else {
        band
    }
}
