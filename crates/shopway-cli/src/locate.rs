//! Command handlers for the CLI.
//!
//! `route` mounts a headless widget against the configured payload and route
//! backend and runs one selection; `nearest` and `check` only read the
//! payload.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use shopway_client::RouteClient;
use shopway_core::{
    format_distance_in, load_payload, nearest_commerces, Position, TransportMode, WidgetConfig,
};
use shopway_widget::{
    Completion, EventBus, HeadlessMap, MarkerView, OrchestratorOptions, RouteOrchestrator,
    RouteSummary, Viewport, Widget,
};

const CONTAINER: &str = "shopway-map";

/// Compute the route to `commerce_id` from `start` and print it.
///
/// # Errors
///
/// Returns an error if the payload or client cannot be loaded, the map cannot
/// be mounted, or the route request fails.
pub(crate) async fn run_route(
    config: &WidgetConfig,
    commerce_id: i64,
    (lat, lng): (f64, f64),
    profile: Option<TransportMode>,
    json: bool,
) -> anyhow::Result<()> {
    tracing::debug!(?config, "widget config loaded");
    let payload = load_payload(&config.payload_path)?;
    let client = RouteClient::new(
        &config.api_base_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    let start = Position::new(lat, lng)?;

    let mut orchestrator = RouteOrchestrator::new(
        HeadlessMap::new(Viewport::default()),
        payload,
        OrchestratorOptions::from_widget_config(config, CONTAINER),
        EventBus::default(),
    );
    orchestrator.mount().context("failed to mount map")?;
    if let Some(mode) = profile {
        orchestrator.set_transport_mode(mode);
    }

    let mut widget = Widget::new(orchestrator, Arc::new(client), config.request_timeout());
    let outcome = widget.select_destination(commerce_id, start).await;
    let orchestrator = widget.into_orchestrator();
    let state = orchestrator.state();

    if outcome != Some(Completion::Displayed) {
        if state.no_route() == Some(commerce_id) {
            println!("Commerce {commerce_id} has no delivery route configured.");
            return Ok(());
        }
        let reason = state.field_errors().first().map_or_else(
            || "route unavailable".to_string(),
            |e| format!("{}: {}", e.field, e.message),
        );
        anyhow::bail!("route to commerce {commerce_id} failed: {reason}");
    }

    let active = state
        .active_route()
        .context("route displayed without an active route")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&active.summary)?);
        return Ok(());
    }

    print_summary(&active.summary);

    let map = orchestrator.map();
    let center = map.center();
    println!(
        "Frame: center {:.5},{:.5}  zoom {}  bearing {:.0}",
        center.lat(),
        center.lng(),
        map.zoom(),
        map.bearing()
    );
    for marker in map.backend().markers() {
        if let Some(line) = describe_marker(marker) {
            println!("  {line}");
        }
    }

    Ok(())
}

fn print_summary(summary: &RouteSummary) {
    println!(
        "Route to commerce {}: {} in {}",
        summary.commerce_id, summary.total_distance, summary.total_duration
    );
    if let Some(vehicle) = &summary.vehicle {
        println!("  vehicle: {} ({})", vehicle.distance, vehicle.duration);
    }
    if let Some(walking) = &summary.walking {
        println!("  walking: {} ({})", walking.distance, walking.duration);
    }
    for (index, step) in summary.steps.iter().enumerate() {
        println!("  {:>2}. {step}", index + 1);
    }
}

/// One line per visible marker; hidden markers are skipped.
fn describe_marker(marker: &MarkerView) -> Option<String> {
    match marker {
        MarkerView::Single {
            key,
            position,
            opacity,
        } if *opacity > 0.0 => Some(format!(
            "{:?} #{} at {:.5},{:.5}",
            key.kind,
            key.id,
            position.lat(),
            position.lng()
        )),
        MarkerView::Cluster { count, center, .. } => Some(format!(
            "cluster of {count} at {:.5},{:.5}",
            center.lat(),
            center.lng()
        )),
        MarkerView::Single { .. } => None,
    }
}

/// List the `limit` commerces nearest to a position.
///
/// # Errors
///
/// Returns an error if the payload cannot be loaded or the position is out
/// of range.
pub(crate) fn run_nearest(path: &Path, (lat, lng): (f64, f64), limit: usize) -> anyhow::Result<()> {
    let payload = load_payload(path)?;
    let from = Position::new(lat, lng)?;
    let lang = payload.settings.lang;

    let ranked = nearest_commerces(&payload, from, limit);
    if ranked.is_empty() {
        println!("No located commerces in {}.", path.display());
        return Ok(());
    }
    for (meters, commerce) in ranked {
        let route = if commerce.delivery_zone_id.is_some() {
            ""
        } else {
            "  (no delivery route)"
        };
        println!(
            "{:>9}  #{} {}{route}",
            format_distance_in(meters, lang),
            commerce.id,
            commerce.name
        );
    }
    Ok(())
}

/// Load and validate the payload, then print what it contains.
///
/// # Errors
///
/// Returns an error if the payload cannot be read, parsed, or validated.
pub(crate) fn run_check(path: &Path) -> anyhow::Result<()> {
    let payload = load_payload(path)?;

    let commerces = payload.commerces().count();
    let unrouted = payload
        .commerces()
        .filter(|c| c.delivery_zone_id.is_none())
        .count();
    println!("Payload {} is valid.", path.display());
    println!("  destinations:   {}", payload.destinations.len());
    println!("  commerces:      {commerces} ({unrouted} without delivery zone)");
    println!("  start points:   {}", payload.start_points.len());
    println!("  delivery zones: {}", payload.delivery_zones.len());
    println!(
        "  default mode:   {}  lang: {}",
        payload.settings.default_profile, payload.settings.lang
    );
    if let Some(area) = payload.operating_area() {
        println!(
            "  operating area: {:.5},{:.5} .. {:.5},{:.5}",
            area.south, area.west, area.north, area.east
        );
    }
    Ok(())
}
