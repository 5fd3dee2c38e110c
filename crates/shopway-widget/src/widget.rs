//! Async driver around a [`RouteOrchestrator`].
//!
//! One task, one `select!` loop: inbound commands, in-flight route fetches
//! tagged with their token, and the drawer collapse timer. The orchestrator
//! itself never awaits.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use shopway_client::{RouteError, RouteRequest, RouteSource};
use shopway_core::{Position, Route};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::events::{Effect, WidgetCommand};
use crate::map::MapBackend;
use crate::orchestrator::{Completion, PendingRequest, RouteOrchestrator};

type TaggedFetch = BoxFuture<'static, (u64, Result<Route, RouteError>)>;

pub struct Widget<B, S> {
    orchestrator: RouteOrchestrator<B>,
    source: Arc<S>,
    timeout: Duration,
}

impl<B, S> Widget<B, S>
where
    B: MapBackend,
    S: RouteSource + 'static,
{
    pub fn new(orchestrator: RouteOrchestrator<B>, source: Arc<S>, timeout: Duration) -> Self {
        Self {
            orchestrator,
            source,
            timeout,
        }
    }

    #[must_use]
    pub fn orchestrator(&self) -> &RouteOrchestrator<B> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut RouteOrchestrator<B> {
        &mut self.orchestrator
    }

    #[must_use]
    pub fn into_orchestrator(self) -> RouteOrchestrator<B> {
        self.orchestrator
    }

    /// Selects a commerce and waits for its route.
    ///
    /// Returns `None` when no request was needed (see
    /// [`RouteOrchestrator::begin_selection`]).
    pub async fn select_destination(
        &mut self,
        commerce_id: i64,
        start: Position,
    ) -> Option<Completion> {
        let pending = self.orchestrator.begin_selection(commerce_id, start)?;
        let (token, result) = tagged_fetch(Arc::clone(&self.source), pending, self.timeout).await;
        Some(self.orchestrator.complete_selection(token, result))
    }

    /// Drives the widget until it is unmounted, or until `commands` is closed
    /// and the remaining fetches and timers have settled. Returns the
    /// orchestrator for inspection.
    pub async fn run(mut self, mut commands: mpsc::Receiver<WidgetCommand>) -> RouteOrchestrator<B> {
        let mut in_flight: FuturesUnordered<TaggedFetch> = FuturesUnordered::new();
        let collapse = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(collapse);
        let mut collapse_armed = false;
        let mut commands_open = true;

        tracing::debug!(instance = %self.orchestrator.state().instance_id(), "widget loop started");
        loop {
            for effect in self.orchestrator.drain_effects() {
                match effect {
                    Effect::Fetch(pending) => {
                        tracing::trace!(token = pending.token, "route fetch scheduled");
                        in_flight.push(tagged_fetch(
                            Arc::clone(&self.source),
                            pending,
                            self.timeout,
                        ));
                    }
                    Effect::ScheduleCollapse(delay) => {
                        collapse.as_mut().reset(Instant::now() + delay);
                        collapse_armed = true;
                    }
                    Effect::CancelCollapse => collapse_armed = false,
                }
            }

            if self.orchestrator.is_unmounted()
                || (!commands_open && in_flight.is_empty() && !collapse_armed)
            {
                break;
            }

            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.orchestrator.handle(command),
                    None => {
                        tracing::debug!("command channel closed, settling pending work");
                        commands_open = false;
                    }
                },
                Some((token, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.orchestrator.complete_selection(token, result);
                }
                () = &mut collapse, if collapse_armed => {
                    collapse_armed = false;
                    self.orchestrator.collapse_timer_fired();
                }
            }
        }

        if !in_flight.is_empty() {
            tracing::debug!(pending = in_flight.len(), "dropping in-flight route fetches");
        }
        tracing::debug!("widget loop stopped");
        self.orchestrator
    }
}

fn tagged_fetch<S>(source: Arc<S>, pending: PendingRequest, timeout: Duration) -> TaggedFetch
where
    S: RouteSource + 'static,
{
    async move {
        let PendingRequest { token, request } = pending;
        (token, fetch_with_timeout(source.as_ref(), &request, timeout).await)
    }
    .boxed()
}

async fn fetch_with_timeout<S: RouteSource>(
    source: &S,
    request: &RouteRequest,
    timeout: Duration,
) -> Result<Route, RouteError> {
    if let Ok(result) = tokio::time::timeout(timeout, source.fetch_route(request)).await {
        result
    } else {
        Err(RouteError::Timeout {
            secs: timeout.as_secs(),
        })
    }
}
