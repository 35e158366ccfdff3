//! Single flight gateway to the path search backend. Searches run as tokio
//! tasks; their results travel back through a [`CompletionSink`] and are
//! checked against the newest generation before anybody acts on them.

use std::{
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use futures::FutureExt;
use model::{Coordinate, RegionId, ResultCode, RouteArtifact, RouterProfile};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::profile::{CostModel, ProfileDescriptor, RoutingSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputePurpose {
    InitialBuild,
    Rebuild,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Zero means unlimited.
    pub time_budget: Duration,
    pub purpose: ComputePurpose,
}

/// What the backend gets to see of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub profile: RouterProfile,
    pub cost_model: CostModel,
    pub settings: RoutingSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub code: ResultCode,
    pub route: Option<RouteArtifact>,
}

impl SearchOutcome {
    pub fn success(route: RouteArtifact) -> Self {
        Self {
            code: ResultCode::Success,
            route: Some(route),
        }
    }

    pub fn failure(code: ResultCode) -> Self {
        Self { code, route: None }
    }
}

#[async_trait]
pub trait PathSearchBackend: Send + Sync {
    /// Searches a path. Implementations should give up early once `cancel`
    /// fires.
    async fn compute(&self, query: &SearchQuery, cancel: CancellationToken) -> SearchOutcome;

    /// Regions that have to be downloaded before `query` can be answered.
    async fn fetch_missing_regions(&self, query: &SearchQuery) -> Vec<RegionId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComputeTicket {
    pub purpose: ComputePurpose,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputeCompletion {
    pub ticket: ComputeTicket,
    pub code: ResultCode,
    pub route: Option<Arc<RouteArtifact>>,
    pub missing_regions: Vec<RegionId>,
}

/// Receives completions on the foreground context.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn deliver(&self, completion: ComputeCompletion);
}

#[async_trait]
impl CompletionSink for mpsc::UnboundedSender<ComputeCompletion> {
    async fn deliver(&self, completion: ComputeCompletion) {
        if self.send(completion).is_err() {
            log::debug!("completion receiver is gone");
        }
    }
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

pub struct RouteComputeChannel {
    backend: Arc<dyn PathSearchBackend>,
    profile: &'static ProfileDescriptor,
    next_generation: u64,
    in_flight: HashMap<ComputePurpose, InFlight>,
}

impl RouteComputeChannel {
    pub fn new(backend: Arc<dyn PathSearchBackend>, profile: &'static ProfileDescriptor) -> Self {
        Self {
            backend,
            profile,
            next_generation: 0,
            in_flight: HashMap::new(),
        }
    }

    /// Searches started from now on use `profile`. Running searches keep
    /// the profile they were started with.
    pub fn bind(&mut self, profile: &'static ProfileDescriptor) {
        self.profile = profile;
    }

    pub fn profile(&self) -> &'static ProfileDescriptor {
        self.profile
    }

    /// Starts a search in the background and returns immediately. An older
    /// search with the same purpose is cancelled and its completion will not
    /// be accepted anymore.
    pub fn submit(
        &mut self,
        request: ComputeRequest,
        sink: Arc<dyn CompletionSink>,
    ) -> ComputeTicket {
        self.next_generation += 1;
        let ticket = ComputeTicket {
            purpose: request.purpose,
            generation: self.next_generation,
        };

        let cancel = CancellationToken::new();
        let previous = self.in_flight.insert(
            request.purpose,
            InFlight {
                generation: ticket.generation,
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = previous {
            log::debug!(
                "{:?} search #{} superseded by #{}",
                request.purpose,
                previous.generation,
                ticket.generation
            );
            previous.cancel.cancel();
        }

        let query = SearchQuery {
            origin: request.origin,
            destination: request.destination,
            profile: self.profile.profile,
            cost_model: self.profile.cost_model,
            settings: self.profile.settings,
        };
        let backend = self.backend.clone();
        let time_budget = request.time_budget;

        tokio::spawn(async move {
            let started = Instant::now();
            let completion = execute(backend, query, time_budget, ticket, cancel.clone()).await;
            log::info!(
                "{:?} search #{} finished with {} after {} ms",
                ticket.purpose,
                ticket.generation,
                completion.code,
                started.elapsed().as_millis()
            );
            if cancel.is_cancelled() {
                log::debug!("dropping completion of cancelled search #{}", ticket.generation);
                return;
            }
            sink.deliver(completion).await;
        });

        ticket
    }

    /// True if `completion` belongs to the newest search of its purpose.
    /// The search counts as finished afterwards.
    pub fn accept(&mut self, completion: &ComputeCompletion) -> bool {
        let ticket = completion.ticket;
        match self.in_flight.get(&ticket.purpose) {
            Some(in_flight) if in_flight.generation == ticket.generation => {
                self.in_flight.remove(&ticket.purpose);
                true
            }
            _ => {
                log::debug!(
                    "discarding stale {:?} completion #{}",
                    ticket.purpose,
                    ticket.generation
                );
                false
            }
        }
    }

    /// Cancels every running search. Their completions are discarded.
    pub fn cancel(&mut self) {
        for (purpose, in_flight) in self.in_flight.drain() {
            log::debug!("cancelling {:?} search #{}", purpose, in_flight.generation);
            in_flight.cancel.cancel();
        }
    }

    pub fn is_outstanding(&self, purpose: ComputePurpose) -> bool {
        self.in_flight.contains_key(&purpose)
    }

    pub fn has_outstanding(&self) -> bool {
        !self.in_flight.is_empty()
    }
}

async fn execute(
    backend: Arc<dyn PathSearchBackend>,
    query: SearchQuery,
    time_budget: Duration,
    ticket: ComputeTicket,
    cancel: CancellationToken,
) -> ComputeCompletion {
    let search_cancel = cancel.child_token();
    let search = AssertUnwindSafe(backend.compute(&query, search_cancel.clone())).catch_unwind();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => SearchOutcome::failure(ResultCode::Cancelled),
        result = async {
            if time_budget.is_zero() {
                Ok(search.await)
            } else {
                tokio::time::timeout(time_budget, search).await
            }
        } => match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(why)) => {
                log::error!("path search panicked: {:?}", why);
                SearchOutcome::failure(ResultCode::InternalError)
            }
            Err(_) => {
                log::warn!("path search ran out of its {:?} budget", time_budget);
                search_cancel.cancel();
                SearchOutcome::failure(ResultCode::Cancelled)
            }
        },
    };

    let SearchOutcome { mut code, route } = outcome;
    if code.is_success() && route.is_none() {
        log::error!("path search reported success without a route");
        code = ResultCode::InternalError;
    }

    let missing_regions = if code == ResultCode::NeedsMoreData {
        backend.fetch_missing_regions(&query).await
    } else {
        Vec::new()
    };

    ComputeCompletion {
        ticket,
        code,
        route: if code.is_success() {
            route.map(Arc::new)
        } else {
            None
        },
        missing_regions,
    }
}
