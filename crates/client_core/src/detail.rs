use std::sync::Arc;

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use shared::{domain::Pokemon, error::FetchError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    battle::{BattleStateReader, BattleStateWriter},
    lifecycle::{CancellationSignal, LifecycleRegistry, OwnerId, OwnerScope},
    routes::{RouteParams, POKEMON_ID_PARAM},
    Collaborators, POKEMON_NOT_FOUND_MESSAGE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Loaded(Arc<Pokemon>),
    Failed(FetchError),
    Superseded,
    Cancelled,
}

#[derive(Debug, Default)]
struct DetailState {
    latest_request: u64,
    inflight: Option<CancellationSignal>,
}

struct DetailInner {
    owner: OwnerId,
    signal: CancellationSignal,
    collaborators: Collaborators,
    battle: BattleStateWriter,
    state: Mutex<DetailState>,
}

pub struct DetailController {
    inner: Arc<DetailInner>,
    scope: OwnerScope,
}

impl DetailController {
    pub fn new(registry: &Arc<LifecycleRegistry>, collaborators: Collaborators) -> Self {
        let scope = registry.scope();
        let inner = Arc::new(DetailInner {
            owner: scope.owner(),
            signal: scope.signal().clone(),
            collaborators,
            battle: BattleStateWriter::new(),
            state: Mutex::new(DetailState::default()),
        });
        Self { inner, scope }
    }

    pub fn owner(&self) -> OwnerId {
        self.scope.owner()
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.signal.is_cancelled()
    }

    /// Latest successfully loaded pokemon.
    pub fn pokemon(&self) -> Option<Arc<Pokemon>> {
        self.inner.battle.current().pokemon
    }

    pub fn battle(&self) -> BattleStateReader {
        self.inner.battle.reader()
    }

    /// Follows `params` until the stream ends or the owner is torn down.
    pub fn mount<S>(&self, params: S) -> JoinHandle<()>
    where
        S: Stream<Item = RouteParams> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut params = Box::pin(params);
            while let Some(Some(snapshot)) = inner.signal.scope(params.next()).await {
                inner.handle_route_change(&snapshot);
            }
            debug!(owner = %inner.owner, "detail: route subscription closed");
        })
    }

    /// Starts a load for the snapshot's `pokemonId`; `None` when absent.
    pub fn handle_route_change(&self, params: &RouteParams) -> Option<JoinHandle<DetailOutcome>> {
        self.inner.handle_route_change(params)
    }

    /// Ends the owner exactly once; dropping the controller does the same.
    pub fn unmount(&self) -> bool {
        let ended = self.scope.end();
        if ended {
            info!(owner = %self.owner(), "detail: unmounted");
        }
        ended
    }
}

impl DetailInner {
    fn handle_route_change(self: &Arc<Self>, params: &RouteParams) -> Option<JoinHandle<DetailOutcome>> {
        let key = params
            .get(POKEMON_ID_PARAM)
            .filter(|value| !value.is_empty())?
            .to_string();
        Some(self.start_load(key))
    }

    fn start_load(self: &Arc<Self>, key: String) -> JoinHandle<DetailOutcome> {
        let (request, signal, superseded) = {
            let mut state = self.state.lock();
            state.latest_request += 1;
            let signal = self.signal.child();
            let superseded = state.inflight.replace(signal.clone());
            (state.latest_request, signal, superseded)
        };

        if let Some(previous) = superseded {
            if previous.cancel() {
                debug!(owner = %self.owner, request, "detail: superseded in-flight load");
            }
        }

        debug!(owner = %self.owner, request, key = %key, "detail: loading pokemon");
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.load(request, key, signal).await })
    }

    async fn load(&self, request: u64, key: String, signal: CancellationSignal) -> DetailOutcome {
        let Some(result) = signal
            .scope(self.collaborators.gateway.fetch(&key))
            .await
        else {
            return self.discarded(request);
        };

        signal
            .run(|| self.apply(request, &key, result))
            .unwrap_or_else(|| self.discarded(request))
    }

    fn apply(&self, request: u64, key: &str, result: Result<Pokemon, FetchError>) -> DetailOutcome {
        let mut state = self.state.lock();
        if state.latest_request != request {
            debug!(owner = %self.owner, request, "detail: dropping stale response");
            return DetailOutcome::Superseded;
        }
        state.inflight = None;

        match result {
            Ok(pokemon) => {
                let pokemon = Arc::new(pokemon);
                let revision = self.battle.reset_with(Arc::clone(&pokemon));
                info!(
                    owner = %self.owner,
                    request,
                    revision,
                    pokemon = %pokemon.name,
                    "detail: pokemon loaded"
                );
                DetailOutcome::Loaded(pokemon)
            }
            Err(err) => {
                drop(state);
                warn!(owner = %self.owner, key, error = %err, "detail: load failed");
                self.collaborators
                    .alerts
                    .notify_error(POKEMON_NOT_FOUND_MESSAGE);
                self.collaborators
                    .navigator
                    .navigate_to(self.collaborators.routes.error_path());
                DetailOutcome::Failed(err)
            }
        }
    }

    fn discarded(&self, request: u64) -> DetailOutcome {
        if self.signal.is_cancelled() {
            debug!(owner = %self.owner, request, "detail: load cancelled by teardown");
            DetailOutcome::Cancelled
        } else {
            DetailOutcome::Superseded
        }
    }
}

#[cfg(test)]
#[path = "tests/detail_tests.rs"]
mod tests;
