//! Search box flow: normalize the term, fetch once, navigate to the result.

use std::sync::Arc;

use parking_lot::Mutex;
use shared::{domain::Pokemon, error::FetchError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    lifecycle::{CancellationSignal, LifecycleRegistry, OwnerId, OwnerScope},
    Collaborators, POKEMON_NOT_FOUND_MESSAGE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank term; nothing was fetched.
    Ignored,
    Navigated(String),
    Failed(FetchError),
    /// A newer submit took over before this one finished.
    Superseded,
    /// The owning view was torn down.
    Cancelled,
}

/// Trimmed, lower-cased search key, or `None` for a blank term.
pub fn normalize_term(raw: &str) -> Option<String> {
    let term = raw.trim().to_lowercase();
    (!term.is_empty()).then_some(term)
}

#[derive(Debug, Default)]
struct SearchState {
    term: String,
    status: SearchStatus,
    latest_request: u64,
    inflight: Option<CancellationSignal>,
}

struct PendingSearch {
    request: u64,
    key: String,
    signal: CancellationSignal,
}

struct SearchInner {
    owner: OwnerId,
    signal: CancellationSignal,
    collaborators: Collaborators,
    state: Mutex<SearchState>,
}

pub struct SearchController {
    inner: Arc<SearchInner>,
    scope: OwnerScope,
}

impl SearchController {
    pub fn new(registry: &Arc<LifecycleRegistry>, collaborators: Collaborators) -> Self {
        let scope = registry.scope();
        let inner = Arc::new(SearchInner {
            owner: scope.owner(),
            signal: scope.signal().clone(),
            collaborators,
            state: Mutex::new(SearchState::default()),
        });
        Self { inner, scope }
    }

    pub fn owner(&self) -> OwnerId {
        self.scope.owner()
    }

    /// Mirrors the input field.
    pub fn set_term(&self, value: impl Into<String>) {
        self.inner.state.lock().term = value.into();
    }

    pub fn term(&self) -> String {
        self.inner.state.lock().term.clone()
    }

    pub fn status(&self) -> SearchStatus {
        self.inner.state.lock().status
    }

    pub fn is_loading(&self) -> bool {
        self.status() == SearchStatus::Loading
    }

    /// Submits the current term and waits for the outcome.
    pub async fn submit(&self) -> SearchOutcome {
        match self.inner.begin() {
            Some(pending) => self.inner.finish(pending).await,
            None => SearchOutcome::Ignored,
        }
    }

    /// Submits the current term without waiting. The input is normalized
    /// and cleared before this returns; `None` means the term was blank.
    pub fn spawn_submit(&self) -> Option<JoinHandle<SearchOutcome>> {
        let pending = self.inner.begin()?;
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move { inner.finish(pending).await }))
    }

    /// Ends the owner; later results are dropped. Also runs on drop.
    pub fn teardown(&self) -> bool {
        self.scope.end()
    }
}

impl SearchInner {
    fn begin(&self) -> Option<PendingSearch> {
        let (pending, superseded) = {
            let mut state = self.state.lock();
            let key = normalize_term(&state.term)?;

            state.latest_request += 1;
            state.status = SearchStatus::Loading;
            state.term.clear();
            let signal = self.signal.child();
            let superseded = state.inflight.replace(signal.clone());
            (
                PendingSearch {
                    request: state.latest_request,
                    key,
                    signal,
                },
                superseded,
            )
        };

        if let Some(previous) = superseded {
            if previous.cancel() {
                debug!(owner = %self.owner, "search: superseded in-flight request");
            }
        }

        info!(
            owner = %self.owner,
            request = pending.request,
            key = %pending.key,
            "search: submitting"
        );
        Some(pending)
    }

    async fn finish(&self, pending: PendingSearch) -> SearchOutcome {
        let PendingSearch {
            request,
            key,
            signal,
        } = pending;

        let Some(result) = signal
            .scope(self.collaborators.gateway.fetch(&key))
            .await
        else {
            return self.discarded();
        };

        signal
            .run(|| self.apply(request, &key, result))
            .unwrap_or_else(|| self.discarded())
    }

    fn apply(&self, request: u64, key: &str, result: Result<Pokemon, FetchError>) -> SearchOutcome {
        {
            let mut state = self.state.lock();
            if state.latest_request != request {
                return SearchOutcome::Superseded;
            }
            state.status = SearchStatus::Idle;
            state.inflight = None;
        }

        match result {
            Ok(pokemon) => {
                let path = self.collaborators.routes.detail_path(&pokemon.name);
                info!(owner = %self.owner, key, path = %path, "search: found pokemon");
                self.collaborators.navigator.navigate_to(&path);
                SearchOutcome::Navigated(path)
            }
            Err(err) => {
                warn!(owner = %self.owner, key, error = %err, "search: lookup failed");
                self.collaborators
                    .alerts
                    .notify_error(POKEMON_NOT_FOUND_MESSAGE);
                SearchOutcome::Failed(err)
            }
        }
    }

    fn discarded(&self) -> SearchOutcome {
        if self.signal.is_cancelled() {
            SearchOutcome::Cancelled
        } else {
            SearchOutcome::Superseded
        }
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
