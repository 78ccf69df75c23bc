use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use parking_lot::{Mutex, ReentrantMutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parent and children share one gate, so cancelling either waits for a
/// callback admitted by [`CancellationSignal::run`] to finish.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    token: CancellationToken,
    gate: Arc<ReentrantMutex<()>>,
}

impl CancellationSignal {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            gate: Arc::new(ReentrantMutex::new(())),
        }
    }

    fn already_cancelled() -> Self {
        let signal = Self::new();
        signal.token.cancel();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            gate: Arc::clone(&self.gate),
        }
    }

    /// Fires the signal. Returns `true` only for the call that fired it.
    pub fn cancel(&self) -> bool {
        let _gate = self.gate.lock();
        if self.token.is_cancelled() {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Runs `callback` unless the signal has fired.
    ///
    /// The check and the callback happen under the gate, so once `cancel`
    /// returns on any thread no further callback is admitted. A callback may
    /// cancel its own signal without deadlocking.
    pub fn run<R>(&self, callback: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.gate.lock();
        if self.token.is_cancelled() {
            return None;
        }
        Some(callback())
    }

    pub async fn scope<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            output = future => Some(output),
        }
    }
}

#[derive(Debug, Default)]
pub struct LifecycleRegistry {
    owners: Mutex<HashMap<OwnerId, CancellationSignal>>,
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, owner: OwnerId) -> CancellationSignal {
        let mut owners = self.owners.lock();
        if let Some(existing) = owners.get(&owner) {
            warn!(%owner, "lifecycle: owner already registered; reusing signal");
            return existing.clone();
        }

        let signal = CancellationSignal::new();
        owners.insert(owner, signal.clone());
        debug!(%owner, active = owners.len(), "lifecycle: owner registered");
        signal
    }

    /// Signal to compose with work started for `owner`. Unknown or ended
    /// owners get a signal that has already fired.
    pub fn signal_for(&self, owner: OwnerId) -> CancellationSignal {
        self.owners
            .lock()
            .get(&owner)
            .cloned()
            .unwrap_or_else(CancellationSignal::already_cancelled)
    }

    /// Returns `false` when the owner was unknown or already ended.
    pub fn end(&self, owner: OwnerId) -> bool {
        let removed = self.owners.lock().remove(&owner);
        let Some(signal) = removed else {
            debug!(%owner, "lifecycle: ignoring teardown of unregistered owner");
            return false;
        };

        let fired = signal.cancel();
        debug!(%owner, fired, "lifecycle: owner ended");
        fired
    }

    pub fn is_registered(&self, owner: OwnerId) -> bool {
        self.owners.lock().contains_key(&owner)
    }

    pub fn active_owners(&self) -> usize {
        self.owners.lock().len()
    }

    /// Mints a fresh owner and registers it. The returned guard ends the
    /// owner when dropped.
    pub fn scope(self: &Arc<Self>) -> OwnerScope {
        let owner = OwnerId::new();
        let signal = self.begin(owner);
        OwnerScope {
            owner,
            signal,
            registry: Arc::clone(self),
        }
    }
}

#[derive(Debug)]
pub struct OwnerScope {
    owner: OwnerId,
    signal: CancellationSignal,
    registry: Arc<LifecycleRegistry>,
}

impl OwnerScope {
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    pub fn end(&self) -> bool {
        self.registry.end(self.owner)
    }
}

impl Drop for OwnerScope {
    fn drop(&mut self) {
        self.registry.end(self.owner);
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
