//! Fake collaborators shared by the controller tests.

use std::{collections::HashMap, time::Duration};

use parking_lot::Mutex;
use shared::domain::{PokemonId, PokemonStat, PokemonType, HP_STAT};
use tokio::sync::{mpsc, oneshot};

use super::*;

pub(crate) fn pokemon(id: i64, name: &str, hp: u32) -> Pokemon {
    Pokemon {
        id: PokemonId(id),
        name: name.to_string(),
        height: 7,
        weight: 69,
        base_experience: Some(64),
        types: vec![PokemonType {
            slot: 1,
            name: "normal".into(),
        }],
        stats: vec![PokemonStat {
            name: HP_STAT.into(),
            base_value: hp,
        }],
        sprite: None,
    }
}

/// A fetch the test answers by hand.
pub(crate) struct PendingFetch {
    pub key: String,
    reply: oneshot::Sender<Result<Pokemon, FetchError>>,
}

impl PendingFetch {
    pub fn resolve(self, result: Result<Pokemon, FetchError>) {
        // The caller may have been cancelled and dropped its receiver.
        let _ = self.reply.send(result);
    }
}

/// Gateway whose responses are released one by one by the test, in any
/// order, to exercise out-of-order completion.
pub(crate) struct ControlledGateway {
    requests: mpsc::UnboundedSender<PendingFetch>,
}

impl ControlledGateway {
    pub fn new() -> (Arc<Self>, ControlledRequests) {
        let (requests, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { requests }), ControlledRequests { rx })
    }
}

#[async_trait]
impl PokemonGateway for ControlledGateway {
    async fn fetch(&self, key: &str) -> Result<Pokemon, FetchError> {
        let (reply, response) = oneshot::channel();
        let _ = self.requests.send(PendingFetch {
            key: key.to_string(),
            reply,
        });
        response
            .await
            .unwrap_or_else(|_| Err(FetchError::transport("request abandoned by test")))
    }
}

pub(crate) struct ControlledRequests {
    rx: mpsc::UnboundedReceiver<PendingFetch>,
}

impl ControlledRequests {
    pub async fn next(&mut self) -> PendingFetch {
        tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("fetch issued in time")
            .expect("gateway alive")
    }

    pub fn assert_idle(&mut self) {
        assert!(self.rx.try_recv().is_err(), "unexpected fetch issued");
    }
}

/// Gateway answering immediately from a fixed catalog.
#[derive(Default)]
pub(crate) struct CatalogGateway {
    catalog: HashMap<String, Pokemon>,
    calls: Mutex<Vec<String>>,
}

impl CatalogGateway {
    pub fn with(mut self, key: &str, pokemon: Pokemon) -> Self {
        self.catalog.insert(key.to_string(), pokemon);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PokemonGateway for CatalogGateway {
    async fn fetch(&self, key: &str) -> Result<Pokemon, FetchError> {
        self.calls.lock().push(key.to_string());
        self.catalog
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::not_found(key))
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, path: &str) {
        self.paths.lock().push(path.to_string());
    }
}

#[derive(Default)]
pub(crate) struct RecordingAlerts {
    messages: Mutex<Vec<String>>,
}

impl RecordingAlerts {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Alerts for RecordingAlerts {
    fn notify_error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

pub(crate) struct Harness {
    pub registry: Arc<LifecycleRegistry>,
    pub navigator: Arc<RecordingNavigator>,
    pub alerts: Arc<RecordingAlerts>,
    pub collaborators: Collaborators,
}

pub(crate) fn harness(gateway: Arc<dyn PokemonGateway>) -> Harness {
    let navigator = Arc::new(RecordingNavigator::default());
    let alerts = Arc::new(RecordingAlerts::default());
    let collaborators = Collaborators::new(
        gateway,
        navigator.clone(),
        alerts.clone(),
        RouteTable::default(),
    );
    Harness {
        registry: Arc::new(LifecycleRegistry::new()),
        navigator,
        alerts,
        collaborators,
    }
}
