use std::sync::Arc;

use async_trait::async_trait;
use shared::{domain::Pokemon, error::FetchError};

pub mod battle;
pub mod detail;
pub mod gateway;
pub mod lifecycle;
pub mod routes;
pub mod search;
pub mod surface;

pub use battle::{BattleFrame, BattleState, BattleStateReader};
pub use detail::{DetailController, DetailOutcome};
pub use gateway::{GatewayConfigError, HttpPokemonGateway};
pub use lifecycle::{CancellationSignal, LifecycleRegistry, OwnerId, OwnerScope};
pub use routes::{RouteParams, RouteTable, Router};
pub use search::{SearchController, SearchOutcome, SearchStatus};

/// Alert text for any failed lookup, whatever the underlying cause.
pub const POKEMON_NOT_FOUND_MESSAGE: &str = "Pokémon not found. Check the name or number and try again.";

#[async_trait]
pub trait PokemonGateway: Send + Sync {
    /// Looks up a single pokemon by name or numeric identifier.
    async fn fetch(&self, key: &str) -> Result<Pokemon, FetchError>;
}

/// Fire-and-forget navigation. Implementations must not block.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

pub trait Alerts: Send + Sync {
    fn notify_error(&self, message: &str);
}

/// Everything a flow controller talks to outside this crate.
#[derive(Clone)]
pub struct Collaborators {
    pub gateway: Arc<dyn PokemonGateway>,
    pub navigator: Arc<dyn Navigator>,
    pub alerts: Arc<dyn Alerts>,
    pub routes: RouteTable,
}

impl Collaborators {
    pub fn new(
        gateway: Arc<dyn PokemonGateway>,
        navigator: Arc<dyn Navigator>,
        alerts: Arc<dyn Alerts>,
        routes: RouteTable,
    ) -> Self {
        Self {
            gateway,
            navigator,
            alerts,
            routes,
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
