use super::*;

use std::collections::HashMap;

use async_trait::async_trait;
use client_core::{
    routes::HOME_ROUTE, surface::PokedexPage, Navigator, PokemonGateway, RouteTable,
    POKEMON_NOT_FOUND_MESSAGE,
};
use shared::{
    domain::{PokemonId, PokemonStat, PokemonType},
    error::FetchError,
};

use crate::console::ConsoleAlerts;

const SETTLE: Duration = Duration::from_secs(5);

fn pokemon(id: i64, name: &str, hp: u32) -> Pokemon {
    Pokemon {
        id: PokemonId(id),
        name: name.into(),
        height: 7,
        weight: 69,
        base_experience: Some(64),
        types: vec![
            PokemonType {
                slot: 2,
                name: "poison".into(),
            },
            PokemonType {
                slot: 1,
                name: "grass".into(),
            },
        ],
        stats: vec![PokemonStat {
            name: "hp".into(),
            base_value: hp,
        }],
        sprite: None,
    }
}

/// Answers immediately from a fixed catalog keyed by name and by number.
#[derive(Default)]
struct InstantGateway {
    catalog: HashMap<String, Pokemon>,
}

impl InstantGateway {
    fn with(mut self, pokemon: Pokemon) -> Self {
        self.catalog.insert(pokemon.id.to_string(), pokemon.clone());
        self.catalog.insert(pokemon.name.clone(), pokemon);
        self
    }
}

#[async_trait]
impl PokemonGateway for InstantGateway {
    async fn fetch(&self, key: &str) -> Result<Pokemon, FetchError> {
        self.catalog
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::not_found(key))
    }
}

struct StalledGateway;

#[async_trait]
impl PokemonGateway for StalledGateway {
    async fn fetch(&self, _key: &str) -> Result<Pokemon, FetchError> {
        std::future::pending().await
    }
}

struct Fixture {
    registry: Arc<LifecycleRegistry>,
    router: Arc<Router>,
    alerts: Arc<ConsoleAlerts>,
    collaborators: Collaborators,
}

fn fixture(gateway: Arc<dyn PokemonGateway>) -> Fixture {
    let routes = RouteTable::default();
    let router = Arc::new(Router::new(routes.clone(), HOME_ROUTE));
    let alerts = Arc::new(ConsoleAlerts::default());
    let collaborators = Collaborators::new(gateway, router.clone(), alerts.clone(), routes);
    Fixture {
        registry: Arc::new(LifecycleRegistry::new()),
        router,
        alerts,
        collaborators,
    }
}

impl Fixture {
    fn open(&self) -> DetailSession {
        DetailSession::open(&self.registry, self.collaborators.clone(), &self.router)
    }

    fn show(&self, key: &str) {
        self.router
            .navigate_to(&self.router.routes().detail_path(key));
    }
}

#[test]
fn matches_by_name_or_number() {
    let bulbasaur = pokemon(1, "bulbasaur", 45);

    assert!(matches_key(&bulbasaur, "bulbasaur"));
    assert!(matches_key(&bulbasaur, "1"));
    assert!(matches_key(&bulbasaur, "001"));
    assert!(!matches_key(&bulbasaur, "ivysaur"));
    assert!(!matches_key(&bulbasaur, "2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shown_pokemon_always_has_reset_surfaces() {
    let gateway = InstantGateway::default().with(pokemon(1, "bulbasaur", 45));
    let fx = fixture(Arc::new(gateway));

    for round in 0..100 {
        let session = fx.open();
        fx.show("bulbasaur");

        let shown = match session.settle(&fx.router, "bulbasaur", SETTLE).await {
            Settled::Shown(shown) => shown,
            other => panic!("round {round}: expected bulbasaur, got {other:?}"),
        };

        let rendered = session.render(&shown).to_string();
        assert!(
            rendered.contains("battlefield: hp 45/45 turn 0"),
            "round {round}: {rendered}"
        );
        assert_eq!(session.battlefield.lock().pokemon(), Some("bulbasaur"));
        assert_eq!(session.pokedex.lock().pokemon(), Some("bulbasaur"));

        assert!(session.close().await);
        fx.router.navigate_to(HOME_ROUTE);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn switching_pokemon_does_not_keep_previous_surface_state() {
    let gateway = InstantGateway::default()
        .with(pokemon(1, "bulbasaur", 45))
        .with(pokemon(4, "charmander", 39));
    let fx = fixture(Arc::new(gateway));
    let session = fx.open();

    fx.show("1");
    assert!(matches!(
        session.settle(&fx.router, "1", SETTLE).await,
        Settled::Shown(_)
    ));
    session.battlefield.lock().take_hit(10);
    session.pokedex.lock().next_page();

    fx.show("4");
    let shown = match session.settle(&fx.router, "4", SETTLE).await {
        Settled::Shown(shown) => shown,
        other => panic!("expected charmander, got {other:?}"),
    };

    assert_eq!(shown.name, "charmander");
    {
        let field = session.battlefield.lock();
        assert_eq!(field.pokemon(), Some("charmander"));
        assert_eq!((field.current_hp(), field.max_hp()), (39, 39));
    }
    assert_eq!(session.pokedex.lock().page(), PokedexPage::Summary);

    assert!(session.close().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_load_is_redirected_to_error_route() {
    let fx = fixture(Arc::new(InstantGateway::default()));
    let session = fx.open();

    fx.show("missingno");
    let settled = session.settle(&fx.router, "missingno", SETTLE).await;

    assert_eq!(settled, Settled::Redirected);
    assert_eq!(fx.router.current_path(), "/error-404");
    assert_eq!(fx.alerts.last().as_deref(), Some(POKEMON_NOT_FOUND_MESSAGE));
    assert_eq!(session.battlefield.lock().max_hp(), 0);
    assert!(session.close().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stalled_load_times_out() {
    let fx = fixture(Arc::new(StalledGateway));
    let session = fx.open();

    fx.show("25");
    let settled = session
        .settle(&fx.router, "25", Duration::from_millis(100))
        .await;

    assert_eq!(settled, Settled::TimedOut);
    assert!(session.close().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unmounted_view_settles_as_closed() {
    let fx = fixture(Arc::new(StalledGateway));
    let session = fx.open();

    session.detail.unmount();
    let settled = session.settle(&fx.router, "25", SETTLE).await;

    assert_eq!(settled, Settled::Closed);
    assert!(session.close().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_stops_every_task_and_ends_the_owner() {
    let gateway = InstantGateway::default().with(pokemon(1, "bulbasaur", 45));
    let fx = fixture(Arc::new(gateway));
    let session = fx.open();
    let owner = session.detail.owner();
    assert!(fx.registry.is_registered(owner));

    fx.show("bulbasaur");
    assert!(matches!(
        session.settle(&fx.router, "bulbasaur", SETTLE).await,
        Settled::Shown(_)
    ));

    assert!(session.close().await);
    assert!(!fx.registry.is_registered(owner));
    assert_eq!(fx.registry.active_owners(), 0);
}
