//! A mounted detail view with its two sibling surfaces.

use std::{fmt, sync::Arc, time::Duration};

use client_core::{
    surface::{follow, BattleSurface, Battlefield, PokedexEntry},
    BattleFrame, CancellationSignal, Collaborators, DetailController, LifecycleRegistry, Router,
};
use parking_lot::Mutex;
use shared::domain::Pokemon;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Shown(Arc<Pokemon>),
    Redirected,
    Closed,
    TimedOut,
}

pub struct DetailSession {
    detail: DetailController,
    signal: CancellationSignal,
    battlefield: Arc<Mutex<Battlefield>>,
    pokedex: Arc<Mutex<PokedexEntry>>,
    tasks: Vec<JoinHandle<()>>,
}

impl DetailSession {
    pub fn open(
        registry: &Arc<LifecycleRegistry>,
        collaborators: Collaborators,
        router: &Router,
    ) -> Self {
        let detail = DetailController::new(registry, collaborators);
        let signal = registry.signal_for(detail.owner());
        let battlefield = Arc::new(Mutex::new(Battlefield::new()));
        let pokedex = Arc::new(Mutex::new(PokedexEntry::new()));

        let tasks = vec![
            tokio::spawn(follow(
                detail.battle(),
                Arc::clone(&battlefield),
                signal.clone(),
            )),
            tokio::spawn(follow(
                detail.battle(),
                Arc::clone(&pokedex),
                signal.clone(),
            )),
            detail.mount(router.params()),
        ];
        debug!(owner = %detail.owner(), "session: detail view mounted");

        Self {
            detail,
            signal,
            battlefield,
            pokedex,
            tasks,
        }
    }

    /// Waits until the pokemon named by `key` is on screen with both surfaces
    /// reset for it, the router has moved to the error page, or `timeout`
    /// elapses.
    pub async fn settle(&self, router: &Router, key: &str, timeout: Duration) -> Settled {
        let mut battle = self.detail.battle();
        let mut location = router.subscribe();
        let error_path = router.routes().error_path().to_string();

        let wait = async {
            loop {
                if self.signal.is_cancelled() {
                    return Settled::Closed;
                }

                let frame = battle.frame();
                if let Some(pokemon) = frame.pokemon.clone() {
                    if matches_key(&pokemon, key) {
                        match self.catch_up(&frame) {
                            Some(true) => return Settled::Shown(pokemon),
                            Some(false) => {}
                            None => return Settled::Closed,
                        }
                    }
                }
                if *location.borrow() == error_path {
                    return Settled::Redirected;
                }

                tokio::select! {
                    frame = battle.changed() => {
                        if frame.is_none() {
                            return Settled::Closed;
                        }
                    }
                    changed = location.changed() => {
                        if changed.is_err() {
                            return Settled::Closed;
                        }
                    }
                    _ = self.signal.cancelled() => return Settled::Closed,
                }
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .unwrap_or(Settled::TimedOut)
    }

    // The follow tasks may not have polled `frame` yet. Applying it here is
    // idempotent per revision, so whichever side gets there first resets.
    // `Some(false)` means a newer frame already replaced this one.
    fn catch_up(&self, frame: &BattleFrame) -> Option<bool> {
        self.signal.run(|| {
            let mut battlefield = self.battlefield.lock();
            let mut pokedex = self.pokedex.lock();
            battlefield.observe(frame);
            pokedex.observe(frame);
            battlefield.revision() == frame.revision && pokedex.revision() == frame.revision
        })
    }

    pub fn render<'a>(&'a self, pokemon: &'a Pokemon) -> impl fmt::Display + 'a {
        Rendered {
            session: self,
            pokemon,
        }
    }

    /// Unmounts the view and joins its tasks. Returns `false` if any task
    /// outlived the stop timeout.
    pub async fn close(self) -> bool {
        self.detail.unmount();
        let mut stopped = true;
        for task in self.tasks {
            if tokio::time::timeout(TASK_STOP_TIMEOUT, task).await.is_err() {
                warn!("session: task did not stop after unmount");
                stopped = false;
            }
        }
        stopped
    }
}

struct Rendered<'a> {
    session: &'a DetailSession,
    pokemon: &'a Pokemon,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pokemon = self.pokemon;
        let types: Vec<&str> = pokemon.types.iter().map(|ty| ty.name.as_str()).collect();
        writeln!(f, "#{:03} {} [{}]", pokemon.id.0, pokemon.name, types.join(", "))?;
        write!(f, "  height {}  weight {}  base xp ", pokemon.height, pokemon.weight)?;
        match pokemon.base_experience {
            Some(xp) => writeln!(f, "{xp}")?,
            None => writeln!(f, "-")?,
        }
        for stat in &pokemon.stats {
            writeln!(f, "  {:<16} {:>3}", stat.name, stat.base_value)?;
        }

        let field = self.session.battlefield.lock();
        writeln!(
            f,
            "  battlefield: hp {}/{} turn {}",
            field.current_hp(),
            field.max_hp(),
            field.turn()
        )?;
        write!(f, "  pokedex: {:?} page", self.session.pokedex.lock().page())
    }
}

fn matches_key(pokemon: &Pokemon, key: &str) -> bool {
    pokemon.name == key || key.parse::<i64>().ok() == Some(pokemon.id.0)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
