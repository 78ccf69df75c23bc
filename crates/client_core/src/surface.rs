use std::sync::Arc;

use parking_lot::Mutex;
use shared::domain::Pokemon;
use tracing::debug;

use crate::{
    battle::{BattleFrame, BattleState, BattleStateReader},
    lifecycle::CancellationSignal,
};

pub trait BattleSurface {
    fn name(&self) -> &'static str;

    /// Revision of the last frame this surface reset from.
    fn revision(&self) -> u64;

    fn reset(&mut self, pokemon: &Pokemon, revision: u64);

    /// Applies `frame`; returns whether the surface reset.
    ///
    /// Each revision resets at most once, so re-reading a frame is harmless.
    fn observe(&mut self, frame: &BattleFrame) -> bool {
        match (frame.state, frame.pokemon.as_deref()) {
            (BattleState::Reset, Some(pokemon)) if frame.revision > self.revision() => {
                self.reset(pokemon, frame.revision);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Battlefield {
    pokemon: Option<String>,
    max_hp: u32,
    current_hp: u32,
    turn: u32,
    revision: u64,
}

impl Battlefield {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pokemon(&self) -> Option<&str> {
        self.pokemon.as_deref()
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn current_hp(&self) -> u32 {
        self.current_hp
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_fainted(&self) -> bool {
        self.pokemon.is_some() && self.current_hp == 0
    }

    pub fn take_hit(&mut self, damage: u32) {
        self.current_hp = self.current_hp.saturating_sub(damage);
    }

    pub fn next_turn(&mut self) {
        self.turn += 1;
    }
}

impl BattleSurface for Battlefield {
    fn name(&self) -> &'static str {
        "battlefield"
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn reset(&mut self, pokemon: &Pokemon, revision: u64) {
        self.pokemon = Some(pokemon.name.clone());
        self.max_hp = pokemon.hp();
        self.current_hp = self.max_hp;
        self.turn = 0;
        self.revision = revision;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PokedexPage {
    #[default]
    Summary,
    Stats,
    Types,
}

impl PokedexPage {
    fn next(self) -> Self {
        match self {
            Self::Summary => Self::Stats,
            Self::Stats => Self::Types,
            Self::Types => Self::Summary,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PokedexEntry {
    pokemon: Option<String>,
    page: PokedexPage,
    revision: u64,
}

impl PokedexEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pokemon(&self) -> Option<&str> {
        self.pokemon.as_deref()
    }

    pub fn page(&self) -> PokedexPage {
        self.page
    }

    pub fn next_page(&mut self) {
        self.page = self.page.next();
    }
}

impl BattleSurface for PokedexEntry {
    fn name(&self) -> &'static str {
        "pokedex"
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn reset(&mut self, pokemon: &Pokemon, revision: u64) {
        self.pokemon = Some(pokemon.name.clone());
        self.page = PokedexPage::Summary;
        self.revision = revision;
    }
}

/// Keeps `surface` in sync with `reader` until the writer goes away or
/// `signal` fires.
pub async fn follow<S>(
    mut reader: BattleStateReader,
    surface: Arc<Mutex<S>>,
    signal: CancellationSignal,
) where
    S: BattleSurface + Send,
{
    let initial = reader.frame();
    signal.run(|| surface.lock().observe(&initial));

    while let Some(Some(frame)) = signal.scope(reader.changed()).await {
        let applied = signal.run(|| {
            let mut surface = surface.lock();
            let reset = surface.observe(&frame);
            if reset {
                debug!(
                    surface = surface.name(),
                    revision = frame.revision,
                    "surface: reset for new pokemon"
                );
            }
            reset
        });
        if applied.is_none() {
            break;
        }
    }
}

#[cfg(test)]
#[path = "tests/surface_tests.rs"]
mod tests;
