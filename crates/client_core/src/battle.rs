//! Battle state shared between the detail view and its sibling surfaces.

use std::sync::Arc;

use shared::domain::Pokemon;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BattleState {
    /// Nothing to do; also the value before the first reload.
    #[default]
    Loaded,
    /// Per-entity state must be discarded and rebuilt from `pokemon`.
    Reset,
}

/// What readers observe: the battle state together with the entity it
/// refers to, so a reset is never seen without its entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BattleFrame {
    pub state: BattleState,
    pub pokemon: Option<Arc<Pokemon>>,
    pub revision: u64,
}

/// Sole write handle. Only the detail controller constructs one.
#[derive(Debug)]
pub struct BattleStateWriter {
    tx: watch::Sender<BattleFrame>,
}

impl BattleStateWriter {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(BattleFrame::default());
        Self { tx }
    }

    pub fn reader(&self) -> BattleStateReader {
        BattleStateReader {
            rx: self.tx.subscribe(),
        }
    }

    pub fn current(&self) -> BattleFrame {
        self.tx.borrow().clone()
    }

    /// Publishes `pokemon` and `Reset` as one frame; returns its revision.
    pub(crate) fn reset_with(&self, pokemon: Arc<Pokemon>) -> u64 {
        let mut revision = 0;
        self.tx.send_modify(|frame| {
            frame.revision += 1;
            frame.state = BattleState::Reset;
            frame.pokemon = Some(pokemon);
            revision = frame.revision;
        });
        revision
    }
}

#[derive(Debug, Clone)]
pub struct BattleStateReader {
    rx: watch::Receiver<BattleFrame>,
}

impl BattleStateReader {
    pub fn state(&self) -> BattleState {
        self.rx.borrow().state
    }

    pub fn pokemon(&self) -> Option<Arc<Pokemon>> {
        self.rx.borrow().pokemon.clone()
    }

    pub fn frame(&self) -> BattleFrame {
        self.rx.borrow().clone()
    }

    /// Waits for the next published frame. `None` once the writer is gone.
    pub async fn changed(&mut self) -> Option<BattleFrame> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
#[path = "tests/battle_tests.rs"]
mod tests;
