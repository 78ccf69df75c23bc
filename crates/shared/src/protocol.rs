//! Wire shapes returned by the PokeAPI `pokemon` resource.

use serde::{Deserialize, Serialize};

use crate::domain::{Pokemon, PokemonId, PokemonStat, PokemonType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonTypeSlot {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonStatEntry {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PokemonSprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonResponse {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub types: Vec<PokemonTypeSlot>,
    #[serde(default)]
    pub stats: Vec<PokemonStatEntry>,
    #[serde(default)]
    pub sprites: PokemonSprites,
}

impl From<PokemonResponse> for Pokemon {
    fn from(value: PokemonResponse) -> Self {
        Self {
            id: PokemonId(value.id),
            name: value.name,
            height: value.height,
            weight: value.weight,
            base_experience: value.base_experience,
            types: value
                .types
                .into_iter()
                .map(|slot| PokemonType {
                    slot: slot.slot,
                    name: slot.kind.name,
                })
                .collect(),
            stats: value
                .stats
                .into_iter()
                .map(|entry| PokemonStat {
                    name: entry.stat.name,
                    base_value: entry.base_stat,
                })
                .collect(),
            sprite: value.sprites.front_default,
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
