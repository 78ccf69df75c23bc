use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PokemonId);

/// Name of the stat that seeds a battlefield's health pool.
pub const HP_STAT: &str = "hp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonType {
    pub slot: u8,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub name: String,
    pub base_value: u32,
}

/// Immutable snapshot of a creature record.
///
/// Controllers never patch a `Pokemon` in place; a reload replaces the whole
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: PokemonId,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    pub base_experience: Option<u32>,
    pub types: Vec<PokemonType>,
    pub stats: Vec<PokemonStat>,
    pub sprite: Option<String>,
}

impl Pokemon {
    pub fn stat(&self, name: &str) -> Option<u32> {
        self.stats
            .iter()
            .find(|stat| stat.name == name)
            .map(|stat| stat.base_value)
    }

    pub fn hp(&self) -> u32 {
        self.stat(HP_STAT).unwrap_or_default()
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.types
            .iter()
            .min_by_key(|ty| ty.slot)
            .map(|ty| ty.name.as_str())
    }
}
