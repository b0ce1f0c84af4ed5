use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Plays on one beatmap status, keyed by beatmap md5.
pub type PlayMap = BTreeMap<String, Vec<ScoreRecord>>;

/// One stored play as persisted in the profile collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "md5")]
    pub beatmap_md5: String,
    #[serde(default)]
    pub pp: f64,
    #[serde(rename = "acc", default)]
    pub accuracy: f64,
    #[serde(default)]
    pub mods: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayCollection {
    #[serde(default)]
    pub ranked_plays: Option<PlayMap>,
    #[serde(default)]
    pub approved_plays: Option<PlayMap>,
}

impl PlayCollection {
    /// Every stored score from both partitions, ranked first.
    pub fn all_scores(&self) -> impl Iterator<Item = &ScoreRecord> {
        [&self.ranked_plays, &self.approved_plays]
            .into_iter()
            .flatten()
            .flat_map(|plays| plays.values())
            .flatten()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub plays: PlayCollection,
    #[serde(default)]
    pub playcount: Option<u32>,
}

/// Read-only view over the persisted `profiles` collection (player name -> profile).
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: HashMap<String, Profile>,
}

impl ProfileStore {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let store = Self::from_json(&raw)?;
        debug!("Loaded {} profiles from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let profiles: HashMap<String, Profile> = serde_json::from_str(raw)?;
        Ok(Self { profiles })
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Load the modified-beatmap block-list. The collection is stored either as an
/// object keyed by beatmap md5 or as a plain array of hashes.
pub fn load_modified_beatmaps(path: &Path) -> Result<AHashSet<String>> {
    let raw = fs::read_to_string(path)?;
    parse_modified_beatmaps(&raw)
}

pub fn parse_modified_beatmaps(raw: &str) -> Result<AHashSet<String>> {
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map.into_iter().map(|(k, _)| k).collect()),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s),
                other => Err(Error::InvalidInput(format!(
                    "expected beatmap hash, found {}",
                    other
                ))),
            })
            .collect(),
        other => Err(Error::InvalidInput(format!(
            "modified beatmap list must be an object or array, found {}",
            other
        ))),
    }
}
