//! Durable storage of the progress snapshot
use std::{
    collections::{HashMap, HashSet},
    io,
    path::PathBuf,
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    catalog::Catalog,
    models::{CardStatus, Status},
    progress::ProgressState,
};

pub const STATE_KEY: &str = "gemFlash.appState";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub card_statuses: Vec<CardStatus>,
    #[serde(default)]
    pub earned_badges: Vec<String>,
    #[serde(default)]
    pub current_filter: Option<String>,
}

/// String key/value storage, the shape of a browser's local storage
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> io::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> io::Result<()>;
}

/// One `<key>.json` file per key inside `dir`
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)
    }
}

/// Process-local storage, lost on restart
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.items.get(key).map(|v| v.clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Saves and restores the progress snapshot. After the first failed write
/// the storage is considered unavailable and further saves are skipped.
pub struct ProgressPersistence {
    storage: Box<dyn Storage>,
    unavailable: bool,
}

impl ProgressPersistence {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self {
            storage,
            unavailable: false,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.unavailable
    }

    pub fn save(&mut self, snapshot: &PersistedSnapshot) {
        if self.unavailable {
            return;
        }
        let result = serde_json::to_string(snapshot)
            .map_err(io::Error::other)
            .and_then(|json| self.storage.set_item(STATE_KEY, &json));
        match result {
            Ok(()) => debug!("Saved progress snapshot"),
            Err(e) => {
                error!("Failed to save progress, disabling persistence: {}", e);
                self.unavailable = true;
            }
        }
    }

    /// Restore progress for `catalog`. Never fails: unreadable or malformed
    /// storage yields the initial state.
    pub fn load(&self, catalog: &Catalog) -> ProgressState {
        let text = match self.storage.get_item(STATE_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => {
                info!("No persisted progress found, starting fresh");
                return ProgressState::initial(catalog);
            }
            Err(e) => {
                warn!("Could not read persisted progress, starting fresh: {}", e);
                return ProgressState::initial(catalog);
            }
        };
        match serde_json::from_str::<PersistedSnapshot>(&text) {
            Ok(snapshot) => {
                let state = reconcile(snapshot, catalog);
                info!(
                    "Restored progress: {} understood, {} badges earned",
                    state.stats().understood_count,
                    state.earned_badges().len()
                );
                state
            }
            Err(e) => {
                warn!("Persisted progress is malformed, starting fresh: {}", e);
                ProgressState::initial(catalog)
            }
        }
    }
}

/// Align a stored snapshot with the live catalog: statuses for unknown cards
/// are dropped, missing cards default to unseen, duplicate badges collapse.
pub fn reconcile(snapshot: PersistedSnapshot, catalog: &Catalog) -> ProgressState {
    let stored: HashMap<String, Status> = snapshot
        .card_statuses
        .into_iter()
        .filter(|cs| catalog.contains(&cs.card_id))
        .map(|cs| (cs.card_id, cs.status))
        .collect();
    let card_statuses = catalog
        .cards()
        .iter()
        .map(|card| CardStatus {
            card_id: card.id.clone(),
            status: stored.get(&card.id).copied().unwrap_or_default(),
        })
        .collect();
    let mut seen = HashSet::new();
    let earned_badges = snapshot
        .earned_badges
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();
    ProgressState::from_parts(card_statuses, earned_badges, snapshot.current_filter)
}
