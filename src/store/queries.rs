use std::path::PathBuf;

use serde_json::{json, Value};

use crate::errors::Result;
use crate::models::{GameInstallRecord, InstallState};
use crate::store::DocStore;

const KEY_FIELD: &str = "gameId";
const SETTINGS_KEY_FIELD: &str = "id";
const SETTINGS_ID: i64 = 0;

/// Install records keyed by `gameId`, one collection file on disk.
///
/// The underlying store does not enforce key uniqueness, so the install
/// orchestrator upserts (update, then insert on miss) instead of inserting
/// blindly.
#[derive(Clone)]
pub struct InstallStore {
    docs: DocStore,
}

impl InstallStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            docs: DocStore::open(path)?,
        })
    }

    pub fn insert(&self, record: &GameInstallRecord) -> Result<GameInstallRecord> {
        let stored = self.docs.insert(serde_json::to_value(record)?)?;
        Ok(serde_json::from_value(stored)?)
    }

    pub fn get_by_key(&self, game_id: i64) -> Result<Option<GameInstallRecord>> {
        match self.docs.find_one(KEY_FIELD, &json!(game_id))? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    pub fn update(&self, game_id: i64, patch: &Value) -> Result<usize> {
        self.docs.update(KEY_FIELD, &json!(game_id), patch, false)
    }

    pub fn set_state(&self, game_id: i64, state: InstallState) -> Result<usize> {
        self.update(game_id, &json!({ "installState": serde_json::to_value(state)? }))
    }

    pub fn delete(&self, game_id: i64) -> Result<usize> {
        self.docs.remove(KEY_FIELD, &json!(game_id))
    }
}

/// Settings singleton pinned at sentinel id 0. The contents are an opaque
/// bag owned by the UI layer; the core never interprets them.
#[derive(Clone)]
pub struct SettingsStore {
    docs: DocStore,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            docs: DocStore::open(path)?,
        })
    }

    pub fn get(&self) -> Result<Option<Value>> {
        self.docs.find_one(SETTINGS_KEY_FIELD, &json!(SETTINGS_ID))
    }

    pub fn update(&self, patch: &Value) -> Result<usize> {
        self.docs
            .update(SETTINGS_KEY_FIELD, &json!(SETTINGS_ID), patch, true)
    }
}
