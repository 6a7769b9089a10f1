use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::{LauncherError, Result};
use crate::utils::fs::write_atomic;

pub mod queries;

const ID_FIELD: &str = "_id";
const TOMBSTONE_FIELD: &str = "$$deleted";

/// Keyed document collection persisted as newline-delimited JSON.
///
/// The whole collection is loaded eagerly at open time and the file is
/// replayed as a journal: a later line with the same `_id` supersedes the
/// earlier one, a tombstone line removes the document. Every mutating call
/// appends to the journal and then reloads the on-disk representation, so
/// subsequent reads are guaranteed to observe the write.
#[derive(Clone)]
pub struct DocStore {
    inner: Arc<Mutex<StoreState>>,
}

struct StoreState {
    path: PathBuf,
    docs: Vec<Value>,
}

impl DocStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(LauncherError::store)?;
            }
        }

        let docs = load_journal(&path)?;
        if path.exists() {
            compact(&path, &docs)?;
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(StoreState { path, docs })),
        })
    }

    /// Appends a new document and returns it including the store-assigned
    /// `_id`. No uniqueness check is performed on any field; callers that
    /// need one key per document must guard against double-insert themselves.
    pub fn insert(&self, doc: Value) -> Result<Value> {
        let Value::Object(mut fields) = doc else {
            return Err(LauncherError::Store(
                "document must be a JSON object".to_string(),
            ));
        };
        fields.insert(
            ID_FIELD.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
        let doc = Value::Object(fields);

        let mut state = self.lock();
        append_and_reload(&mut state, &doc)?;
        Ok(doc)
    }

    /// First document whose `field` equals `value`, or `None`. Absence is not
    /// an error.
    pub fn find_one(&self, field: &str, value: &Value) -> Result<Option<Value>> {
        let state = self.lock();
        Ok(state
            .docs
            .iter()
            .find(|doc| doc.get(field) == Some(value))
            .cloned())
    }

    /// Merges the top-level fields of `patch` into the first document whose
    /// `field` equals `value`. With `upsert`, a miss inserts the query field
    /// merged with the patch instead. Returns the number of documents
    /// touched (0 or 1).
    pub fn update(&self, field: &str, value: &Value, patch: &Value, upsert: bool) -> Result<usize> {
        let Value::Object(patch_fields) = patch else {
            return Err(LauncherError::Store(
                "update patch must be a JSON object".to_string(),
            ));
        };

        let mut state = self.lock();
        let existing = state
            .docs
            .iter()
            .find(|doc| doc.get(field) == Some(value))
            .cloned();

        match existing {
            Some(Value::Object(mut fields)) => {
                for (key, val) in patch_fields {
                    if key == ID_FIELD {
                        continue;
                    }
                    fields.insert(key.clone(), val.clone());
                }
                let merged = Value::Object(fields);
                append_and_reload(&mut state, &merged)?;
                Ok(1)
            }
            Some(_) => Err(LauncherError::Store(
                "stored document is not a JSON object".to_string(),
            )),
            None if upsert => {
                let mut fields = Map::new();
                fields.insert(field.to_string(), value.clone());
                for (key, val) in patch_fields {
                    fields.insert(key.clone(), val.clone());
                }
                fields.insert(
                    ID_FIELD.to_string(),
                    Value::String(Uuid::new_v4().to_string()),
                );
                let doc = Value::Object(fields);
                append_and_reload(&mut state, &doc)?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// Removes the first matching document. Returns the number removed.
    pub fn remove(&self, field: &str, value: &Value) -> Result<usize> {
        let mut state = self.lock();
        let id = state
            .docs
            .iter()
            .find(|doc| doc.get(field) == Some(value))
            .and_then(|doc| doc.get(ID_FIELD))
            .and_then(Value::as_str)
            .map(str::to_owned);

        let Some(id) = id else {
            return Ok(0);
        };

        let tombstone = serde_json::json!({ (ID_FIELD): id, (TOMBSTONE_FIELD): true });
        append_and_reload(&mut state, &tombstone)?;
        Ok(1)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().docs.len()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn load_journal(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path).map_err(LauncherError::store)?;
    let mut docs: Vec<Value> = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: Value = serde_json::from_str(line).map_err(LauncherError::store)?;
        replay(&mut docs, entry);
    }
    Ok(docs)
}

fn replay(docs: &mut Vec<Value>, entry: Value) {
    let Some(id) = entry
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned)
    else {
        return;
    };

    if entry
        .get(TOMBSTONE_FIELD)
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        docs.retain(|doc| doc.get(ID_FIELD).and_then(Value::as_str) != Some(id.as_str()));
        return;
    }

    match docs
        .iter_mut()
        .find(|doc| doc.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str()))
    {
        Some(existing) => *existing = entry,
        None => docs.push(entry),
    }
}

fn append_and_reload(state: &mut StoreState, entry: &Value) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&state.path)
        .map_err(LauncherError::store)?;
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    file.write_all(line.as_bytes())
        .map_err(LauncherError::store)?;
    file.flush().map_err(LauncherError::store)?;

    // Postcondition of every mutating call: subsequent reads observe the
    // write. The in-memory view is rebuilt from disk, never patched.
    state.docs = load_journal(&state.path)?;
    Ok(())
}

fn compact(path: &Path, docs: &[Value]) -> Result<()> {
    let mut contents = String::new();
    for doc in docs {
        contents.push_str(&serde_json::to_string(doc)?);
        contents.push('\n');
    }
    write_atomic(path, contents.as_bytes()).map_err(LauncherError::store)
}
