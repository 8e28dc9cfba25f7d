//! JSON-file authorization store.
//!
//! One object owns both the in-memory allow-list and its file. Every
//! mutation goes through [`AuthStore::register`], which updates memory and
//! flushes to disk under the same lock, so a registration is durable before
//! the caller replies.


use hush_core::{error::HushError, message::Jid};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// Authorized identities, as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSet {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl AuthorizationSet {
    fn bucket(&self, jid: &Jid) -> &Vec<String> {
        if jid.is_group() {
            &self.groups
        } else {
            &self.users
        }
    }

    fn bucket_mut(&mut self, jid: &Jid) -> &mut Vec<String> {
        if jid.is_group() {
            &mut self.groups
        } else {
            &mut self.users
        }
    }

    pub fn contains(&self, jid: &Jid) -> bool {
        self.bucket(jid).iter().any(|id| id == jid.as_str())
    }

    /// Total number of authorized identities.
    pub fn len(&self) -> usize {
        self.users.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    AlreadyPresent,
}

/// Allow-list of users and groups, backed by a JSON file.
pub struct AuthStore {
    path: PathBuf,
    set: Mutex<AuthorizationSet>,
}

impl AuthStore {
    /// Load the store from `path`, creating an empty file first if none exists.
    ///
    /// An unreadable or malformed file is an error, never an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HushError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HushError::Persistence(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
            write_set(&path, &AuthorizationSet::default())?;
            info!("created empty authorization store at {}", path.display());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            HushError::Persistence(format!("failed to read {}: {e}", path.display()))
        })?;
        let set: AuthorizationSet = serde_json::from_str(&content).map_err(|e| {
            HushError::Persistence(format!("malformed {}: {e}", path.display()))
        })?;

        info!(
            "authorization store loaded: {} users, {} groups",
            set.users.len(),
            set.groups.len()
        );

        Ok(Self {
            path,
            set: Mutex::new(set),
        })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, AuthorizationSet> {
        // `register` rolls back on a failed flush, so a poisoned set is still consistent.
        self.set.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `jid` may invoke commands.
    pub fn is_authorized(&self, jid: &Jid) -> bool {
        self.guard().contains(jid)
    }

    /// Add `jid` to the matching list and persist.
    ///
    /// Idempotent: registering a known identity returns
    /// [`RegisterOutcome::AlreadyPresent`] without touching the file. If the
    /// write fails the addition is rolled back and the error returned.
    pub fn register(&self, jid: &Jid) -> Result<RegisterOutcome, HushError> {
        let mut set = self.guard();
        if set.contains(jid) {
            return Ok(RegisterOutcome::AlreadyPresent);
        }

        set.bucket_mut(jid).push(jid.as_str().to_string());
        if let Err(e) = write_set(&self.path, &set) {
            set.bucket_mut(jid).pop();
            return Err(e);
        }

        info!(
            "registered {} {jid}",
            if jid.is_group() { "group" } else { "user" }
        );
        Ok(RegisterOutcome::Added)
    }

    /// Copy of the current allow-list.
    pub fn snapshot(&self) -> AuthorizationSet {
        self.guard().clone()
    }
}

/// Write the whole set to a sibling temp file, then rename it into place.
fn write_set(path: &Path, set: &AuthorizationSet) -> Result<(), HushError> {
    let json = serde_json::to_string_pretty(set)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, json)
        .map_err(|e| HushError::Persistence(format!("failed to write {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        HushError::Persistence(format!("failed to replace {}: {e}", path.display()))
    })?;
    Ok(())
}
