//! Per-user silver balances with JSON file persistence.
//!
//! The ledger is the single source of truth for balances. All mutation goes
//! through one mutex so concurrent chat handlers cannot interleave a check
//! with a write. Persistence is explicit: callers decide when the dirty
//! state is flushed to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

/// Reads and writes the balance file.
///
/// The on-disk format is a single JSON object mapping usernames to integer
/// balances. A missing or unreadable file is treated as an empty ledger so a
/// fresh install starts clean.
#[derive(Debug, Clone)]
pub struct BalanceStore {
    path: PathBuf,
}

impl BalanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all balances, normalizing usernames to trimmed lowercase.
    ///
    /// Blank keys are dropped; keys that collide after normalization keep
    /// the larger balance. Entries that are not integers are kept at zero
    /// rather than dropped, so the user is not silently forgotten.
    pub fn load(&self) -> BTreeMap<String, i64> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return BTreeMap::new(),
        };

        let parsed: Value = match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "balance file unreadable, starting empty");
                return BTreeMap::new();
            }
        };

        let Some(object) = parsed.as_object() else {
            tracing::warn!(path = %self.path.display(), "balance file is not an object, starting empty");
            return BTreeMap::new();
        };

        let mut balances = BTreeMap::new();
        for (user, value) in object {
            let Some(key) = normalize_user(user) else {
                continue;
            };
            let balance = value.as_i64().unwrap_or(0);
            balances
                .entry(key)
                .and_modify(|existing: &mut i64| *existing = (*existing).max(balance))
                .or_insert(balance);
        }
        balances
    }

    /// Writes all balances, creating parent directories as needed.
    pub fn save(&self, balances: &BTreeMap<String, i64>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(balances)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: BTreeMap<String, i64>,
    dirty: bool,
}

/// Thread-safe silver ledger backed by a [`BalanceStore`].
#[derive(Debug)]
pub struct BalanceLedger {
    store: BalanceStore,
    state: Mutex<LedgerState>,
}

impl BalanceLedger {
    /// Opens the ledger, loading existing balances from disk.
    pub fn open(store: BalanceStore) -> Self {
        let balances = store.load();
        Self {
            store,
            state: Mutex::new(LedgerState {
                balances,
                dirty: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // A poisoned lock only means another thread panicked mid-update;
        // the map itself is still a consistent snapshot.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current balance for a user; zero for unknown users.
    pub fn balance(&self, user: &str) -> i64 {
        let Some(key) = normalize_user(user) else {
            return 0;
        };
        self.lock().balances.get(&key).copied().unwrap_or(0)
    }

    /// Credits silver to a user. Non-positive amounts and blank users are
    /// ignored. Returns the new balance.
    pub fn add_silver(&self, user: &str, amount: i64) -> i64 {
        let Some(key) = normalize_user(user) else {
            return 0;
        };
        let mut guard = self.lock();
        let state = &mut *guard;
        let entry = state.balances.entry(key).or_insert(0);
        if amount > 0 {
            *entry += amount;
            state.dirty = true;
        }
        *entry
    }

    /// Debits silver from a user if they can afford it.
    ///
    /// Returns true when the deduction happened (a non-positive amount is a
    /// free success); false leaves the balance untouched.
    pub fn deduct_silver(&self, user: &str, amount: i64) -> bool {
        if amount <= 0 {
            return true;
        }
        let Some(key) = normalize_user(user) else {
            return false;
        };
        let mut state = self.lock();
        let current = state.balances.get(&key).copied().unwrap_or(0);
        if current < amount {
            return false;
        }
        state.balances.insert(key, current - amount);
        state.dirty = true;
        true
    }

    /// Flushes to disk if anything changed since the last persist.
    pub fn persist(&self) {
        let mut state = self.lock();
        if !state.dirty {
            return;
        }
        match self.store.save(&state.balances) {
            Ok(()) => state.dirty = false,
            Err(error) => {
                tracing::warn!(path = %self.store.path().display(), %error, "failed to persist balances");
            }
        }
    }

    /// Snapshot of all balances, for display and diagnostics.
    pub fn all_balances(&self) -> BTreeMap<String, i64> {
        self.lock().balances.clone()
    }
}

/// Usernames are case-insensitive; blank names are rejected.
fn normalize_user(user: &str) -> Option<String> {
    let trimmed = user.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
