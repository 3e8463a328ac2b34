//! Directory-backed event repository and catalog.
//!
//! Definitions are authored one per `*.jsonc` file. The repository loads a
//! whole directory, skipping malformed files so a single bad document never
//! takes down the catalog. The catalog keeps the loaded set in memory behind
//! a read-write lock and answers tag queries and weighted random picks.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use rand::distributions::{Distribution as _, WeightedIndex};
use rand::seq::SliceRandom;

use crate::definition::GameEvent;
use crate::loader::load_document;

/// A loaded definition together with its source file.
#[derive(Debug, Clone)]
pub struct EventEntry {
    pub definition: GameEvent,
    pub path: PathBuf,
}

/// Loads event definitions from a directory of JSONC files.
#[derive(Debug, Clone)]
pub struct EventRepository {
    directory: PathBuf,
}

impl EventRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Loads every parseable definition, in sorted filename order.
    ///
    /// Files that fail to load or validate are skipped with a warning.
    /// Duplicate ids keep the first-seen entry.
    pub fn load_all(&self) -> Vec<EventEntry> {
        let mut entries = Vec::new();
        for path in jsonc_files(&self.directory) {
            match load_document(&path).and_then(GameEvent::from_json) {
                Ok(definition) => entries.push(EventEntry {
                    definition,
                    path: path.clone(),
                }),
                Err(error) => {
                    tracing::warn!("Skipping event file {:?}: {}", path, error);
                }
            }
        }
        dedupe_by_id(entries, |entry| &entry.definition.id)
    }
}

/// Lists `*.jsonc` files in a directory, sorted by filename.
pub(crate) fn jsonc_files(directory: &Path) -> Vec<PathBuf> {
    let Ok(reader) = std::fs::read_dir(directory) else {
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = reader
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().map(|ext| ext == "jsonc").unwrap_or(false)
        })
        .collect();
    paths.sort();
    paths
}

/// Keeps the first entry for each id, preserving order.
pub(crate) fn dedupe_by_id<T>(entries: Vec<T>, id_of: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = BTreeSet::new();
    let mut unique = Vec::with_capacity(entries.len());
    for entry in entries {
        if seen.insert(id_of(&entry).to_string()) {
            unique.push(entry);
        }
    }
    unique
}

/// Normalizes a requested tag list: trimmed, blank entries dropped.
pub(crate) fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// In-memory catalog of event definitions.
///
/// `reload` swaps the whole entry list atomically; readers always see either
/// the old or the new set, never a mix.
#[derive(Debug)]
pub struct EventCatalog {
    repository: EventRepository,
    entries: RwLock<Vec<EventEntry>>,
}

impl EventCatalog {
    /// Creates a catalog and performs the initial load.
    pub fn new(repository: EventRepository) -> Self {
        let entries = repository.load_all();
        Self {
            repository,
            entries: RwLock::new(entries),
        }
    }

    /// Replaces the in-memory set from the backing directory.
    pub fn reload(&self) {
        let entries = self.repository.load_all();
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *guard = entries;
    }

    /// Snapshot of the loaded entries, including source paths.
    pub fn entries(&self) -> Vec<EventEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// All loaded definitions.
    pub fn all(&self) -> Vec<GameEvent> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|entry| entry.definition.clone())
            .collect()
    }

    /// Definitions whose tag set covers every requested tag. An empty
    /// request returns everything.
    pub fn by_tags(&self, tags: &[String]) -> Vec<GameEvent> {
        let required = normalize_tags(tags);
        if required.is_empty() {
            return self.all();
        }
        self.all()
            .into_iter()
            .filter(|definition| definition.has_all_tags(&required))
            .collect()
    }

    /// Sorted set of every tag used by loaded definitions.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags = BTreeSet::new();
        for definition in self.all() {
            for tag in &definition.tags {
                if !tag.trim().is_empty() {
                    tags.insert(tag.clone());
                }
            }
        }
        tags.into_iter().collect()
    }

    /// Picks a definition at random from the tag-filtered pool.
    ///
    /// Selection weight is `max(0, probability)`; when every candidate has
    /// zero weight the pick is uniform. Returns `None` for an empty pool.
    pub fn pick_random(&self, tags: &[String]) -> Option<GameEvent> {
        let pool = self.by_tags(tags);
        if pool.is_empty() {
            return None;
        }

        let mut rng = rand::thread_rng();
        let weights: Vec<f64> = pool
            .iter()
            .map(|definition| definition.probability.max(0.0))
            .collect();

        match WeightedIndex::new(&weights) {
            Ok(distribution) => Some(pool[distribution.sample(&mut rng)].clone()),
            // All-zero (or otherwise unusable) weights: uniform pick.
            Err(_) => pool.choose(&mut rng).cloned(),
        }
    }
}
