//! A/B variant assignment
//!
//! Choosing a variant is a pure function of the experiment, the candidate
//! list, any earlier assignment and the visitor. Remembering the choice is
//! delegated to a [`KeyValueStore`] so callers decide where it lives.

use nutype::nutype;
use parking_lot::RwLock;
#[allow(unused_imports)] // These are used by nutype derive macros
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Identifier of a running experiment, e.g. `hero-headline`
#[nutype(
    sanitize(trim, lowercase),
    validate(not_empty, len_char_max = 100, regex = r"^[a-z0-9][a-z0-9_-]*$"),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsRef, Display)
)]
pub struct ExperimentId(String);

/// Name of one arm of an experiment
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 100),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, AsRef, Display)
)]
pub struct Variant(String);

/// Anonymous visitor identity used for bucketing
#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRef, Display))]
pub struct VisitorId(Uuid);

impl VisitorId {
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

/// Pick the variant a visitor sees.
///
/// An existing assignment is kept while it is still one of the candidates.
/// Otherwise the visitor lands in a stable bucket derived from the
/// experiment and visitor ids. Returns `None` only when there are no
/// candidates.
pub fn assign(
    experiment: &ExperimentId,
    candidates: &[Variant],
    existing: Option<&Variant>,
    visitor: &VisitorId,
) -> Option<Variant> {
    if let Some(current) = existing.filter(|variant| candidates.contains(variant)) {
        return Some(current.clone());
    }
    if candidates.is_empty() {
        return None;
    }

    candidates
        .get(bucket(experiment, visitor, candidates.len()))
        .cloned()
}

fn bucket(experiment: &ExperimentId, visitor: &VisitorId, arms: usize) -> usize {
    let digest = Sha256::digest(format!("{experiment}:{visitor}").as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % arms as u64) as usize
}

/// Storage for remembered assignments
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

/// Process-local store, mostly useful in tests and single-node setups
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries.write().insert(key.to_string(), value);
    }
}

/// Combines [`assign`] with a store so repeat visits stay in their bucket
pub struct ExperimentAssigner<S> {
    store: S,
}

impl<S: KeyValueStore> ExperimentAssigner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn variant_for(
        &self,
        experiment: &ExperimentId,
        candidates: &[Variant],
        visitor: &VisitorId,
    ) -> Option<Variant> {
        let key = storage_key(experiment, visitor);
        let existing = self
            .store
            .get(&key)
            .and_then(|stored| Variant::try_new(stored).ok());

        let chosen = assign(experiment, candidates, existing.as_ref(), visitor)?;
        if existing.as_ref() != Some(&chosen) {
            debug!(experiment = %experiment, variant = %chosen, "Stored experiment assignment");
            self.store.set(&key, chosen.to_string());
        }
        Some(chosen)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn storage_key(experiment: &ExperimentId, visitor: &VisitorId) -> String {
    format!("ab:{experiment}:{visitor}")
}
