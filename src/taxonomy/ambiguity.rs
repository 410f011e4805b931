//! Ambiguity filter and confusable-pair annotation
//!
//! Removal and annotation are independent: as long as no annotated pair
//! member is itself removed, running them in either order yields the same
//! taxonomy.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::types::Taxonomy;

/// Two classes that look alike in data, with a note for each side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusablePair {
    pub key_a: String,
    pub key_b: String,
    pub note_a: String,
    pub note_b: String,
}

/// Delete every listed key that is present; returns the keys actually removed.
pub fn remove_ambiguous<S: AsRef<str>>(
    mut taxonomy: Taxonomy,
    ambiguous_keys: &[S],
) -> (Taxonomy, Vec<String>) {
    let mut removed = Vec::new();
    for key in ambiguous_keys {
        let key = key.as_ref();
        if taxonomy.remove(key).is_some() {
            debug!("Removed ambiguous class {}", key);
            removed.push(key.to_string());
        }
    }

    info!("Removed {} ambiguous classes", removed.len());
    (taxonomy, removed)
}

/// Set `notes` on both classes, but only when both are present.
///
/// Returns whether the notes were written.
pub fn annotate_confusable_pair(
    taxonomy: &mut Taxonomy,
    key_a: &str,
    key_b: &str,
    note_a: &str,
    note_b: &str,
) -> bool {
    if !taxonomy.contains(key_a) || !taxonomy.contains(key_b) {
        debug!("Not annotating {} / {}: pair incomplete", key_a, key_b);
        return false;
    }

    for (key, note) in [(key_a, note_a), (key_b, note_b)] {
        if let Some(definition) = taxonomy.get_mut(key) {
            definition.notes = Some(note.to_string());
        }
    }
    true
}

/// Apply a list of pairs; returns the keys that received notes.
pub fn annotate_pairs(mut taxonomy: Taxonomy, pairs: &[ConfusablePair]) -> (Taxonomy, Vec<String>) {
    let mut annotated = Vec::new();
    for pair in pairs {
        if annotate_confusable_pair(&mut taxonomy, &pair.key_a, &pair.key_b, &pair.note_a, &pair.note_b) {
            annotated.push(pair.key_a.clone());
            annotated.push(pair.key_b.clone());
        }
    }
    (taxonomy, annotated)
}
