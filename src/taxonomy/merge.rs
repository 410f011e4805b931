//! Merge engine
//!
//! Interprets a list of declarative `MergeRule`s against a taxonomy. Each rule
//! folds duplicate classes into one canonical class, records the folded
//! method names as aliases and deletes the duplicates. Rules run in the order
//! given; a later rule sees what earlier rules left behind.
//!
//! Missing classes are expected (rule sets are replayed against snapshots at
//! different points in their evolution) and are never errors:
//! - a rule whose seed class is absent is skipped without touching anything
//! - absorbed keys that are absent are ignored
//!
//! Two rule shapes exist:
//! - `into_existing`: the canonical class already exists and absorbs the others
//! - `create_from_base`: a new canonical class is seeded from the content of a
//!   base class, which is consumed along with the absorbed ones

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::types::{ClassKey, Taxonomy};
use crate::error::{Result, TaxonomyError};

/// How the canonical class of a rule is obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MergeShape {
    /// Merge into a canonical class that is already present
    IntoExisting,
    /// Build the canonical class from a copy of `base_key`
    CreateFromBase { base_key: String },
}

/// Declarative merge instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRule {
    pub canonical_key: String,
    #[serde(flatten)]
    pub shape: MergeShape,
    /// Classes folded into the canonical one, in alias order
    #[serde(default)]
    pub absorbed_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_override: Option<String>,
}

impl MergeRule {
    pub fn into_existing<I, S>(canonical_key: &str, absorbed_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical_key: canonical_key.to_string(),
            shape: MergeShape::IntoExisting,
            absorbed_keys: absorbed_keys.into_iter().map(Into::into).collect(),
            title_override: None,
            description_override: None,
        }
    }

    pub fn create_from_base<I, S>(canonical_key: &str, base_key: &str, absorbed_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shape: MergeShape::CreateFromBase {
                base_key: base_key.to_string(),
            },
            ..Self::into_existing(canonical_key, absorbed_keys)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title_override = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description_override = Some(description.into());
        self
    }

    /// The class whose definition seeds the canonical entry
    pub fn seed_key(&self) -> &str {
        match &self.shape {
            MergeShape::IntoExisting => &self.canonical_key,
            MergeShape::CreateFromBase { base_key } => base_key,
        }
    }

    fn base_key(&self) -> Option<&str> {
        match &self.shape {
            MergeShape::IntoExisting => None,
            MergeShape::CreateFromBase { base_key } => Some(base_key),
        }
    }

    /// Reject rules that can never be applied
    pub fn check(&self) -> Result<()> {
        let invalid = |reason: String| TaxonomyError::invalid_rule(&self.canonical_key, reason);

        ClassKey::parse(&self.canonical_key).map_err(|e| invalid(e.to_string()))?;

        if let Some(base) = self.base_key() {
            ClassKey::parse(base).map_err(|e| invalid(e.to_string()))?;
            if base == self.canonical_key {
                return Err(invalid(format!(
                    "base key '{}' equals the canonical key",
                    base
                )));
            }
        }

        for absorbed in &self.absorbed_keys {
            ClassKey::parse(absorbed).map_err(|e| invalid(e.to_string()))?;
            if *absorbed == self.canonical_key {
                return Err(invalid(format!(
                    "'{}' cannot absorb itself",
                    absorbed
                )));
            }
        }

        Ok(())
    }
}

/// What one rule did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeRecord {
    Applied {
        canonical_key: String,
        base_key: Option<String>,
        /// Every key deleted by the rule, base included
        removed_keys: Vec<String>,
        /// Aliases added to the canonical class by this rule
        new_aliases: Vec<String>,
        /// A create-from-base rule overwrote a canonical class already present
        replaced_existing: bool,
    },
    Skipped {
        canonical_key: String,
        missing_key: String,
    },
}

impl MergeRecord {
    pub fn canonical_key(&self) -> &str {
        match self {
            Self::Applied { canonical_key, .. } | Self::Skipped { canonical_key, .. } => {
                canonical_key
            }
        }
    }

    pub fn removed_keys(&self) -> &[String] {
        match self {
            Self::Applied { removed_keys, .. } => removed_keys,
            Self::Skipped { .. } => &[],
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

impl fmt::Display for MergeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied {
                canonical_key,
                base_key,
                removed_keys,
                ..
            } => {
                let names: Vec<&str> = removed_keys
                    .iter()
                    .map(|k| k.split_once('.').map_or(k.as_str(), |(_, m)| m))
                    .collect();
                match base_key {
                    Some(_) => write!(f, "{} (from {})", canonical_key, names.join(", ")),
                    None if names.is_empty() => write!(f, "{} (nothing absorbed)", canonical_key),
                    None => write!(f, "{} (absorbed {})", canonical_key, names.join(", ")),
                }
            }
            Self::Skipped {
                canonical_key,
                missing_key,
            } => write!(f, "{} skipped ({} not present)", canonical_key, missing_key),
        }
    }
}

/// Apply a single rule in place.
///
/// On error the taxonomy is left exactly as it was.
pub fn apply_rule(taxonomy: &mut Taxonomy, rule: &MergeRule) -> Result<MergeRecord> {
    rule.check()?;

    let seed_key = rule.seed_key();
    let Some(seed) = taxonomy.get(seed_key) else {
        debug!("Skipping merge into {}: {} not present", rule.canonical_key, seed_key);
        return Ok(MergeRecord::Skipped {
            canonical_key: rule.canonical_key.clone(),
            missing_key: seed_key.to_string(),
        });
    };

    let canonical = ClassKey::parse(&rule.canonical_key)?;
    let mut definition = seed.clone();
    let mut removed_keys: Vec<String> = Vec::new();
    let mut new_aliases: Vec<String> = Vec::new();

    for absorbed in &rule.absorbed_keys {
        if removed_keys.contains(absorbed) || !taxonomy.contains(absorbed) {
            continue;
        }
        removed_keys.push(absorbed.clone());

        if Some(absorbed.as_str()) == rule.base_key() {
            continue;
        }
        let method = ClassKey::parse(absorbed)?.method;
        if !definition.aliases.contains(&method) {
            definition.aliases.push(method.clone());
            new_aliases.push(method);
        }
    }

    let mut replaced_existing = false;
    if let Some(base) = rule.base_key() {
        if !removed_keys.iter().any(|k| k == base) {
            removed_keys.push(base.to_string());
        }
        definition.provider = canonical.provider.clone();
        definition.method = canonical.method.clone();
        if taxonomy.contains(&rule.canonical_key) {
            warn!(
                "Replacing existing {} with content seeded from {}",
                rule.canonical_key, base
            );
            replaced_existing = true;
        }
    }

    if let Some(title) = &rule.title_override {
        definition.title = title.clone();
    }
    if let Some(description) = &rule.description_override {
        definition.description = description.clone();
    }

    for key in &removed_keys {
        taxonomy.remove(key);
    }
    taxonomy.insert(rule.canonical_key.clone(), definition);

    debug!(
        "Merged {} into {} (aliases +{:?})",
        removed_keys.join(", "),
        rule.canonical_key,
        new_aliases
    );

    Ok(MergeRecord::Applied {
        canonical_key: rule.canonical_key.clone(),
        base_key: rule.base_key().map(String::from),
        removed_keys,
        new_aliases,
        replaced_existing,
    })
}

/// Apply every rule in order, then check that no alias is claimed twice.
///
/// Each rule commits on its own: if a later rule is invalid the error is
/// returned and the partially merged taxonomy is dropped with it.
pub fn apply_merge_rules(
    mut taxonomy: Taxonomy,
    rules: &[MergeRule],
) -> Result<(Taxonomy, Vec<MergeRecord>)> {
    let mut records = Vec::with_capacity(rules.len());
    for rule in rules {
        records.push(apply_rule(&mut taxonomy, rule)?);
    }

    check_alias_collisions(&taxonomy)?;

    let applied = records.iter().filter(|r| !r.is_skipped()).count();
    info!(
        "Applied {} of {} merge rules, {} classes remain",
        applied,
        records.len(),
        taxonomy.len()
    );
    Ok((taxonomy, records))
}

/// Fail if two classes of the same provider list the same alias.
pub fn check_alias_collisions(taxonomy: &Taxonomy) -> Result<()> {
    let mut owners: HashMap<(&str, &str), &str> = HashMap::new();

    for (key, definition) in taxonomy.iter() {
        let provider = key.split_once('.').map_or(key, |(p, _)| p);
        for alias in &definition.aliases {
            match owners.get(&(provider, alias.as_str())) {
                Some(first) if *first != key => {
                    return Err(TaxonomyError::AliasCollision {
                        provider: provider.to_string(),
                        alias: alias.clone(),
                        first: first.to_string(),
                        second: key.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    owners.insert((provider, alias.as_str()), key);
                }
            }
        }
    }

    Ok(())
}
