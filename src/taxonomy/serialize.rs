//! Canonical YAML form of a taxonomy
//!
//! Output is block-style YAML with class keys in lexicographic order and the
//! fields of every definition (nested mappings included) sorted by key, so two
//! runs over the same taxonomy produce the same bytes.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::types::{ClassDefinition, Taxonomy};
use crate::error::{Result, TaxonomyError};

/// Render a taxonomy in canonical form.
pub fn serialize(taxonomy: &Taxonomy) -> Result<String> {
    let mut root = Mapping::new();
    for (key, definition) in taxonomy.iter() {
        let value = serde_yaml::to_value(definition).map_err(|e| {
            TaxonomyError::MalformedTaxonomy(format!("cannot serialize '{}': {}", key, e))
        })?;
        root.insert(Value::String(key.to_string()), sorted(value));
    }

    serde_yaml::to_string(&Value::Mapping(root))
        .map_err(|e| TaxonomyError::MalformedTaxonomy(format!("cannot serialize taxonomy: {}", e)))
}

/// Parse a taxonomy document.
///
/// Only the shape is checked: a mapping of string keys to mapping-valued
/// definitions. Keys are not validated against their definitions here.
pub fn deserialize(text: &str) -> Result<Taxonomy> {
    let document: Value = serde_yaml::from_str(text)
        .map_err(|e| TaxonomyError::MalformedTaxonomy(format!("invalid YAML: {}", e)))?;

    let Value::Mapping(entries) = document else {
        return Err(TaxonomyError::MalformedTaxonomy(format!(
            "expected a mapping of class keys, found {}",
            kind(&document)
        )));
    };

    let mut taxonomy = Taxonomy::new();
    for (key, value) in entries {
        let Value::String(key) = key else {
            return Err(TaxonomyError::MalformedTaxonomy(format!(
                "class keys must be strings, found {}",
                kind(&key)
            )));
        };
        if !value.is_mapping() {
            return Err(TaxonomyError::MalformedTaxonomy(format!(
                "definition of '{}' must be a mapping, found {}",
                key,
                kind(&value)
            )));
        }

        let definition: ClassDefinition = serde_yaml::from_value(value).map_err(|e| {
            TaxonomyError::MalformedTaxonomy(format!("definition of '{}': {}", key, e))
        })?;
        taxonomy.insert(key, definition);
    }

    debug!("Parsed {} classes", taxonomy.len());
    Ok(taxonomy)
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => {
            let mut entries: Vec<(Value, Value)> = mapping
                .into_iter()
                .map(|(k, v)| (k, sorted(v)))
                .collect();
            entries.sort_by_cached_key(|(k, _)| sort_key(k));
            Value::Mapping(entries.into_iter().collect())
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sorted).collect()),
        Value::Tagged(mut tagged) => {
            let inner = std::mem::take(&mut tagged.value);
            tagged.value = sorted(inner);
            Value::Tagged(tagged)
        }
        other => other,
    }
}

fn sort_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
