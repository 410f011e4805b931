//! Canonicalization plan - the rule set as configuration
//!
//! New merges, removals and notes are added by editing
//! `config/canonicalization.yaml`; the engine itself does not change.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ambiguity::ConfusablePair;
use super::merge::MergeRule;
use crate::error::{Result, TaxonomyError};

const BUILTIN_PLAN: &str = include_str!("../../config/canonicalization.yaml");

/// Everything one canonicalization run applies after key validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalizationPlan {
    #[serde(default)]
    pub merge_rules: Vec<MergeRule>,
    #[serde(default)]
    pub ambiguous_keys: Vec<String>,
    #[serde(default)]
    pub confusable_pairs: Vec<ConfusablePair>,
}

impl CanonicalizationPlan {
    /// The plan shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_PLAN)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TaxonomyError::io(path, e))?;
        debug!("Loading canonicalization plan from {:?}", path);
        Self::from_yaml(&content)
    }

    /// Parse a plan and reject rules that can never apply.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let plan: Self =
            serde_yaml::from_str(yaml).map_err(|e| TaxonomyError::MalformedPlan(e.to_string()))?;
        for rule in &plan.merge_rules {
            rule.check()?;
        }
        Ok(plan)
    }
}
