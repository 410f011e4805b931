//! Canonicalization pipeline
//!
//! ```text
//! load ──► validate_and_fix ──► apply_merge_rules ──► remove_ambiguous ──► annotate ──► save
//! ```
//!
//! Each stage owns the taxonomy it is given and hands a new one to the next;
//! the report collects every stage's change log.

use std::fmt;

use serde::Serialize;
use tracing::info;

use super::ambiguity::{annotate_pairs, remove_ambiguous};
use super::merge::{apply_merge_rules, MergeRecord};
use super::plan::CanonicalizationPlan;
use super::store::TaxonomyStore;
use super::types::Taxonomy;
use super::validator::{validate_and_fix, FixRecord};
use crate::error::Result;

/// Change log of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalizationReport {
    pub classes_before: usize,
    pub classes_after: usize,
    pub fixes: Vec<FixRecord>,
    pub merges: Vec<MergeRecord>,
    pub ambiguous_removed: Vec<String>,
    pub annotated: Vec<String>,
}

impl CanonicalizationReport {
    /// Every class deleted by a merge or the ambiguity filter, in the order
    /// they were removed
    pub fn removed_classes(&self) -> Vec<&str> {
        self.merges
            .iter()
            .flat_map(|m| m.removed_keys())
            .chain(&self.ambiguous_removed)
            .map(String::as_str)
            .collect()
    }

    pub fn applied_merges(&self) -> impl Iterator<Item = &MergeRecord> {
        self.merges.iter().filter(|m| !m.is_skipped())
    }
}

impl fmt::Display for CanonicalizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== TAXONOMY CANONICALIZATION SUMMARY ===")?;

        writeln!(f, "\nFixed {} entries:", self.fixes.len())?;
        for fix in &self.fixes {
            writeln!(f, "  {}", fix)?;
        }

        let removed = self.removed_classes();
        writeln!(f, "\nRemoved classes ({}):", removed.len())?;
        for key in removed {
            writeln!(f, "  - {}", key)?;
        }

        let applied: Vec<&MergeRecord> = self.applied_merges().collect();
        writeln!(f, "\nMerged classes ({}):", applied.len())?;
        for merge in applied {
            writeln!(f, "  + {}", merge)?;
        }

        let skipped: Vec<&MergeRecord> = self.merges.iter().filter(|m| m.is_skipped()).collect();
        if !skipped.is_empty() {
            writeln!(f, "\nSkipped merge rules ({}):", skipped.len())?;
            for merge in skipped {
                writeln!(f, "  ~ {}", merge)?;
            }
        }

        if !self.annotated.is_empty() {
            writeln!(f, "\nAnnotated classes ({}):", self.annotated.len())?;
            for key in &self.annotated {
                writeln!(f, "  * {}", key)?;
            }
        }

        writeln!(f, "\nOriginal classes: {}", self.classes_before)?;
        write!(f, "New classes: {}", self.classes_after)
    }
}

/// Key validation only
pub fn fix_keys(taxonomy: Taxonomy) -> Result<(Taxonomy, CanonicalizationReport)> {
    let classes_before = taxonomy.len();
    let (taxonomy, fixes) = validate_and_fix(taxonomy)?;

    let report = CanonicalizationReport {
        classes_before,
        classes_after: taxonomy.len(),
        fixes,
        ..Default::default()
    };
    Ok((taxonomy, report))
}

/// Full run: validate, merge, filter, annotate.
pub fn canonicalize(
    taxonomy: Taxonomy,
    plan: &CanonicalizationPlan,
) -> Result<(Taxonomy, CanonicalizationReport)> {
    let classes_before = taxonomy.len();

    let (taxonomy, fixes) = validate_and_fix(taxonomy)?;
    let (taxonomy, merges) = apply_merge_rules(taxonomy, &plan.merge_rules)?;
    let (taxonomy, ambiguous_removed) = remove_ambiguous(taxonomy, plan.ambiguous_keys.as_slice());
    let (taxonomy, annotated) = annotate_pairs(taxonomy, &plan.confusable_pairs);

    info!(
        "Canonicalized taxonomy: {} -> {} classes",
        classes_before,
        taxonomy.len()
    );

    let report = CanonicalizationReport {
        classes_before,
        classes_after: taxonomy.len(),
        fixes,
        merges,
        ambiguous_removed,
        annotated,
    };
    Ok((taxonomy, report))
}

/// Load from `store`, canonicalize, and save back only if every stage succeeded.
pub fn run_with_store<S: TaxonomyStore>(
    store: &S,
    plan: &CanonicalizationPlan,
) -> Result<CanonicalizationReport> {
    let taxonomy = store.load()?;
    let (taxonomy, report) = canonicalize(taxonomy, plan)?;
    store.save(&taxonomy)?;
    Ok(report)
}
