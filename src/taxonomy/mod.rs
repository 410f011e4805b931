//! Semantic-Type Taxonomy
//!
//! A taxonomy maps class keys (`provider.method`) to class definitions.
//! Canonicalization runs as a one-way pipeline of owned transformations:
//!
//! ```text
//! TaxonomyStore::load
//!     │
//!     ▼
//! validate_and_fix      keys are authoritative for provider/method
//!     │
//!     ▼
//! apply_merge_rules     duplicates folded into canonical classes as aliases
//!     │
//!     ▼
//! remove_ambiguous      classes too vague to keep are dropped
//! annotate_pairs        look-alike classes get disambiguation notes
//!     │
//!     ▼
//! TaxonomyStore::save   canonical, sorted YAML
//! ```

mod ambiguity;
mod merge;
mod pipeline;
mod plan;
mod serialize;
mod store;
mod types;
mod validator;

pub use ambiguity::{annotate_confusable_pair, annotate_pairs, remove_ambiguous, ConfusablePair};
pub use merge::{
    apply_merge_rules, apply_rule, check_alias_collisions, MergeRecord, MergeRule, MergeShape,
};
pub use pipeline::{canonicalize, fix_keys, run_with_store, CanonicalizationReport};
pub use plan::CanonicalizationPlan;
pub use serialize::{deserialize, serialize};
pub use store::{load, save, FileStore, MemoryStore, TaxonomyStore};
pub use types::{ClassDefinition, ClassKey, Taxonomy};
pub use validator::{validate_and_fix, FixRecord};
