//! Semantic column-type taxonomy registry
//!
//! Holds the catalog of column-type classes (`address.subdivision`,
//! `datetime.unix_timestamp`, ...) and canonicalizes it: key validation,
//! duplicate merging with alias history, removal of ambiguous classes, and a
//! deterministic YAML form that diffs cleanly between versions.
//!
//! Column values, inference and sampling live elsewhere; this crate only
//! manipulates taxonomy metadata.

pub mod config;
pub mod error;
pub mod taxonomy;

pub use config::RegistryConfig;
pub use error::{Result, TaxonomyError};
pub use taxonomy::{
    canonicalize, fix_keys, CanonicalizationPlan, CanonicalizationReport, ClassDefinition,
    ClassKey, Taxonomy,
};
