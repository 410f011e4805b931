//! Error types for the taxonomy registry
//!
//! Every failure is fatal for the run: the pipeline propagates it to the
//! caller and nothing is written.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for taxonomy loading and canonicalization
#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Malformed taxonomy: {0}")]
    MalformedTaxonomy(String),

    #[error("Malformed class key '{key}': {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("Invalid merge rule for '{canonical_key}': {reason}")]
    InvalidMergeRule {
        canonical_key: String,
        reason: String,
    },

    #[error("Alias '{alias}' in provider '{provider}' is claimed by both {first} and {second}")]
    AliasCollision {
        provider: String,
        alias: String,
        first: String,
        second: String,
    },

    #[error("Malformed canonicalization plan: {0}")]
    MalformedPlan(String),

    #[error("Malformed registry config: {0}")]
    MalformedConfig(String),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TaxonomyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_rule(canonical_key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMergeRule {
            canonical_key: canonical_key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaxonomyError>;
