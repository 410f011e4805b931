//! Key validator
//!
//! The key is authoritative: a definition whose `provider`/`method` disagree
//! with its key is rewritten to match.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use super::types::{ClassKey, Taxonomy};
use crate::error::Result;

/// One provider/method repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixRecord {
    pub key: String,
    pub old_provider: String,
    pub old_method: String,
    pub new_provider: String,
    pub new_method: String,
}

impl fmt::Display for FixRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}.{} → {}.{}",
            self.key, self.old_provider, self.old_method, self.new_provider, self.new_method
        )
    }
}

/// Check every key and align each definition's `provider`/`method` with it.
///
/// Fails with `MalformedKey` on the first key that cannot be split. Keys are
/// never added or removed, and a second pass reports no fixes.
pub fn validate_and_fix(taxonomy: Taxonomy) -> Result<(Taxonomy, Vec<FixRecord>)> {
    // Reject bad keys before touching any definition
    let parsed: Vec<ClassKey> = taxonomy
        .keys()
        .map(ClassKey::parse)
        .collect::<Result<_>>()?;

    let mut fixes = Vec::new();
    let fixed: Taxonomy = taxonomy
        .into_iter()
        .zip(parsed)
        .map(|((key, mut definition), expected)| {
            if definition.provider != expected.provider || definition.method != expected.method {
                let fix = FixRecord {
                    key: key.clone(),
                    old_provider: std::mem::replace(&mut definition.provider, expected.provider),
                    old_method: std::mem::replace(&mut definition.method, expected.method),
                    new_provider: definition.provider.clone(),
                    new_method: definition.method.clone(),
                };
                debug!("Fixed {}", fix);
                fixes.push(fix);
            }
            (key, definition)
        })
        .collect();

    info!("Validated {} classes, {} fixed", fixed.len(), fixes.len());
    Ok((fixed, fixes))
}
