//! Registry configuration
//!
//! File locations are process configuration, resolved against a project
//! root. Defaults can be overridden by `config/registry.yaml` under that root:
//!
//! ```yaml
//! taxonomy_path: labels/definitions.yaml
//! merged_path: labels/definitions_v2.yaml
//! plan_path: config/canonicalization.yaml
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TaxonomyError};
use crate::taxonomy::CanonicalizationPlan;

const DEFAULT_TAXONOMY_PATH: &str = "labels/definitions.yaml";
const OVERRIDE_FILE: &str = "config/registry.yaml";

/// Resolved file locations for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub root: PathBuf,
    /// Taxonomy read by every run and rewritten in place by `fix`
    pub taxonomy_path: PathBuf,
    /// Destination of a full canonicalization run
    pub merged_path: PathBuf,
    /// Canonicalization plan; the built-in plan when unset
    pub plan_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryOverrides {
    taxonomy_path: Option<PathBuf>,
    merged_path: Option<PathBuf>,
    plan_path: Option<PathBuf>,
}

impl RegistryConfig {
    /// Defaults relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let taxonomy_path = root.join(DEFAULT_TAXONOMY_PATH);
        Self {
            merged_path: versioned_path(&taxonomy_path, "v2"),
            taxonomy_path,
            plan_path: None,
            root,
        }
    }

    /// Defaults relative to `root`, with `config/registry.yaml` applied if present
    pub fn for_root(root: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self::new(root);
        let override_file = config.root.join(OVERRIDE_FILE);
        if !override_file.exists() {
            return Ok(config);
        }

        debug!("Applying registry overrides from {:?}", override_file);
        let content = std::fs::read_to_string(&override_file)
            .map_err(|e| TaxonomyError::io(&override_file, e))?;
        let overrides: RegistryOverrides = serde_yaml::from_str(&content).map_err(|e| {
            TaxonomyError::MalformedConfig(format!("{}: {}", override_file.display(), e))
        })?;

        if let Some(path) = overrides.taxonomy_path {
            config.taxonomy_path = config.root.join(path);
            config.merged_path = versioned_path(&config.taxonomy_path, "v2");
        }
        if let Some(path) = overrides.merged_path {
            config.merged_path = config.root.join(path);
        }
        if let Some(path) = overrides.plan_path {
            config.plan_path = Some(config.root.join(path));
        }
        Ok(config)
    }

    /// Load the configured plan, falling back to the built-in one
    pub fn plan(&self) -> Result<CanonicalizationPlan> {
        match &self.plan_path {
            Some(path) => CanonicalizationPlan::load(path),
            None => CanonicalizationPlan::builtin(),
        }
    }
}

/// `labels/definitions.yaml` + `v2` → `labels/definitions_v2.yaml`
pub fn versioned_path(path: &Path, version: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, version, ext.to_string_lossy()),
        None => format!("{}_{}", stem, version),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::new("/project");
        assert_eq!(config.taxonomy_path, Path::new("/project/labels/definitions.yaml"));
        assert_eq!(config.merged_path, Path::new("/project/labels/definitions_v2.yaml"));
        assert!(config.plan_path.is_none());
    }

    #[test]
    fn test_versioned_path() {
        assert_eq!(
            versioned_path(Path::new("a/defs.yml"), "v3"),
            Path::new("a/defs_v3.yml")
        );
        assert_eq!(versioned_path(Path::new("defs"), "v2"), Path::new("defs_v2"));
    }

    #[test]
    fn test_missing_override_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig::for_root(dir.path()).unwrap();
        assert_eq!(config, RegistryConfig::new(dir.path()));
    }

    #[test]
    fn test_override_file_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(
            dir.path().join(OVERRIDE_FILE),
            "taxonomy_path: data/types.yaml\nplan_path: config/plan.yaml\n",
        )
        .unwrap();

        let config = RegistryConfig::for_root(dir.path()).unwrap();
        assert_eq!(config.taxonomy_path, dir.path().join("data/types.yaml"));
        assert_eq!(config.merged_path, dir.path().join("data/types_v2.yaml"));
        assert_eq!(config.plan_path, Some(dir.path().join("config/plan.yaml")));
    }

    #[test]
    fn test_unknown_override_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(dir.path().join(OVERRIDE_FILE), "taxonomy: x.yaml\n").unwrap();

        assert!(matches!(
            RegistryConfig::for_root(dir.path()),
            Err(TaxonomyError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_builtin_plan_when_unset() {
        let plan = RegistryConfig::new("/project").plan().unwrap();
        assert!(!plan.merge_rules.is_empty());
    }
}
