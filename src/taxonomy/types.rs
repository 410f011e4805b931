//! Taxonomy value types
//!
//! `ClassDefinition` is a record of the fields the registry understands plus
//! an open bag of provider-specific fields (`extra`) that is carried through
//! every stage untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{Result, TaxonomyError};

/// Parsed `"<provider>.<method>"` class key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassKey {
    pub provider: String,
    pub method: String,
}

impl ClassKey {
    /// Split a key on its first `.`.
    ///
    /// Both halves must be non-empty; the method half may itself contain dots.
    pub fn parse(key: &str) -> Result<Self> {
        let (provider, method) = key.split_once('.').ok_or_else(|| TaxonomyError::MalformedKey {
            key: key.to_string(),
            reason: "missing '.' separator".to_string(),
        })?;

        if provider.is_empty() {
            return Err(TaxonomyError::MalformedKey {
                key: key.to_string(),
                reason: "empty provider segment".to_string(),
            });
        }
        if method.is_empty() {
            return Err(TaxonomyError::MalformedKey {
                key: key.to_string(),
                reason: "empty method segment".to_string(),
            });
        }

        Ok(Self {
            provider: provider.to_string(),
            method: method.to_string(),
        })
    }

    pub fn new(provider: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.provider, self.method)
    }
}

/// A single class definition in the taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    /// Namespace the class belongs to
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub provider: String,
    /// Class name within the provider
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub method: String,
    /// Human-readable title
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub title: String,
    /// Prose definition of the semantic type
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub description: String,
    /// Former names folded into this class
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub aliases: Vec<String>,
    /// Disambiguation guidance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Provider-specific fields, passed through verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ClassDefinition {
    pub fn new(key: &ClassKey, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            provider: key.provider.clone(),
            method: key.method.clone(),
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// The key this definition claims through its own fields.
    pub fn declared_key(&self) -> String {
        format!("{}.{}", self.provider, self.method)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Text field that also accepts a bare number or boolean, kept in string form
fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_yaml::Value;

    let found = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(String::new()),
        Value::String(s) => return Ok(s),
        Value::Bool(b) => return Ok(b.to_string()),
        Value::Number(n) => return Ok(n.to_string()),
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    };
    Err(de::Error::custom(format!("expected a string, found {}", found)))
}

/// Mapping from class key to definition, ordered by key.
///
/// Keys are kept as plain strings: a freshly loaded taxonomy may hold keys
/// that the validator has not yet checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Taxonomy {
    classes: BTreeMap<String, ClassDefinition>,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ClassDefinition> {
        self.classes.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ClassDefinition> {
        self.classes.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.classes.contains_key(key)
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        definition: ClassDefinition,
    ) -> Option<ClassDefinition> {
        self.classes.insert(key.into(), definition)
    }

    pub fn remove(&mut self, key: &str) -> Option<ClassDefinition> {
        self.classes.remove(key)
    }

    /// All keys in lexicographic order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassDefinition)> {
        self.classes.iter().map(|(k, d)| (k.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Sorted unique provider segments
    pub fn providers(&self) -> Vec<&str> {
        let mut providers: Vec<&str> = self
            .classes
            .keys()
            .filter_map(|k| k.split_once('.').map(|(p, _)| p))
            .collect();
        providers.sort_unstable();
        providers.dedup();
        providers
    }

    /// Classes belonging to one provider, in key order
    pub fn by_provider<'a>(
        &'a self,
        provider: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ClassDefinition)> + 'a {
        self.iter()
            .filter(move |(k, _)| k.split_once('.').is_some_and(|(p, _)| p == provider))
    }

    /// Resolve a class name that may have been merged away.
    ///
    /// Returns the live class for `name` itself, or the class in the same
    /// provider that lists `name`'s method segment among its aliases.
    pub fn resolve<'a>(&'a self, name: &str) -> Option<(&'a str, &'a ClassDefinition)> {
        if let Some((key, def)) = self.classes.get_key_value(name) {
            return Some((key.as_str(), def));
        }

        let key = ClassKey::parse(name).ok()?;
        let provider = key.provider.clone();
        self.iter().find(|(k, def)| {
            k.split_once('.').is_some_and(|(p, _)| p == provider)
                && def.aliases.iter().any(|a| *a == key.method)
        })
    }
}

impl FromIterator<(String, ClassDefinition)> for Taxonomy {
    fn from_iter<I: IntoIterator<Item = (String, ClassDefinition)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Taxonomy {
    type Item = (String, ClassDefinition);
    type IntoIter = std::collections::btree_map::IntoIter<String, ClassDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(key: &str) -> (String, ClassDefinition) {
        let parsed = ClassKey::parse(key).unwrap();
        (key.to_string(), ClassDefinition::new(&parsed, key, ""))
    }

    #[test]
    fn test_parse_splits_on_first_dot() {
        let key = ClassKey::parse("datetime.unix.millis").unwrap();
        assert_eq!(key.provider, "datetime");
        assert_eq!(key.method, "unix.millis");
        assert_eq!(key.to_string(), "datetime.unix.millis");
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        for bad in ["address", ".state", "address.", ""] {
            match ClassKey::parse(bad) {
                Err(TaxonomyError::MalformedKey { key, .. }) => assert_eq!(key, bad),
                other => panic!("expected MalformedKey for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_providers_sorted_and_unique() {
        let taxonomy: Taxonomy = ["person.email", "address.city", "address.state", "code.ean"]
            .into_iter()
            .map(class)
            .collect();

        assert_eq!(taxonomy.providers(), vec!["address", "code", "person"]);
        let address: Vec<&str> = taxonomy.by_provider("address").map(|(k, _)| k).collect();
        assert_eq!(address, vec!["address.city", "address.state"]);
    }

    #[test]
    fn test_resolve_follows_aliases_within_provider() {
        let mut taxonomy: Taxonomy = ["address.subdivision", "geo.region"]
            .into_iter()
            .map(class)
            .collect();
        taxonomy.get_mut("address.subdivision").unwrap().aliases =
            vec!["state".to_string(), "region".to_string()];

        let (key, _) = taxonomy.resolve("address.state").unwrap();
        assert_eq!(key, "address.subdivision");

        // Live key wins over alias lookup
        let (key, _) = taxonomy.resolve("geo.region").unwrap();
        assert_eq!(key, "geo.region");

        assert!(taxonomy.resolve("person.state").is_none());
        assert!(taxonomy.resolve("nonsense").is_none());
    }

    #[test]
    fn test_null_aliases_load_as_empty() {
        let def: ClassDefinition = serde_yaml::from_str(
            "provider: code\nmethod: ean\ntitle: EAN\ndescription: Barcode\naliases: null\nlocales: [EN]\n",
        )
        .unwrap();
        assert!(def.aliases.is_empty());
        assert!(def.notes.is_none());
        assert_eq!(
            def.extra.get("locales"),
            Some(&serde_yaml::Value::Sequence(vec!["EN".into()]))
        );
    }
}
