//! Package option values and the tables they are collected into.
//!
//! The orchestrator hands every package an opaque bag of build options.
//! The recipe never interprets these values; it only sets them. Bags and
//! tables are ordered maps so that applying the same options twice yields
//! an identical table (option application must be idempotent).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single package option value.
///
/// Mirrors the three value shapes that actually occur in the recipe:
/// feature toggles, version-like numbers (e.g. a compatibility level of
/// `3.0`), and named selections (e.g. a TLS backend).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean toggle.
    Bool(bool),
    /// Numeric value.
    Float(f64),
    /// Named selection.
    Str(String),
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Ordered mapping of option names to values for one package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionBag(BTreeMap<String, OptionValue>);

impl OptionBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, overwriting any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Look up an option value.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    /// Iterate over the options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the bag holds no options.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of options in the bag.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'a> IntoIterator for &'a OptionBag {
    type Item = (&'a String, &'a OptionValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, OptionValue)> for OptionBag {
    fn from_iter<T: IntoIterator<Item = (String, OptionValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-package option bags keyed by package name.
///
/// The `"*"` key is the wildcard entry applied to every package by the
/// orchestrator (the recipe uses it to force `shared = true` globally).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionTable(BTreeMap<String, OptionBag>);

impl OptionTable {
    /// Name of the wildcard entry.
    pub const WILDCARD: &'static str = "*";

    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to a package's bag, creating it on first use.
    pub fn package(&mut self, name: &str) -> &mut OptionBag {
        self.0.entry(name.to_string()).or_default()
    }

    /// Read-only access to a package's bag, if present.
    pub fn get(&self, name: &str) -> Option<&OptionBag> {
        self.0.get(name)
    }

    /// Iterate over `(package, bag)` entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionBag)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut bag = OptionBag::new();
        bag.set("with_ssl", "openssl");
        bag.set("with_ssl", "schannel");
        assert_eq!(bag.get("with_ssl"), Some(&OptionValue::from("schannel")));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_reapply_is_idempotent() {
        let apply = |bag: &mut OptionBag| {
            bag.set("shared", true);
            bag.set("compatibility", 3.0);
            bag.set("tiff", "off");
        };

        let mut once = OptionBag::new();
        apply(&mut once);

        let mut twice = OptionBag::new();
        apply(&mut twice);
        apply(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_table_wildcard_entry() {
        let mut table = OptionTable::new();
        table.package(OptionTable::WILDCARD).set("shared", true);
        assert_eq!(
            table.get("*").and_then(|b| b.get("shared")),
            Some(&OptionValue::Bool(true))
        );
    }

    #[test]
    fn test_value_serde_untagged() {
        let json = r#"{"network": false, "compat": 3.0, "ssl": "darwinssl"}"#;
        let bag: OptionBag = serde_json::from_str(json).unwrap();
        assert_eq!(bag.get("network"), Some(&OptionValue::Bool(false)));
        assert_eq!(bag.get("compat"), Some(&OptionValue::Float(3.0)));
        assert_eq!(bag.get("ssl"), Some(&OptionValue::from("darwinssl")));
    }
}
