//! The immutable catalog snapshot shared between readers.

use std::collections::{BTreeSet, HashMap};

use crate::lex::parse_variant_suffix;
use crate::plural::PluralRule;
use crate::style::{is_style_token, parse_style_properties, StyleProperty};

/// Free-text catalog metadata plus the active plural rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMetadata {
    pub locale: String,
    pub fallback: String,
    pub note: String,
    pub plural: PluralRule,
}

/// Everything a reader needs, built once and never mutated after publish.
///
/// Catalog keys are case-folded tokens, either `base` or `base{variant}`.
/// `plural_variants` records every variant observed per base; the set is
/// ordered so the deterministic fallback variant is the lexicographically
/// smallest. `style_registry` holds an entry for a token iff its template
/// parses to at least one style property.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub catalog: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub plural_variants: HashMap<String, BTreeSet<String>>,
    pub metadata: CatalogMetadata,
    pub style_registry: HashMap<String, Vec<StyleProperty>>,
}

impl CatalogSnapshot {
    /// Insert a normalized entry. Records the plural variant when the key is
    /// variant-qualified. Returns `false` when the token already exists;
    /// duplicates are always a load failure, so the caller aborts.
    pub fn insert_entry(&mut self, key: String, text: String, label: Option<String>) -> bool {
        if self.catalog.contains_key(&key) {
            return false;
        }
        if let Some((base, variant)) = parse_variant_suffix(&key) {
            self.plural_variants.entry(base).or_default().insert(variant);
        }
        if let Some(label) = label {
            if !label.is_empty() {
                self.labels.insert(key.clone(), label);
            }
        }
        self.catalog.insert(key, text);
        true
    }

    /// Rebuild the style registry from the current catalog contents.
    pub fn populate_style_registry(&mut self) {
        self.style_registry.clear();
        for (token, text) in &self.catalog {
            if !is_style_token(token) {
                continue;
            }
            let props = parse_style_properties(text);
            if !props.is_empty() {
                self.style_registry.insert(token.clone(), props);
            }
        }
    }

    /// Catalog tokens in ascending order, for deterministic output.
    pub fn sorted_tokens(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.catalog.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicates() {
        let mut snapshot = CatalogSnapshot::default();
        assert!(snapshot.insert_entry("abcdef".into(), "hi".into(), None));
        assert!(!snapshot.insert_entry("abcdef".into(), "again".into(), None));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn insert_records_plural_variants() {
        let mut snapshot = CatalogSnapshot::default();
        snapshot.insert_entry("abcdef{other}".into(), "x".into(), None);
        snapshot.insert_entry("abcdef{one}".into(), "y".into(), None);
        let variants = snapshot.plural_variants.get("abcdef").unwrap();
        assert_eq!(variants.iter().next().map(String::as_str), Some("one"));
        assert_eq!(variants.len(), 2);
    }

    #[test]
    fn style_registry_tracks_parsable_style_tokens() {
        let mut snapshot = CatalogSnapshot::default();
        snapshot.insert_entry("style_box".into(), "color: red".into(), None);
        snapshot.insert_entry("style_void".into(), "just words".into(), None);
        snapshot.insert_entry("abcdef".into(), "color: red".into(), None);
        snapshot.populate_style_registry();

        assert!(snapshot.style_registry.contains_key("style_box"));
        assert!(!snapshot.style_registry.contains_key("style_void"));
        assert!(!snapshot.style_registry.contains_key("abcdef"));
    }

    #[test]
    fn sorted_tokens_are_ascending() {
        let mut snapshot = CatalogSnapshot::default();
        snapshot.insert_entry("bbbbbb".into(), "2".into(), None);
        snapshot.insert_entry("aaaaaa".into(), "1".into(), None);
        assert_eq!(snapshot.sorted_tokens(), vec!["aaaaaa", "bbbbbb"]);
    }
}
