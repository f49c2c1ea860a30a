//! Static asset catalog.
//!
//! The catalog describes, per category, the canonical pixel size of its
//! images, whether its images may be retained, and the identifiers that
//! exist. It is read once at startup and never mutated by the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::asset::AssetKey;

/// Category holding floor tiles; retained for transition compositing.
pub const FLOORS: &str = "floors";

/// Category holding character-doll parts; retained for drawing.
pub const CHARDOLL: &str = "chardoll";

/// Description of one image category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Canonical image width in pixels
    pub width: u32,
    /// Canonical image height in pixels
    pub height: u32,
    /// Whether decoded handles may be kept (otherwise cache-only)
    #[serde(default)]
    pub retain: bool,
    /// Known identifiers; empty means any identifier is accepted
    #[serde(default)]
    pub identifiers: Vec<String>,
}

impl CategorySpec {
    /// A cache-only category with no enumerated identifiers.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, retain: false, identifiers: Vec::new() }
    }

    /// Mark the category as retainable.
    pub fn retained(mut self) -> Self {
        self.retain = true;
        self
    }

    pub fn with_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifiers = identifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check whether an identifier belongs to this category.
    pub fn accepts(&self, identifier: &str) -> bool {
        self.identifiers.is_empty() || self.identifiers.iter().any(|i| i == identifier)
    }
}

/// Category name to [`CategorySpec`] mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: BTreeMap<String, CategorySpec>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Catalog::insert`].
    pub fn with_category(mut self, name: impl Into<String>, spec: CategorySpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Add or replace a category.
    pub fn insert(&mut self, name: impl Into<String>, spec: CategorySpec) {
        self.categories.insert(name.into(), spec);
    }

    pub fn category(&self, name: &str) -> Option<&CategorySpec> {
        self.categories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn is_retainable(&self, name: &str) -> bool {
        self.categories.get(name).is_some_and(|c| c.retain)
    }

    /// Check whether `identifier` is valid in `category`.
    pub fn accepts(&self, category: &str, identifier: &str) -> bool {
        self.categories.get(category).is_some_and(|c| c.accepts(identifier))
    }

    /// Iterate categories in name order.
    pub fn categories(&self) -> impl Iterator<Item = (&String, &CategorySpec)> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Every enumerated asset key, category by category.
    pub fn keys(&self) -> Vec<AssetKey> {
        self.categories
            .iter()
            .flat_map(|(name, spec)| spec.identifiers.iter().map(move |id| AssetKey::new(name, id)))
            .collect()
    }

    /// Validate every category and return one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, spec) in &self.categories {
            if spec.width == 0 || spec.height == 0 {
                errors.push(format!("categories.{}: width and height must be positive", name));
            }
            let mut seen = std::collections::HashSet::new();
            for id in &spec.identifiers {
                if id.is_empty() {
                    errors.push(format!("categories.{}.identifiers: empty identifier", name));
                } else if !seen.insert(id.as_str()) {
                    errors.push(format!("categories.{}.identifiers: duplicate '{}'", name, id));
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::new()
            .with_category(FLOORS, CategorySpec::new(32, 32).retained().with_identifiers(["1", "2"]))
            .with_category("particles", CategorySpec::new(16, 16).with_identifiers(["spark"]))
            .with_category(CHARDOLL, CategorySpec::new(64, 96).retained())
    }

    #[test]
    fn test_retainable_categories() {
        let catalog = sample();
        assert!(catalog.is_retainable(FLOORS));
        assert!(catalog.is_retainable(CHARDOLL));
        assert!(!catalog.is_retainable("particles"));
        assert!(!catalog.is_retainable("missing"));
    }

    #[test]
    fn test_accepts_enumerated_and_open_categories() {
        let catalog = sample();
        assert!(catalog.accepts(FLOORS, "2"));
        assert!(!catalog.accepts(FLOORS, "3"));
        assert!(catalog.accepts(CHARDOLL, "anything"));
        assert!(!catalog.accepts("missing", "1"));
    }

    #[test]
    fn test_keys_lists_enumerated_identifiers() {
        let keys = sample().keys();
        assert_eq!(
            keys,
            vec![AssetKey::new(FLOORS, "1"), AssetKey::new(FLOORS, "2"), AssetKey::new("particles", "spark")]
        );
    }

    #[test]
    fn test_validate_reports_problems() {
        let catalog = Catalog::new()
            .with_category("bad", CategorySpec::new(0, 8).with_identifiers(["a", "a", ""]));
        let errors = catalog.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("width and height"));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let catalog: Catalog = toml::from_str(
            r#"
            [floors]
            width = 32
            height = 32
            retain = true
            identifiers = ["1", "2"]

            [objects]
            width = 32
            height = 64
            "#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.is_retainable("floors"));
        assert!(!catalog.is_retainable("objects"));
    }
}
