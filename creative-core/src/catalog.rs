//! Rule Catalog - Retailer Publishing Constraints
//!
//! Built once at startup and handed to the evaluator. Never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_RETAILER: &str = "default";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read rule catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rule catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Retailer {retailer}: {field} must be within [0, 1], got {value}")]
    OutOfRange {
        retailer: String,
        field: &'static str,
        value: f64,
    },
}

/// Constraints a single retailer imposes on a creative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailerRule {
    /// Border margin reserved on each side, as a fraction of the canvas dimension.
    pub safe_zone_pct: f64,
    /// Largest fraction of canvas area the packshot may cover.
    pub max_packshot_pct: f64,
    /// Minimum legible headline size. Not enforced by the composer.
    pub min_font_px: u32,
    /// Lowercase substrings disallowed in headline copy, in declared order.
    #[serde(default)]
    pub prohibited_words: Vec<String>,
}

impl RetailerRule {
    pub fn builtin_default() -> Self {
        Self {
            safe_zone_pct: 0.05,
            max_packshot_pct: 0.6,
            min_font_px: 18,
            prohibited_words: vec![
                "free".to_string(),
                "guarantee".to_string(),
                "alcohol".to_string(),
            ],
        }
    }

    fn normalized(mut self, retailer: &str) -> Result<Self, CatalogError> {
        for (field, value) in [
            ("safe_zone_pct", self.safe_zone_pct),
            ("max_packshot_pct", self.max_packshot_pct),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CatalogError::OutOfRange {
                    retailer: retailer.to_string(),
                    field,
                    value,
                });
            }
        }
        self.prohibited_words = self
            .prohibited_words
            .into_iter()
            .map(|w| w.to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Ok(self)
    }
}

/// On-disk shape of a per-retailer rule file inside a rules directory.
#[derive(Debug, Deserialize)]
struct RuleFile {
    id: String,
    #[serde(flatten)]
    rule: RetailerRule,
}

/// Result of a catalog lookup.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRule<'a> {
    pub retailer: &'a str,
    pub rule: &'a RetailerRule,
    /// True when the requested key was unknown and `default` was used.
    pub fell_back: bool,
}

/// Retailer key -> rule set. Always contains a `default` entry.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: BTreeMap<String, RetailerRule>,
}

impl RuleCatalog {
    pub fn builtin() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(DEFAULT_RETAILER.to_string(), RetailerRule::builtin_default());
        Self { rules }
    }

    pub fn from_rules(
        rules: impl IntoIterator<Item = (String, RetailerRule)>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin();
        for (retailer, rule) in rules {
            let rule = rule.normalized(&retailer)?;
            catalog.rules.insert(retailer, rule);
        }
        Ok(catalog)
    }

    /// Parse a JSON object mapping retailer key to rule.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let rules: BTreeMap<String, RetailerRule> = serde_json::from_str(json)?;
        Self::from_rules(rules)
    }

    /// Load either a single catalog file or a directory of per-retailer files.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if path.is_dir() {
            return Self::load_from_dir(path);
        }
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Each `*.json` file holds one rule plus its `id`. Unreadable files are skipped.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogError> {
        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut rules = vec![];
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().map_or(false, |e| e == "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str::<RuleFile>(&c).map_err(|e| e.to_string()));
            match parsed {
                Ok(file) => rules.push((file.id, file.rule)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping rule file"),
            }
        }
        Self::from_rules(rules)
    }

    /// Look up a retailer, falling back to `default` for unknown keys.
    pub fn resolve(&self, retailer: &str) -> ResolvedRule<'_> {
        match self.rules.get_key_value(retailer) {
            Some((key, rule)) => ResolvedRule {
                retailer: key.as_str(),
                rule,
                fell_back: false,
            },
            None => ResolvedRule {
                retailer: DEFAULT_RETAILER,
                rule: self.default_rule(),
                fell_back: true,
            },
        }
    }

    pub fn get(&self, retailer: &str) -> Option<&RetailerRule> {
        self.rules.get(retailer)
    }

    pub fn default_rule(&self) -> &RetailerRule {
        // builtin() seeds the entry and nothing removes it
        &self.rules[DEFAULT_RETAILER]
    }

    pub fn list(&self) -> impl Iterator<Item = (&str, &RetailerRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_retailer_falls_back() {
        let catalog = RuleCatalog::builtin();
        let resolved = catalog.resolve("acme");
        assert!(resolved.fell_back);
        assert_eq!(resolved.retailer, DEFAULT_RETAILER);
        assert_eq!(resolved.rule, &RetailerRule::builtin_default());
    }

    #[test]
    fn test_json_catalog_normalizes_words() {
        let json = r#"{
            "megamart": {
                "safe_zone_pct": 0.1,
                "max_packshot_pct": 0.5,
                "min_font_px": 24,
                "prohibited_words": ["Cheapest", "BEST"]
            }
        }"#;
        let catalog = RuleCatalog::from_json_str(json).unwrap();

        let resolved = catalog.resolve("megamart");
        assert!(!resolved.fell_back);
        assert_eq!(resolved.rule.prohibited_words, vec!["cheapest", "best"]);
        // default is always present
        assert!(catalog.get(DEFAULT_RETAILER).is_some());
    }

    #[test]
    fn test_out_of_range_pct_rejected() {
        let json = r#"{"bad": {"safe_zone_pct": 1.5, "max_packshot_pct": 0.5, "min_font_px": 12}}"#;
        let err = RuleCatalog::from_json_str(json).unwrap_err();
        assert!(matches!(err, CatalogError::OutOfRange { field: "safe_zone_pct", .. }));
    }

    #[test]
    fn test_load_from_dir_skips_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("shopco.json"),
            r#"{"id": "shopco", "safe_zone_pct": 0.08, "max_packshot_pct": 0.4, "min_font_px": 20, "prohibited_words": ["sale"]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = RuleCatalog::load(dir.path()).unwrap();
        let names: Vec<_> = catalog.list().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["default", "shopco"]);
        assert_eq!(catalog.get("shopco").unwrap().max_packshot_pct, 0.4);
    }
}
