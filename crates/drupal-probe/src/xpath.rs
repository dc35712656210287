//! XPath template resolution.
//!
//! Templates carry `{key}` placeholders and a map of default replacement
//! values. Resolution merges the defaults with per-call overrides, overrides
//! winning on collision. Placeholders with no value are left verbatim in the
//! lenient path and reported by the strict one.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::result::{ProbeError, ProbeResult};

/// Pattern used by Drupal form elements: any element whose
/// `data-drupal-selector` equals the identifier.
pub const DEFAULT_PATTERN: &str = "//{element}[@{attribute}=\"{identifier}\"]";

/// Default `element` replacement
pub const DEFAULT_ELEMENT: &str = "*";

/// Default `attribute` replacement
pub const DEFAULT_ATTRIBUTE: &str = "data-drupal-selector";

#[allow(clippy::expect_used)]
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("literal pattern"))
}

/// Substitute every `{key}` in `pattern` for each key present in `values`.
///
/// Keys may hold any text except braces. Keys missing from `values` stay in
/// the output untouched. The pattern is scanned once, so substituted values
/// are never resolved again.
#[must_use]
pub fn resolve<K, V>(pattern: &str, values: &BTreeMap<K, V>) -> String
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    placeholder_regex()
        .replace_all(pattern, |caps: &regex::Captures<'_>| {
            values
                .get(&caps[1])
                .map_or_else(|| caps[0].to_string(), |v| v.as_ref().to_string())
        })
        .into_owned()
}

/// Placeholder keys still present in `text`, in order of appearance.
#[must_use]
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// An immutable XPath pattern plus default replacement values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpathTemplate {
    pattern: String,
    replacements: BTreeMap<String, String>,
}

impl Default for XpathTemplate {
    fn default() -> Self {
        Self::drupal_selector()
    }
}

impl XpathTemplate {
    /// Create a template with no default replacements
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacements: BTreeMap::new(),
        }
    }

    /// The `data-drupal-selector` template with `element`, `attribute` and an
    /// empty `identifier` preset.
    #[must_use]
    pub fn drupal_selector() -> Self {
        Self::new(DEFAULT_PATTERN)
            .with_replacement("element", DEFAULT_ELEMENT)
            .with_replacement("attribute", DEFAULT_ATTRIBUTE)
            .with_replacement("identifier", "")
    }

    /// Add a default replacement
    #[must_use]
    pub fn with_replacement(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_replacement(key, value);
        self
    }

    /// Set a default replacement in place
    pub fn set_replacement(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let _ = self.replacements.insert(key.into(), value.into());
        self
    }

    /// Get the raw pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Get a default replacement value
    #[must_use]
    pub fn replacement(&self, key: &str) -> Option<&str> {
        self.replacements.get(key).map(String::as_str)
    }

    fn merged<'a>(&'a self, overrides: &'a [(&'a str, &'a str)]) -> BTreeMap<&'a str, &'a str> {
        let mut merged: BTreeMap<&str, &str> = self
            .replacements
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        for &(key, value) in overrides {
            let _ = merged.insert(key, value);
        }
        merged
    }

    /// Resolve the pattern leniently.
    ///
    /// Unresolved placeholders are kept; debug builds log them.
    #[must_use]
    pub fn xpath(&self, overrides: &[(&str, &str)]) -> String {
        let resolved = resolve(&self.pattern, &self.merged(overrides));
        if cfg!(debug_assertions) {
            let leftover = unresolved_placeholders(&resolved);
            if !leftover.is_empty() {
                tracing::warn!(pattern = %self.pattern, ?leftover, "xpath has unresolved placeholders");
            }
        }
        resolved
    }

    /// Resolve the pattern, failing if any placeholder is left.
    pub fn try_xpath(&self, overrides: &[(&str, &str)]) -> ProbeResult<String> {
        let resolved = resolve(&self.pattern, &self.merged(overrides));
        let placeholders = unresolved_placeholders(&resolved);
        if placeholders.is_empty() {
            Ok(resolved)
        } else {
            Err(ProbeError::UnresolvedPlaceholder {
                placeholders,
                pattern: resolved,
            })
        }
    }
}
