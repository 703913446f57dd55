//! Test selection baskets.
//!
//! A basket filters test identifiers by name and by documentation tags. The main basket is built from the command
//! line; named baskets come from the manifest and are enabled with `--baskets a,b`. A test is selected when the main
//! basket accepts it and, if any named baskets are enabled, at least one of them accepts it too.

use std::collections::BTreeMap;

use regex::Regex;
use suiterun_syntax::Tag;
use thiserror::Error;

use crate::project::BasketSpec;

/// Decides whether a test takes part in the run.
pub trait Selector: Send + Sync {
    fn matches(&self, id: &str, tags: &[Tag]) -> bool;
}

#[derive(Debug, Error)]
pub enum BasketError {
    #[error("invalid pattern {pattern:?} in basket {basket}: {source}")]
    Pattern {
        basket: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown basket {0:?}")]
    Unknown(String),
}

#[derive(Debug, Clone)]
struct TagPattern {
    name: Regex,
    value: Option<Regex>,
}

impl TagPattern {
    fn matches(&self, tag: &Tag) -> bool {
        self.name.is_match(&tag.name) && self.value.as_ref().is_none_or(|v| v.is_match(&tag.value))
    }
}

/// A compiled basket.
#[derive(Debug, Clone, Default)]
pub struct Basket {
    name: String,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    tags: Vec<TagPattern>,
    exclude_tags: Vec<TagPattern>,
    sub_baskets: Vec<Basket>,
}

impl Basket {
    /// Compile `spec` into a basket called `name`.
    pub fn new(name: impl Into<String>, spec: &BasketSpec) -> Result<Basket, BasketError> {
        let name = name.into();
        Ok(Basket {
            include: compile_all(&name, &spec.tests_regex)?,
            exclude: compile_all(&name, &spec.exclude)?,
            tags: compile_tags(&name, &spec.tags_regex)?,
            exclude_tags: compile_tags(&name, &spec.exclude_tags)?,
            sub_baskets: Vec::new(),
            name,
        })
    }

    /// A basket accepting every test.
    pub fn everything() -> Basket {
        Basket {
            name: "default".to_string(),
            ..Basket::default()
        }
    }

    /// Enable the named baskets from `defined`.
    ///
    /// ## Errors
    /// [`BasketError::Unknown`] for names that are not defined.
    pub fn with_sub_baskets(
        mut self,
        names: &[String],
        defined: &BTreeMap<String, BasketSpec>,
    ) -> Result<Basket, BasketError> {
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let spec = defined
                .get(name)
                .ok_or_else(|| BasketError::Unknown(name.to_string()))?;
            self.sub_baskets.push(Basket::new(name, spec)?);
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, id: &str, tags: &[Tag]) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|r| r.is_match(id)) {
            return false;
        }
        if self.exclude.iter().any(|r| r.is_match(id)) {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|p| tags.iter().any(|t| p.matches(t))) {
            return false;
        }
        !self.exclude_tags.iter().any(|p| tags.iter().any(|t| p.matches(t)))
    }
}

impl Selector for Basket {
    fn matches(&self, id: &str, tags: &[Tag]) -> bool {
        self.accepts(id, tags)
            && (self.sub_baskets.is_empty() || self.sub_baskets.iter().any(|b| b.accepts(id, tags)))
    }
}

fn compile_all(basket: &str, patterns: &[String]) -> Result<Vec<Regex>, BasketError> {
    patterns.iter().map(|p| compile(basket, p)).collect()
}

fn compile(basket: &str, pattern: &str) -> Result<Regex, BasketError> {
    Regex::new(pattern).map_err(|source| BasketError::Pattern {
        basket: basket.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_tags(basket: &str, patterns: &[String]) -> Result<Vec<TagPattern>, BasketError> {
    patterns
        .iter()
        .map(|p| {
            let (name, value) = match p.split_once(':') {
                Some((n, v)) => (n.trim(), Some(v.trim())),
                None => (p.trim(), None),
            };
            Ok(TagPattern {
                name: compile(basket, name)?,
                value: value.map(|v| compile(basket, v)).transpose()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(f: impl FnOnce(&mut BasketSpec)) -> BasketSpec {
        let mut s = BasketSpec::default();
        f(&mut s);
        s
    }

    #[test]
    fn empty_basket_matches_everything() {
        assert!(Basket::everything().matches("m.tc", &[]));
    }

    #[test]
    fn include_and_exclude_patterns() {
        let b = Basket::new(
            "main",
            &spec(|s| {
                s.tests_regex = vec!["^m\\.".into()];
                s.exclude = vec!["slow".into()];
            }),
        )
        .unwrap();
        assert!(b.matches("m.tc_fast", &[]));
        assert!(!b.matches("m.tc_slow", &[]));
        assert!(!b.matches("other.tc", &[]));
    }

    #[test]
    fn tag_patterns_with_values() {
        let b = Basket::new(
            "main",
            &spec(|s| {
                s.tags_regex = vec!["feature:handover".into()];
                s.exclude_tags = vec!["flaky".into()];
            }),
        )
        .unwrap();
        let handover = [Tag::new("feature", "handover, roaming")];
        let flaky = [Tag::new("feature", "handover"), Tag::new("flaky", "")];
        assert!(b.matches("m.a", &handover));
        assert!(!b.matches("m.b", &flaky));
        assert!(!b.matches("m.c", &[Tag::new("feature", "paging")]));
        assert!(!b.matches("m.d", &[]));
    }

    #[test]
    fn sub_baskets_are_alternatives() {
        let mut defined = BTreeMap::new();
        defined.insert("smoke".to_string(), spec(|s| s.tags_regex = vec!["smoke".into()]));
        defined.insert("lte".to_string(), spec(|s| s.tests_regex = vec!["lte".into()]));

        let b = Basket::everything()
            .with_sub_baskets(&["smoke".into(), "lte".into()], &defined)
            .unwrap();
        assert!(b.matches("m.x", &[Tag::new("smoke", "")]));
        assert!(b.matches("lte.x", &[]));
        assert!(!b.matches("nr.x", &[]));
    }

    #[test]
    fn unknown_basket_is_an_error() {
        let err = Basket::everything()
            .with_sub_baskets(&["nope".into()], &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, BasketError::Unknown(name) if name == "nope"));
    }

    #[test]
    fn invalid_regex_names_the_pattern() {
        let err = Basket::new("main", &spec(|s| s.exclude = vec!["(".into()])).unwrap_err();
        assert!(err.to_string().contains("\"(\""), "{err}");
    }
}
