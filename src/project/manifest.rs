//! `package.yml` schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw manifest contents as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    pub name: Option<String>,
    /// Files and directories, relative to the manifest.
    pub sources: Vec<String>,
    /// Per-test timeout in seconds.
    pub timeout: Option<f64>,
    /// Environment for every test. Scalar values of any YAML type are accepted and passed as strings.
    #[serde(alias = "parameters")]
    pub variables: BTreeMap<String, serde_yaml::Value>,
    pub runtime: Option<CommandLine>,
    pub baskets: BTreeMap<String, BasketSpec>,
}

/// A command line, written either as one string or as a list of arguments.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandLine {
    Line(String),
    Args(Vec<String>),
}

/// Selection rules of one basket.
///
/// All patterns are regular expressions, matched anywhere in the subject. Tag patterns have the form
/// `name` or `name:value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasketSpec {
    /// Only identifiers matching one of these are selected.
    #[serde(alias = "run_pattern")]
    pub tests_regex: Vec<String>,
    /// Identifiers matching one of these are dropped.
    #[serde(alias = "exclude_regex")]
    pub exclude: Vec<String>,
    /// Only tests carrying a tag that matches one of these are selected.
    pub tags_regex: Vec<String>,
    /// Tests carrying a tag that matches one of these are dropped.
    pub exclude_tags: Vec<String>,
}

impl BasketSpec {
    pub fn is_empty(&self) -> bool {
        self.tests_regex.is_empty()
            && self.exclude.is_empty()
            && self.tags_regex.is_empty()
            && self.exclude_tags.is_empty()
    }
}

impl Manifest {
    pub fn from_yaml(text: &str) -> Result<Manifest, serde_yaml::Error> {
        // An empty document is a valid, empty manifest.
        if text.trim().is_empty() {
            return Ok(Manifest::default());
        }
        serde_yaml::from_str(text)
    }

    /// Variables with their values rendered as strings. `null` becomes the empty string.
    pub fn variables(&self) -> BTreeMap<String, String> {
        self.variables
            .iter()
            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
            .collect()
    }

    /// Runtime command split into program and arguments.
    pub fn runtime_argv(&self) -> Vec<String> {
        match &self.runtime {
            None => Vec::new(),
            Some(CommandLine::Line(line)) => line.split_whitespace().map(str::to_string).collect(),
            Some(CommandLine::Args(args)) => args.clone(),
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
