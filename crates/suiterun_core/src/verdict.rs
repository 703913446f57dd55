//! Verdict vocabulary.
//!
//! A verdict is the terminal outcome label of a test job. TTCN-3 defines `pass`, `fail`, `inconc`, `none` and
//! `error`, but runtimes are free to report tool-specific strings, so a verdict is data ([`Verdict`] wraps the
//! spelling) rather than a closed enum. [`VerdictClass`] is the coarse classification used for coloring.
//!
//! ## Examples
//! ```rust
//! use suiterun_core::verdict::{Verdict, VerdictClass};
//!
//! assert!(Verdict::pass().is_pass());
//! assert_eq!(Verdict::new("inconc").class(), VerdictClass::Warning);
//! assert_eq!(Verdict::new("timeout").class(), VerdictClass::Failure);
//! ```

use std::fmt;

pub const PASS: &str = "pass";
pub const FAIL: &str = "fail";
pub const INCONC: &str = "inconc";
pub const NONE: &str = "none";
pub const ERROR: &str = "error";

/// Display verdict for jobs that could not be evaluated at all.
///
/// Never produced by a runtime; the runner uses it when rendering and persisting infrastructure errors.
pub const FATAL: &str = "fatal";

/// Terminal outcome label of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Verdict(String);

impl Verdict {
    /// Wrap a verdict spelling. Surrounding whitespace is trimmed and the spelling lower-cased; an empty spelling
    /// becomes `none`.
    pub fn new(spelling: impl AsRef<str>) -> Self {
        let s = spelling.as_ref().trim();
        if s.is_empty() {
            Self(NONE.to_string())
        } else {
            Self(s.to_ascii_lowercase())
        }
    }

    pub fn pass() -> Self {
        Self(PASS.to_string())
    }

    pub fn fail() -> Self {
        Self(FAIL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Only `pass` counts as success.
    pub fn is_pass(&self) -> bool {
        self.0 == PASS
    }

    pub fn class(&self) -> VerdictClass {
        classify(&self.0)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Verdict {
    fn from(s: &str) -> Self {
        Verdict::new(s)
    }
}

/// Coarse verdict classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictClass {
    Success,
    Warning,
    Failure,
}

/// Classify a display verdict spelling. `inconc` and `none` are warnings, `pass` is success, anything else
/// (including `fatal` and unknown tool verdicts) is a failure.
pub fn classify(spelling: &str) -> VerdictClass {
    match spelling {
        PASS => VerdictClass::Success,
        INCONC | NONE => VerdictClass::Warning,
        _ => VerdictClass::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spelling_is_none() {
        assert_eq!(Verdict::new("  ").as_str(), NONE);
    }

    #[test]
    fn spelling_is_normalised() {
        assert_eq!(Verdict::new(" PASS\n"), Verdict::pass());
    }

    #[test]
    fn only_pass_is_pass() {
        for v in [FAIL, INCONC, NONE, ERROR, "timeout"] {
            assert!(!Verdict::new(v).is_pass(), "{v}");
        }
    }

    #[test]
    fn classification() {
        assert_eq!(classify(PASS), VerdictClass::Success);
        assert_eq!(classify(NONE), VerdictClass::Warning);
        assert_eq!(classify(FATAL), VerdictClass::Failure);
        assert_eq!(classify("tool-specific"), VerdictClass::Failure);
    }
}
