//! Define the reserved keyword vocabulary the definition scanner cares about.
//!
//! This is not the full TTCN-3 keyword list. It covers the words that open or qualify module-level definitions, which
//! is everything the scanner needs to find test cases and control parts. Other reserved words lex as plain
//! identifiers.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive** (TTCN-3 keywords are lower case).
//! - This registry is intentionally **pure** (no AST/IO/side effects).
//!
//! ## Examples
//! ```rust
//! use suiterun_core::lang::keywords::{self, KeywordId, KeywordCategory};
//!
//! assert_eq!(keywords::from_str("module"), Some(KeywordId::Module));
//! assert_eq!(keywords::from_str("Module"), None);
//! assert_eq!(keywords::info_for(KeywordId::Private).category, KeywordCategory::Visibility);
//! ```

/// Stable identifier for every keyword known to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Structure
    Module,
    Group,
    Import,
    Language,
    With,

    // Definitions
    Testcase,
    Control,
    Function,
    Altstep,
    Template,
    Type,
    Const,
    Modulepar,
    Signature,
    External,

    // Signature clauses
    Runs,
    On,
    System,
    Mtc,
    Return,

    // Visibility
    Private,
    Public,
    Friend,
}

/// High-level grouping for diagnostics and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Structure,
    Definition,
    Clause,
    Visibility,
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
}

const fn info(id: KeywordId, canonical: &'static str, category: KeywordCategory) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
    }
}

/// Registry of all keywords.
///
/// ## Notes
/// - The ordering is not semantically meaningful, but is grouped for readability.
pub const KEYWORDS: &[KeywordInfo] = &[
    info(KeywordId::Module, "module", KeywordCategory::Structure),
    info(KeywordId::Group, "group", KeywordCategory::Structure),
    info(KeywordId::Import, "import", KeywordCategory::Structure),
    info(KeywordId::Language, "language", KeywordCategory::Structure),
    info(KeywordId::With, "with", KeywordCategory::Structure),
    info(KeywordId::Testcase, "testcase", KeywordCategory::Definition),
    info(KeywordId::Control, "control", KeywordCategory::Definition),
    info(KeywordId::Function, "function", KeywordCategory::Definition),
    info(KeywordId::Altstep, "altstep", KeywordCategory::Definition),
    info(KeywordId::Template, "template", KeywordCategory::Definition),
    info(KeywordId::Type, "type", KeywordCategory::Definition),
    info(KeywordId::Const, "const", KeywordCategory::Definition),
    info(KeywordId::Modulepar, "modulepar", KeywordCategory::Definition),
    info(KeywordId::Signature, "signature", KeywordCategory::Definition),
    info(KeywordId::External, "external", KeywordCategory::Definition),
    info(KeywordId::Runs, "runs", KeywordCategory::Clause),
    info(KeywordId::On, "on", KeywordCategory::Clause),
    info(KeywordId::System, "system", KeywordCategory::Clause),
    info(KeywordId::Mtc, "mtc", KeywordCategory::Clause),
    info(KeywordId::Return, "return", KeywordCategory::Clause),
    info(KeywordId::Private, "private", KeywordCategory::Visibility),
    info(KeywordId::Public, "public", KeywordCategory::Visibility),
    info(KeywordId::Friend, "friend", KeywordCategory::Visibility),
];

/// Resolve a spelling to a keyword id.
pub fn from_str(name: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == name).map(|k| k.id)
}

/// Canonical spelling of a keyword.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Registry entry for a keyword.
///
/// Every `KeywordId` variant has exactly one entry in [`KEYWORDS`]; the fallback arm exists only so this function
/// stays total without panicking.
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).unwrap_or(&KEYWORDS[0])
}

/// True for `private`/`public`/`friend`.
pub fn is_visibility(id: KeywordId) -> bool {
    info_for(id).category == KeywordCategory::Visibility
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_round_trips_through_its_spelling() {
        for k in KEYWORDS {
            assert_eq!(from_str(k.canonical), Some(k.id), "{}", k.canonical);
            assert_eq!(as_str(k.id), k.canonical);
        }
    }

    #[test]
    fn spellings_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for k in KEYWORDS {
            assert!(seen.insert(k.canonical), "duplicate spelling {}", k.canonical);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(from_str("TESTCASE"), None);
        assert_eq!(from_str("testcase"), Some(KeywordId::Testcase));
    }

    #[test]
    fn visibility_keywords() {
        assert!(is_visibility(KeywordId::Friend));
        assert!(!is_visibility(KeywordId::Testcase));
    }
}
