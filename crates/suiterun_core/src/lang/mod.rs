//! TTCN-3 language vocabulary registries.
//!
//! Callers work with stable IDs (e.g. [`keywords::KeywordId`]) and look up spellings via registry tables instead of
//! comparing raw strings.
//!
//! ## Examples
//! ```rust
//! use suiterun_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("testcase"), Some(KeywordId::Testcase));
//! assert_eq!(keywords::as_str(KeywordId::Control), "control");
//! ```

pub mod keywords;
