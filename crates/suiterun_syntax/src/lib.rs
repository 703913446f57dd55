//! TTCN-3 definition scanner: lexer, definition parser, doc tags, diagnostics.
//!
//! This crate does not build a full TTCN-3 syntax tree. It recognises module-level structure (modules, groups,
//! definitions) well enough to list test cases and control parts together with the tags found in their leading
//! documentation comments. Bodies are skipped by bracket matching.
//!
//! ## Notes
//! - This crate is intentionally “syntax-only” and synchronous: no IO, no async runtime.
//! - Vocabulary identity (keywords) comes from `suiterun_core::lang` registries.
//!
//! ## Examples
//! ```rust
//! use suiterun_syntax::parse;
//!
//! let defs = parse("module m { testcase tc() runs on C {} control { execute(tc()) } }").unwrap();
//! let ids: Vec<_> = defs.tests().map(|d| d.qualified_name()).collect();
//! assert_eq!(ids, vec!["m.tc"]);
//! assert_eq!(defs.controls().next().map(|d| d.qualified_name()), Some("m.control".to_string()));
//! ```

pub mod ast;
pub mod diagnostics;
pub mod doc;
pub mod lexer;
pub mod parser;

pub use ast::{DefKind, Definition, Definitions, Span, Tag};
pub use diagnostics::SyntaxError;
pub use parser::parse;
