//! Shared, pure vocabulary for the suiterun tooling.
//!
//! This crate is intentionally small and dependency-free. It contains the pieces both the source scanner and the
//! test runner need to agree on:
//! - the reserved TTCN-3 keywords the scanner recognises ([`lang::keywords`]), and
//! - the verdict vocabulary used when reporting and persisting results ([`verdict`]).
//!
//! ## Notes
//!
//! - **No IO**, no global state, no runtime types. Anything that touches the file system or processes lives in the
//!   `suiterun` crate.

pub mod lang;
pub mod verdict;

pub use verdict::{Verdict, VerdictClass};
