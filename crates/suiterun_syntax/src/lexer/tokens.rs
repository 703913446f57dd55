//! Token types for the TTCN-3 lexer.
//!
//! ## Notes
//! - Keyword tokens carry stable IDs from `suiterun_core::lang::keywords`.
//! - Comments are not tokens. They are attached to the next token as leading trivia, which is where the scanner
//!   looks for documentation tags.

use crate::ast::Span;
use suiterun_core::lang::keywords::{self, KeywordId};

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(KeywordId),
    Ident(String),
    /// Charstring or bit/hex/octet string literal, without delimiters.
    String(String),
    Number(String),
    /// Any other single character: brackets, separators, operators.
    Punct(char),
    Eof,
}

/// A token with its kind, source span and leading comments.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Comments between the previous token and this one, delimiters included.
    pub comments: Vec<String>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            comments: Vec::new(),
        }
    }

    pub fn is_keyword(&self, id: KeywordId) -> bool {
        self.kind == TokenKind::Keyword(id)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
