//! Definition parser.
//!
//! The parser walks the token stream at module level only:
//!
//! ```text
//! module <name> [language "..."] { <item>* } [with { ... }] [;]
//! item := [private|public|friend] ( testcase | control | function | altstep | group | <other> )
//! ```
//!
//! Test cases, control parts, functions and altsteps are recorded; groups are transparent (their items belong to the
//! enclosing module); all other items are skipped up to their end. Bodies are never parsed, only bracket-matched.

mod api;

pub use api::parse;

use suiterun_core::lang::keywords::{self, KeywordId};

use crate::ast::{DefKind, Definition, Definitions, Module, Span};
use crate::diagnostics::SyntaxError;
use crate::doc::find_all_tags;
use crate::lexer::{Token, TokenKind};

/// Keywords that can start a module-level item.
const ITEM_STARTS: &[KeywordId] = &[
    KeywordId::Testcase,
    KeywordId::Control,
    KeywordId::Function,
    KeywordId::Altstep,
    KeywordId::Template,
    KeywordId::Type,
    KeywordId::Const,
    KeywordId::Modulepar,
    KeywordId::Signature,
    KeywordId::External,
    KeywordId::Import,
    KeywordId::Group,
    KeywordId::Private,
    KeywordId::Public,
    KeywordId::Friend,
];

/// Parser state.
///
/// ## Notes
/// - Recovers from errors at module boundaries so one file reports all of its problems in one pass.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<SyntaxError>,
    out: Definitions,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream ending with `Eof`.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            out: Definitions::default(),
        }
    }

    /// Parse every module in the token stream.
    ///
    /// ## Errors
    /// Returns all [`SyntaxError`]s found. A file with errors yields no definitions.
    pub fn parse(mut self) -> Result<Definitions, Vec<SyntaxError>> {
        while !self.is_at_end() {
            if self.current().is_keyword(KeywordId::Module) {
                if let Err(e) = self.module() {
                    self.errors.push(e);
                    self.synchronize();
                }
            } else if self.current().is_punct(';') {
                self.advance();
            } else {
                let tok = self.advance();
                self.errors.push(
                    SyntaxError::new("expected `module`", tok.span)
                        .with_hint("TTCN-3 files contain one or more module definitions"),
                );
                self.synchronize();
            }
        }

        if self.errors.is_empty() {
            Ok(self.out)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Token cursor
    // ========================================================================

    fn current(&self) -> &'a Token {
        // The stream always ends with Eof; the cursor never moves past it.
        &self.tokens[self.pos.min(self.tokens.len().saturating_sub(1))]
    }

    fn is_at_end(&self) -> bool {
        self.tokens.is_empty() || self.current().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &'a Token {
        let tok = self.current();
        if !self.is_at_end() {
            self.pos += 1;
        }
        tok
    }

    fn expect_punct(&mut self, c: char, context: &str) -> Result<&'a Token, SyntaxError> {
        if self.current().is_punct(c) {
            Ok(self.advance())
        } else {
            Err(SyntaxError::new(
                format!("expected `{c}` {context}"),
                self.current().span,
            ))
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<&'a Token, SyntaxError> {
        if self.current().ident().is_some() {
            Ok(self.advance())
        } else {
            Err(SyntaxError::new(
                format!("expected identifier {context}"),
                self.current().span,
            ))
        }
    }

    /// Skip to the next `module` keyword.
    fn synchronize(&mut self) {
        while !self.is_at_end() && !self.current().is_keyword(KeywordId::Module) {
            self.advance();
        }
    }

    // ========================================================================
    // Modules and items
    // ========================================================================

    fn module(&mut self) -> Result<(), SyntaxError> {
        let kw = self.advance();
        let name_tok = self.expect_ident("after `module`")?;
        let name = name_tok.ident().unwrap_or_default().to_string();

        if self.current().is_keyword(KeywordId::Language) {
            self.advance();
            while matches!(self.current().kind, TokenKind::String(_)) || self.current().is_punct(',') {
                self.advance();
            }
        }
        self.expect_punct('{', &format!("to open module `{name}`"))?;

        self.out.modules.push(Module {
            name: name.clone(),
            span: kw.span.merge(name_tok.span),
            tags: find_all_tags(&kw.comments),
        });

        self.items(&name)?;

        if !self.current().is_punct('}') {
            return Err(SyntaxError::new(
                format!("unexpected end of file, expected `}}` to close module `{name}`"),
                self.current().span,
            ));
        }
        self.advance();

        if self.current().is_keyword(KeywordId::With) {
            self.advance();
            self.skip_balanced()?;
        }
        Ok(())
    }

    /// Parse items until the closing `}` of the enclosing module or group (not consumed).
    fn items(&mut self, module: &str) -> Result<(), SyntaxError> {
        while !self.is_at_end() && !self.current().is_punct('}') {
            if self.current().is_punct(';') {
                self.advance();
                continue;
            }
            self.item(module)?;
        }
        Ok(())
    }

    fn item(&mut self, module: &str) -> Result<(), SyntaxError> {
        let first = self.current();
        while let TokenKind::Keyword(id) = self.current().kind {
            if !keywords::is_visibility(id) {
                break;
            }
            self.advance();
        }

        let tok = self.current();
        let kind = match tok.kind {
            TokenKind::Keyword(KeywordId::Testcase) => Some(DefKind::Testcase),
            TokenKind::Keyword(KeywordId::Function) => Some(DefKind::Function),
            TokenKind::Keyword(KeywordId::Altstep) => Some(DefKind::Altstep),
            TokenKind::Keyword(KeywordId::Control) => {
                self.advance();
                self.push_def(DefKind::Control, module, "control".to_string(), first, tok);
                return self.skip_item();
            }
            TokenKind::Keyword(KeywordId::Group) => {
                self.advance();
                self.expect_ident("after `group`")?;
                self.expect_punct('{', "to open group")?;
                self.items(module)?;
                self.expect_punct('}', "to close group")?;
                if self.current().is_keyword(KeywordId::With) {
                    self.advance();
                    self.skip_balanced()?;
                }
                return Ok(());
            }
            _ => None,
        };

        let Some(kind) = kind else {
            return self.skip_item();
        };

        self.advance();
        // Modifiers like `@deterministic`
        while self.current().is_punct('@') {
            self.advance();
            self.expect_ident("after `@`")?;
        }
        let name_tok = self.expect_ident(&format!("after `{}`", kind_keyword(kind)))?;
        let name = name_tok.ident().unwrap_or_default().to_string();
        self.push_def(kind, module, name, first, name_tok);
        self.skip_item()
    }

    fn push_def(&mut self, kind: DefKind, module: &str, name: String, first: &Token, last: &Token) {
        self.out.defs.push(Definition {
            kind,
            module: module.to_string(),
            name,
            span: first.span.merge(last.span),
            tags: find_all_tags(&first.comments),
        });
    }

    /// Skip the remainder of an item.
    ///
    /// An item ends after a `;` at bracket depth zero, or right before a token at depth zero that starts another item
    /// or closes the enclosing scope.
    fn skip_item(&mut self) -> Result<(), SyntaxError> {
        let mut consumed = false;
        loop {
            let tok = self.current();
            match &tok.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::Punct(';') => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Punct('}') => return Ok(()),
                TokenKind::Punct(')') | TokenKind::Punct(']') => {
                    return Err(SyntaxError::new(
                        format!("unexpected `{}`", tok_char(tok)),
                        tok.span,
                    ));
                }
                TokenKind::Punct('{') | TokenKind::Punct('(') | TokenKind::Punct('[') => {
                    self.skip_balanced()?;
                }
                TokenKind::Keyword(id) if consumed && ITEM_STARTS.contains(id) => return Ok(()),
                _ => {
                    self.advance();
                }
            }
            consumed = true;
        }
    }

    /// Skip one bracketed group starting at the current opening bracket.
    fn skip_balanced(&mut self) -> Result<(), SyntaxError> {
        let open = self.advance();
        let mut stack = vec![closer(open)];
        while let Some(&expected) = stack.last() {
            let tok = self.current();
            match tok.kind {
                TokenKind::Eof => {
                    return Err(SyntaxError::new(format!("unclosed `{}`", tok_char(open)), open.span)
                        .with_hint(format!("add the missing `{expected}`")));
                }
                TokenKind::Punct(c @ ('{' | '(' | '[')) => stack.push(closer_of(c)),
                TokenKind::Punct(c @ ('}' | ')' | ']')) => {
                    if c != expected {
                        return Err(SyntaxError::new(
                            format!("mismatched `{c}`, expected `{expected}`"),
                            tok.span,
                        ));
                    }
                    stack.pop();
                }
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }
}

fn closer_of(c: char) -> char {
    match c {
        '{' => '}',
        '(' => ')',
        _ => ']',
    }
}

fn closer(tok: &Token) -> char {
    closer_of(tok_char(tok))
}

fn tok_char(tok: &Token) -> char {
    match tok.kind {
        TokenKind::Punct(c) => c,
        _ => '?',
    }
}

fn kind_keyword(kind: DefKind) -> &'static str {
    keywords::as_str(match kind {
        DefKind::Testcase => KeywordId::Testcase,
        DefKind::Control => KeywordId::Control,
        DefKind::Function => KeywordId::Function,
        DefKind::Altstep => KeywordId::Altstep,
    })
}

#[cfg(test)]
mod tests;
