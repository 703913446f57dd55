//! Lexer for TTCN-3 source files
//!
//! Handles tokenization including:
//! - Keywords relevant to module structure (see `suiterun_core::lang::keywords`)
//! - Identifiers, numbers, charstrings (`"a""b"`) and bit/hex/octet strings (`'0A'O`)
//! - Line (`//`) and block (`/* */`) comments, attached to the following token
//! - Everything else as single-character punctuation

pub mod tokens;

pub use tokens::{Token, TokenKind, keyword_id};

use crate::ast::Span;
use crate::diagnostics::SyntaxError;

/// Lexer for TTCN-3 source code.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pending_comments: Vec<String>,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            pending_comments: Vec::new(),
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source code.
    ///
    /// The token stream always ends with an `Eof` token, which carries any trailing comments.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<SyntaxError>> {
        while let Some((start, c)) = self.chars.next() {
            self.scan_token(start, c);
        }

        let end = self.source.len();
        self.push(TokenKind::Eof, Span::new(end, end));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        let mut token = Token::new(kind, span);
        token.comments = std::mem::take(&mut self.pending_comments);
        self.tokens.push(token);
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.source.len())
    }

    fn scan_token(&mut self, start: usize, c: char) {
        match c {
            c if c.is_whitespace() => {}
            '/' if self.peek() == Some('/') => self.line_comment(start),
            '/' if self.peek() == Some('*') => self.block_comment(start),
            '"' => self.charstring(start),
            '\'' => self.bitstring(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.word(start),
            c if c.is_ascii_digit() => self.number(start),
            c => self.push(TokenKind::Punct(c), Span::new(start, start + c.len_utf8())),
        }
    }

    fn line_comment(&mut self, start: usize) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
        let end = self.pos();
        self.pending_comments.push(self.source[start..end].to_string());
    }

    fn block_comment(&mut self, start: usize) {
        self.chars.next(); // '*'
        let mut prev = '\0';
        while let Some((_, c)) = self.chars.next() {
            if prev == '*' && c == '/' {
                let end = self.pos();
                self.pending_comments.push(self.source[start..end].to_string());
                return;
            }
            prev = c;
        }
        self.errors.push(
            SyntaxError::new("unterminated block comment", Span::new(start, self.source.len()))
                .with_hint("close the comment with `*/`"),
        );
    }

    fn charstring(&mut self, start: usize) {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => {
                    // `""` is an escaped quote
                    if self.peek() == Some('"') {
                        self.chars.next();
                        value.push('"');
                        continue;
                    }
                    let end = self.pos();
                    self.push(TokenKind::String(value), Span::new(start, end));
                    return;
                }
                Some((_, '\\')) => {
                    value.push('\\');
                    if let Some((_, c)) = self.chars.next() {
                        value.push(c);
                    }
                }
                Some((_, c)) => value.push(c),
                None => {
                    self.errors
                        .push(SyntaxError::new("unterminated string", Span::new(start, self.source.len())));
                    return;
                }
            }
        }
    }

    fn bitstring(&mut self, start: usize) {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\'')) => break,
                Some((_, '\n')) | None => {
                    let end = self.pos();
                    self.errors
                        .push(SyntaxError::new("unterminated string", Span::new(start, end)));
                    return;
                }
                Some((_, c)) => value.push(c),
            }
        }
        // B, H or O suffix
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.chars.next();
        }
        let end = self.pos();
        self.push(TokenKind::String(value), Span::new(start, end));
    }

    fn word(&mut self, start: usize) {
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.chars.next();
        }
        let end = self.pos();
        let text = &self.source[start..end];
        let kind = match keyword_id(text) {
            Some(id) => TokenKind::Keyword(id),
            None => TokenKind::Ident(text.to_string()),
        };
        self.push(kind, Span::new(start, end));
    }

    fn number(&mut self, start: usize) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        {
            // `1..2` is a range, not a float
            if self.peek() == Some('.') && self.source[self.pos()..].starts_with("..") {
                break;
            }
            self.chars.next();
        }
        let end = self.pos();
        self.push(TokenKind::Number(self.source[start..end].to_string()), Span::new(start, end));
    }
}

/// Tokenize `source`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<SyntaxError>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use suiterun_core::lang::keywords::KeywordId;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("module Foo {}"),
            vec![
                TokenKind::Keyword(KeywordId::Module),
                TokenKind::Ident("Foo".into()),
                TokenKind::Punct('{'),
                TokenKind::Punct('}'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_attach_to_next_token() {
        let tokens = lex("// one\n/* two */ testcase").unwrap();
        assert_eq!(tokens[0].comments, vec!["// one".to_string(), "/* two */".to_string()]);
        assert!(tokens[0].is_keyword(KeywordId::Testcase));
    }

    #[test]
    fn trailing_comments_go_to_eof() {
        let tokens = lex("x // tail").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Eof);
        assert_eq!(tokens[1].comments, vec!["// tail".to_string()]);
    }

    #[test]
    fn doubled_quote_escapes() {
        assert_eq!(kinds(r#""a""b""#)[0], TokenKind::String("a\"b".into()));
    }

    #[test]
    fn bitstring_with_suffix() {
        assert_eq!(kinds("'0A'O;"), vec![
            TokenKind::String("0A".into()),
            TokenKind::Punct(';'),
            TokenKind::Eof
        ]);
    }

    #[test]
    fn range_is_not_a_float() {
        assert_eq!(
            kinds("1..2"),
            vec![
                TokenKind::Number("1".into()),
                TokenKind::Punct('.'),
                TokenKind::Punct('.'),
                TokenKind::Number("2".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let errs = lex("/* open").unwrap_err();
        assert_eq!(errs[0].message, "unterminated block comment");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(lex("\"abc").is_err());
    }

    #[test]
    fn unterminated_bitstring_stops_at_line_end() {
        let errs = lex("x := '0A\ny").unwrap_err();
        assert_eq!(errs[0].message, "unterminated string");
        assert_eq!(errs[0].span, Span::new(5, 9));
    }
}
