use crate::ast::Definitions;
use crate::diagnostics::SyntaxError;
use crate::lexer;

use super::Parser;

/// Scan TTCN-3 source text into its module-level [`Definitions`].
///
/// This is the main public entrypoint of the crate.
///
/// ## Errors
/// Returns every lexer error, or every parser error if lexing succeeded.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn parse(source: &str) -> Result<Definitions, Vec<SyntaxError>> {
    let tokens = lexer::lex(source)?;
    Parser::new(&tokens).parse()
}
