#![no_main]

use libfuzzer_sys::fuzz_target;
use suiterun_syntax::{doc, lexer, parse};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // Fuzz the lexer, then the tag scanner on whatever comments it collected
        if let Ok(tokens) = lexer::lex(s) {
            for token in &tokens {
                let _ = doc::find_all_tags(&token.comments);
            }
        }
        // Errors must be reported, never panic
        if let Err(errors) = parse(s) {
            for e in errors {
                let _ = suiterun_syntax::diagnostics::line_col(s, e.span.start);
            }
        }
    }
});
