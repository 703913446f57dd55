//! Documentation tag extraction.
//!
//! Tags are written inside comments preceding a definition:
//!
//! ```text
//! /**
//!  * @stable
//!  * @feature handover, roaming
//!  */
//! testcase TC_handover() runs on MTC {}
//! ```
//!
//! A tag starts with `@` at the beginning of a comment line or after whitespace. Its value is the rest of the text
//! up to the next tag or the end of the line.

use crate::ast::Tag;

/// Collect all tags from a list of raw comments (delimiters included), in order.
pub fn find_all_tags<S: AsRef<str>>(comments: &[S]) -> Vec<Tag> {
    let mut tags = Vec::new();
    for comment in comments {
        for line in comment.as_ref().lines() {
            scan_line(strip_decoration(line), &mut tags);
        }
    }
    tags
}

fn strip_decoration(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_suffix("*/").unwrap_or(line);
    line.trim_start_matches(['/', '*', '!']).trim()
}

fn scan_line(line: &str, tags: &mut Vec<Tag>) {
    let mut rest = line;
    let mut at_boundary = true;
    while let Some(idx) = rest.find('@') {
        let preceded_by_space = (idx == 0 && at_boundary) || rest[..idx].ends_with(char::is_whitespace);
        let after = &rest[idx + 1..];
        let name_len = after
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-' || c == '.'))
            .unwrap_or(after.len());

        if !preceded_by_space || name_len == 0 {
            rest = &after[name_len..];
            at_boundary = false;
            continue;
        }

        let name = &after[..name_len];
        let tail = &after[name_len..];
        let value_end = next_tag_start(tail).unwrap_or(tail.len());
        let value = tail[..value_end].trim().trim_start_matches(':').trim();
        tags.push(Tag::new(name, value));

        rest = &tail[value_end..];
        at_boundary = true;
    }
}

/// Position of the next ` @name` in `s`.
fn next_tag_start(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    (1..bytes.len()).find(|&i| {
        bytes[i] == b'@'
            && bytes[i - 1].is_ascii_whitespace()
            && bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
    })
}
