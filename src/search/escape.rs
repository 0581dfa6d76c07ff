// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query syntax escaping.
//!
//! Every reserved character of the standard query parser is prefixed with a
//! backslash so the term matches the raw value literally:
//!
//! ```text
//! + - & | ! ( ) { } [ ] ^ " ~ * ? : \ /  and whitespace
//! ```

/// Whether `c` must be backslash-escaped inside a query term
pub fn is_reserved(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '&' | '|' | '!' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '"' | '~' | '*'
            | '?' | ':' | '\\' | '/'
    ) || c.is_whitespace()
}

/// Escape every reserved character in `value`.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if is_reserved(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
