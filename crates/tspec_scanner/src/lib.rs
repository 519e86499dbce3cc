//! tspec_scanner: Lexer for tspec source text.
//!
//! Produces tokens for the parser, including:
//! - keywords and unicode identifiers (plus backtick-escaped identifiers)
//! - decimal, hexadecimal and binary numeric literals
//! - single and triple-quoted strings with `${ }` template interpolation
//! - decorator, augment, object-value and array-value punctuation

mod char_codes;
mod scanner;

pub use scanner::{Scanner, ScannerState};
