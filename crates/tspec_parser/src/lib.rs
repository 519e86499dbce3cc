//! tspec_parser: Recursive descent parser for tspec.
//!
//! Parses token streams from the scanner into an arena-allocated syntax tree.

mod parser;
mod precedence;
mod utilities;

pub use parser::Parser;
