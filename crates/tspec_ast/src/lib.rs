//! tspec_ast: Syntax tree definitions for the tspec language.
//!
//! Defines the node types produced by the parser, the SyntaxKind enum, and
//! the flag and identifier types shared by later stages.

pub mod generated;
pub mod node;
pub mod syntax_kind;
pub mod types;

pub use node::*;
pub use syntax_kind::SyntaxKind;
pub use types::*;
