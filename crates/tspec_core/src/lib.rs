//! tspec_core: Core utilities shared by every stage of the tspec compiler.
//!
//! Provides the syntax-tree arena, identifier interning, source locations,
//! and insertion-ordered collections.

pub mod arena;
pub mod collections;
pub mod intern;
pub mod text;

pub use arena::CompilerArena;
pub use collections::OrderedMap;
pub use intern::{InternedString, StringInterner};
pub use text::{LineMap, TextRange};
