//! tspec_binder: Symbol table construction and name resolution.
//!
//! The binder walks the syntax trees of a compilation, creates a symbol for
//! every declaration, merges namespaces and resolves names visible from a
//! scope, including `using` imports and ambiguity between them.

mod binder;
mod scope;
mod symbol;

pub use binder::{Binder, GLOBAL_NAMESPACE, REFLECTION_NAMESPACE, STD_NAMESPACE};
pub use scope::{ResolutionResult, Scope};
pub use symbol::{Declaration, Symbol, SymbolFlags, SymbolId, SymbolTable};
