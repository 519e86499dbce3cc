//! Lookup scopes and resolution results.

use crate::symbol::SymbolId;
use tspec_ast::types::SourceFileId;

/// Where a name is looked up from: the innermost enclosing declaration (or
/// namespace) and the file the reference appears in. The file selects which
/// `using` statements are in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub file: SourceFileId,
    pub symbol: SymbolId,
}

impl Scope {
    pub fn new(file: SourceFileId, symbol: SymbolId) -> Self {
        Self { file, symbol }
    }

    /// The same file, nested in another declaration.
    pub fn with_symbol(self, symbol: SymbolId) -> Self {
        Self { file: self.file, symbol }
    }
}

/// Outcome of resolving a single identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    Resolved(SymbolId),
    /// Several `using`'d namespaces export the name.
    Ambiguous(Vec<SymbolId>),
    Unresolved,
}

impl ResolutionResult {
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            ResolutionResult::Resolved(id) => Some(*id),
            _ => None,
        }
    }
}
