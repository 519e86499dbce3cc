//! Identifier interning.
//!
//! Symbol tables key their entries by interned names so lookups compare
//! `u32` handles instead of strings.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// Handle to an interned identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct InternedString(Spur);

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternedString({:?})", self.0)
    }
}

/// Interner owned by a single compilation.
///
/// Clones share the same table, which lets the binder and checker resolve
/// names produced by each other.
#[derive(Clone)]
pub struct StringInterner {
    rodeo: Arc<ThreadedRodeo>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern a string, returning the existing handle if already present.
    #[inline]
    pub fn intern(&self, s: &str) -> InternedString {
        InternedString(self.rodeo.get_or_intern(s))
    }

    /// Look up a name without interning it. Used by queries that must not
    /// grow the table (a name never seen cannot be bound anywhere).
    #[inline]
    pub fn get(&self, s: &str) -> Option<InternedString> {
        self.rodeo.get(s).map(InternedString)
    }

    #[inline]
    pub fn resolve(&self, key: InternedString) -> &str {
        self.rodeo.resolve(&key.0)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let interner = StringInterner::new();
        let a = interner.intern("Pet");
        let b = interner.intern("Pet");
        let c = interner.intern("Dog");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "Pet");
        assert_eq!(interner.resolve(c), "Dog");
    }

    #[test]
    fn test_get_does_not_intern() {
        let interner = StringInterner::new();
        assert!(interner.get("Widget").is_none());
        assert!(interner.is_empty());
        let a = interner.intern("Widget");
        assert_eq!(interner.get("Widget"), Some(a));
    }

    #[test]
    fn test_clones_share_table() {
        let interner = StringInterner::new();
        let clone = interner.clone();
        let a = interner.intern("shared");
        assert_eq!(clone.get("shared"), Some(a));
    }
}
