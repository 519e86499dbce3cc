//! Arena allocation for syntax trees.
//!
//! Every parsed source file of a compilation is allocated from one bump
//! arena, so the whole forest can borrow with a single lifetime and be
//! released at once when the compilation is dropped.

use bumpalo::Bump;

/// Owns the memory of all syntax trees produced during one compilation.
pub struct CompilerArena {
    bump: Bump,
}

impl CompilerArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Pre-size the arena, typically from the total length of loaded sources.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    /// The allocator handed to the parser.
    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Copy source text into the arena so tokens can borrow it.
    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for CompilerArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_str_outlives_source() {
        let arena = CompilerArena::new();
        let text = {
            let owned = String::from("model A {}");
            arena.alloc_str(&owned)
        };
        assert_eq!(text, "model A {}");
        assert!(arena.allocated_bytes() >= text.len());
    }
}
