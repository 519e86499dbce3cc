//! Flag types and node identifiers for the syntax tree.

use std::fmt;

// Token flags from the scanner.
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u16 {
        const NONE                  = 0;
        const PRECEDING_LINE_BREAK  = 1 << 0;
        const UNTERMINATED          = 1 << 1;
        const SCIENTIFIC            = 1 << 2;
        const HEX_SPECIFIER         = 1 << 3;
        const BINARY_SPECIFIER      = 1 << 4;
        const ESCAPED               = 1 << 5;
        const TRIPLE_QUOTED         = 1 << 6;
        const IS_INVALID            = 1 << 7;

        const NUMERIC_LITERAL_FLAGS = Self::SCIENTIFIC.bits()
            | Self::HEX_SPECIFIER.bits()
            | Self::BINARY_SPECIFIER.bits();
    }
}

bitflags::bitflags! {
    /// Modifiers on declarations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u8 {
        const NONE   = 0;
        const EXTERN = 1 << 0;
    }
}

/// Identifies one loaded source file within a compilation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SourceFileId(pub u32);

impl SourceFileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a syntax node, unique across every file of a compilation.
///
/// The checker keys its per-declaration caches by node id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId {
    pub file: SourceFileId,
    pub index: u32,
}

impl NodeId {
    pub const INVALID: NodeId = NodeId {
        file: SourceFileId(u32::MAX),
        index: u32::MAX,
    };

    pub fn new(file: SourceFileId, index: u32) -> Self {
        Self { file, index }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}:{})", self.file.0, self.index)
    }
}
