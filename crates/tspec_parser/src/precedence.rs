//! Operator precedence for type operators.

use tspec_ast::syntax_kind::SyntaxKind;

/// Precedence levels, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    Union = 1,
    Intersection = 2,
    /// Postfix `[]` and primary expressions.
    Array = 3,
    Invalid = 255,
}

impl OperatorPrecedence {
    /// The level operands of this operator are parsed at.
    pub fn next(self) -> OperatorPrecedence {
        match self {
            OperatorPrecedence::Union => OperatorPrecedence::Intersection,
            _ => OperatorPrecedence::Array,
        }
    }
}

/// Get the binary type operator precedence for a given token kind.
pub fn get_binary_operator_precedence(kind: SyntaxKind) -> OperatorPrecedence {
    match kind {
        SyntaxKind::BarToken => OperatorPrecedence::Union,
        SyntaxKind::AmpersandToken => OperatorPrecedence::Intersection,
        _ => OperatorPrecedence::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_binds_tighter_than_union() {
        let union = get_binary_operator_precedence(SyntaxKind::BarToken);
        let intersection = get_binary_operator_precedence(SyntaxKind::AmpersandToken);
        assert!(intersection > union);
        assert_eq!(union.next(), intersection);
        assert_eq!(intersection.next(), OperatorPrecedence::Array);
        assert_eq!(get_binary_operator_precedence(SyntaxKind::CommaToken), OperatorPrecedence::Invalid);
    }
}
