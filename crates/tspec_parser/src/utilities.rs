//! Parser utility functions.

use tspec_ast::syntax_kind::SyntaxKind;

/// Check if a token kind can start a statement.
pub fn can_start_statement(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::ImportKeyword
            | SyntaxKind::UsingKeyword
            | SyntaxKind::NamespaceKeyword
            | SyntaxKind::ModelKeyword
            | SyntaxKind::ScalarKeyword
            | SyntaxKind::EnumKeyword
            | SyntaxKind::UnionKeyword
            | SyntaxKind::InterfaceKeyword
            | SyntaxKind::OpKeyword
            | SyntaxKind::AliasKeyword
            | SyntaxKind::ConstKeyword
            | SyntaxKind::ExternKeyword
            | SyntaxKind::DecKeyword
            | SyntaxKind::AtToken
            | SyntaxKind::AtAtToken
            | SyntaxKind::SemicolonToken
    )
}

/// Check if a token kind can start an expression.
pub fn can_start_expression(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::NumericLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::StringTemplateHead
            | SyntaxKind::OpenParenToken
            | SyntaxKind::OpenBracketToken
            | SyntaxKind::OpenBraceToken
            | SyntaxKind::HashBraceToken
            | SyntaxKind::HashBracketToken
            | SyntaxKind::BarToken
            | SyntaxKind::AmpersandToken
            | SyntaxKind::ValueOfKeyword
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NullKeyword
            | SyntaxKind::VoidKeyword
            | SyntaxKind::NeverKeyword
            | SyntaxKind::UnknownKeyword
    )
}

/// Whether a token can name a member (property, enum member, variant).
///
/// Keywords are allowed as member names: `model Foo { model: string }`.
pub fn is_member_name(kind: SyntaxKind) -> bool {
    kind == SyntaxKind::Identifier || kind == SyntaxKind::StringLiteral || kind.is_keyword()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_starters() {
        assert!(can_start_statement(SyntaxKind::ModelKeyword));
        assert!(can_start_statement(SyntaxKind::AtAtToken));
        assert!(!can_start_statement(SyntaxKind::Identifier));
        assert!(!can_start_statement(SyntaxKind::CloseBraceToken));
    }

    #[test]
    fn test_member_names_include_keywords() {
        assert!(is_member_name(SyntaxKind::ExtendsKeyword));
        assert!(is_member_name(SyntaxKind::StringLiteral));
        assert!(!is_member_name(SyntaxKind::NumericLiteral));
    }
}
