//! SyntaxKind enum - all token and node kinds of the language.

/// The kind of a token or syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum SyntaxKind {
    // ========================================================================
    // Tokens
    // ========================================================================
    Unknown = 0,
    EndOfFileToken,

    // Trivia
    SingleLineCommentTrivia,
    MultiLineCommentTrivia,
    NewLineTrivia,
    WhitespaceTrivia,

    // Literals
    NumericLiteral,
    StringLiteral,
    StringTemplateHead,
    StringTemplateMiddle,
    StringTemplateTail,

    Identifier,

    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    DotToken,
    DotDotDotToken,
    SemicolonToken,
    CommaToken,
    LessThanToken,
    GreaterThanToken,
    EqualsToken,
    AmpersandToken,
    BarToken,
    QuestionToken,
    ColonToken,
    ColonColonToken,
    AtToken,
    AtAtToken,
    HashBraceToken,
    HashBracketToken,

    // Keywords
    ImportKeyword,
    ModelKeyword,
    ScalarKeyword,
    NamespaceKeyword,
    UsingKeyword,
    OpKeyword,
    EnumKeyword,
    AliasKeyword,
    IsKeyword,
    InterfaceKeyword,
    UnionKeyword,
    ExternKeyword,
    DecKeyword,
    ConstKeyword,
    ExtendsKeyword,
    ValueOfKeyword,
    TrueKeyword,
    FalseKeyword,
    NullKeyword,
    VoidKeyword,
    NeverKeyword,
    UnknownKeyword,

    // ========================================================================
    // Nodes
    // ========================================================================
    SourceFile,

    // Statements
    ImportStatement,
    UsingStatement,
    NamespaceStatement,
    ModelStatement,
    ScalarStatement,
    EnumStatement,
    UnionStatement,
    InterfaceStatement,
    OperationStatement,
    AliasStatement,
    ConstStatement,
    DecoratorDeclarationStatement,
    AugmentDecoratorStatement,
    EmptyStatement,
    InvalidStatement,

    // Members
    ModelProperty,
    ModelSpreadProperty,
    EnumMember,
    EnumSpreadMember,
    UnionVariant,
    FunctionParameter,
    TemplateParameterDeclaration,
    TemplateArgument,
    DecoratorExpression,

    // Expressions
    TypeReference,
    MemberExpression,
    ArrayExpression,
    TupleExpression,
    UnionExpression,
    IntersectionExpression,
    ModelExpression,
    ValueOfExpression,
    StringTemplateExpression,
    StringTemplateSpan,
    BooleanLiteral,
    ObjectLiteral,
    ObjectLiteralProperty,
    ObjectLiteralSpreadProperty,
    ArrayLiteral,
    CallExpression,
    InvalidExpression,
}

impl SyntaxKind {
    /// Whether this kind is a reserved keyword.
    #[inline]
    pub fn is_keyword(self) -> bool {
        let v = self as u16;
        v >= SyntaxKind::ImportKeyword as u16 && v <= SyntaxKind::UnknownKeyword as u16
    }

    #[inline]
    pub fn is_punctuation(self) -> bool {
        let v = self as u16;
        v >= SyntaxKind::OpenBraceToken as u16 && v <= SyntaxKind::HashBracketToken as u16
    }

    /// Whether this kind is a piece of a string template.
    #[inline]
    pub fn is_template(self) -> bool {
        matches!(
            self,
            SyntaxKind::StringTemplateHead | SyntaxKind::StringTemplateMiddle | SyntaxKind::StringTemplateTail
        )
    }

    #[inline]
    pub fn is_trivia(self) -> bool {
        let v = self as u16;
        v >= SyntaxKind::SingleLineCommentTrivia as u16 && v <= SyntaxKind::WhitespaceTrivia as u16
    }

    /// Whether this keyword starts a declaration statement.
    pub fn is_declaration_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::ImportKeyword
                | SyntaxKind::ModelKeyword
                | SyntaxKind::ScalarKeyword
                | SyntaxKind::NamespaceKeyword
                | SyntaxKind::UsingKeyword
                | SyntaxKind::OpKeyword
                | SyntaxKind::EnumKeyword
                | SyntaxKind::AliasKeyword
                | SyntaxKind::InterfaceKeyword
                | SyntaxKind::UnionKeyword
                | SyntaxKind::ExternKeyword
                | SyntaxKind::DecKeyword
                | SyntaxKind::ConstKeyword
        )
    }

    /// Source text of a keyword or punctuation token, used in messages.
    pub fn text(self) -> Option<&'static str> {
        let text = match self {
            SyntaxKind::OpenBraceToken => "{",
            SyntaxKind::CloseBraceToken => "}",
            SyntaxKind::OpenParenToken => "(",
            SyntaxKind::CloseParenToken => ")",
            SyntaxKind::OpenBracketToken => "[",
            SyntaxKind::CloseBracketToken => "]",
            SyntaxKind::DotToken => ".",
            SyntaxKind::DotDotDotToken => "...",
            SyntaxKind::SemicolonToken => ";",
            SyntaxKind::CommaToken => ",",
            SyntaxKind::LessThanToken => "<",
            SyntaxKind::GreaterThanToken => ">",
            SyntaxKind::EqualsToken => "=",
            SyntaxKind::AmpersandToken => "&",
            SyntaxKind::BarToken => "|",
            SyntaxKind::QuestionToken => "?",
            SyntaxKind::ColonToken => ":",
            SyntaxKind::ColonColonToken => "::",
            SyntaxKind::AtToken => "@",
            SyntaxKind::AtAtToken => "@@",
            SyntaxKind::HashBraceToken => "#{",
            SyntaxKind::HashBracketToken => "#[",
            SyntaxKind::ImportKeyword => "import",
            SyntaxKind::ModelKeyword => "model",
            SyntaxKind::ScalarKeyword => "scalar",
            SyntaxKind::NamespaceKeyword => "namespace",
            SyntaxKind::UsingKeyword => "using",
            SyntaxKind::OpKeyword => "op",
            SyntaxKind::EnumKeyword => "enum",
            SyntaxKind::AliasKeyword => "alias",
            SyntaxKind::IsKeyword => "is",
            SyntaxKind::InterfaceKeyword => "interface",
            SyntaxKind::UnionKeyword => "union",
            SyntaxKind::ExternKeyword => "extern",
            SyntaxKind::DecKeyword => "dec",
            SyntaxKind::ConstKeyword => "const",
            SyntaxKind::ExtendsKeyword => "extends",
            SyntaxKind::ValueOfKeyword => "valueof",
            SyntaxKind::TrueKeyword => "true",
            SyntaxKind::FalseKeyword => "false",
            SyntaxKind::NullKeyword => "null",
            SyntaxKind::VoidKeyword => "void",
            SyntaxKind::NeverKeyword => "never",
            SyntaxKind::UnknownKeyword => "unknown",
            _ => return None,
        };
        Some(text)
    }

    /// Map an identifier spelling to its keyword kind.
    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        let kind = match text {
            "import" => SyntaxKind::ImportKeyword,
            "model" => SyntaxKind::ModelKeyword,
            "scalar" => SyntaxKind::ScalarKeyword,
            "namespace" => SyntaxKind::NamespaceKeyword,
            "using" => SyntaxKind::UsingKeyword,
            "op" => SyntaxKind::OpKeyword,
            "enum" => SyntaxKind::EnumKeyword,
            "alias" => SyntaxKind::AliasKeyword,
            "is" => SyntaxKind::IsKeyword,
            "interface" => SyntaxKind::InterfaceKeyword,
            "union" => SyntaxKind::UnionKeyword,
            "extern" => SyntaxKind::ExternKeyword,
            "dec" => SyntaxKind::DecKeyword,
            "const" => SyntaxKind::ConstKeyword,
            "extends" => SyntaxKind::ExtendsKeyword,
            "valueof" => SyntaxKind::ValueOfKeyword,
            "true" => SyntaxKind::TrueKeyword,
            "false" => SyntaxKind::FalseKeyword,
            "null" => SyntaxKind::NullKeyword,
            "void" => SyntaxKind::VoidKeyword,
            "never" => SyntaxKind::NeverKeyword,
            "unknown" => SyntaxKind::UnknownKeyword,
            _ => return None,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip() {
        for word in ["model", "scalar", "valueof", "unknown", "dec"] {
            let kind = SyntaxKind::from_keyword(word).unwrap();
            assert!(kind.is_keyword());
            assert_eq!(kind.text(), Some(word));
        }
        assert_eq!(SyntaxKind::from_keyword("Model"), None);
    }

    #[test]
    fn test_classification() {
        assert!(SyntaxKind::HashBraceToken.is_punctuation());
        assert!(!SyntaxKind::Identifier.is_punctuation());
        assert!(SyntaxKind::StringTemplateMiddle.is_template());
        assert!(SyntaxKind::WhitespaceTrivia.is_trivia());
        assert!(SyntaxKind::UsingKeyword.is_declaration_keyword());
        assert!(!SyntaxKind::ExtendsKeyword.is_declaration_keyword());
    }
}
