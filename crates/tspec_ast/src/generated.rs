//! Accessor helpers over the node enums.

use crate::node::*;
use crate::syntax_kind::SyntaxKind;
use tspec_core::text::TextRange;

impl<'a> Statement<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Statement::Import(n) => &n.data,
            Statement::Using(n) => &n.data,
            Statement::Namespace(n) => &n.data,
            Statement::Model(n) => &n.data,
            Statement::Scalar(n) => &n.data,
            Statement::Enum(n) => &n.data,
            Statement::Union(n) => &n.data,
            Statement::Interface(n) => &n.data,
            Statement::Operation(n) => &n.data,
            Statement::Alias(n) => &n.data,
            Statement::Const(n) => &n.data,
            Statement::DecoratorDeclaration(n) => &n.data,
            Statement::AugmentDecorator(n) => &n.data,
            Statement::Empty(d) => d,
            Statement::Invalid(d) => d,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    /// The declared name, for statements that declare one.
    pub fn name(&self) -> Option<&'a Identifier<'a>> {
        match self {
            Statement::Model(n) => Some(n.id),
            Statement::Scalar(n) => Some(n.id),
            Statement::Enum(n) => Some(n.id),
            Statement::Union(n) => Some(n.id),
            Statement::Interface(n) => Some(n.id),
            Statement::Operation(n) => Some(n.id),
            Statement::Alias(n) => Some(n.id),
            Statement::Const(n) => Some(n.id),
            Statement::DecoratorDeclaration(n) => Some(n.id),
            _ => None,
        }
    }
}

impl<'a> Expression<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Expression::Reference(n) => &n.data,
            Expression::StringLiteral(n) => &n.data,
            Expression::NumericLiteral(n) => &n.data,
            Expression::BooleanLiteral(n) => &n.data,
            Expression::StringTemplate(n) => &n.data,
            Expression::Array(n) => &n.data,
            Expression::Tuple(n) => &n.data,
            Expression::Union(n) => &n.data,
            Expression::Intersection(n) => &n.data,
            Expression::Model(n) => &n.data,
            Expression::ValueOf(n) => &n.data,
            Expression::ObjectLiteral(n) => &n.data,
            Expression::ArrayLiteral(n) => &n.data,
            Expression::Call(n) => &n.data,
            Expression::Intrinsic(n) => &n.data,
            Expression::Invalid(d) => d,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }
}

impl<'a> NamePath<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            NamePath::Identifier(n) => &n.data,
            NamePath::Member(n) => &n.data,
        }
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    /// The rightmost identifier: `Foo` in `A.B.Foo`.
    pub fn last(&self) -> &'a Identifier<'a> {
        match self {
            NamePath::Identifier(id) => id,
            NamePath::Member(member) => member.member,
        }
    }

    /// The dotted spelling, e.g. `A.B.Foo`.
    pub fn to_text(&self) -> String {
        match self {
            NamePath::Identifier(id) => id.text_name.to_string(),
            NamePath::Member(member) => {
                let sep = if member.meta { "::" } else { "." };
                format!("{}{}{}", member.base.to_text(), sep, member.member.text_name)
            }
        }
    }
}

impl<'a> ModelMember<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            ModelMember::Property(n) => &n.data,
            ModelMember::Spread(n) => &n.data,
        }
    }
}

impl<'a> EnumMemberNode<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            EnumMemberNode::Member(n) => &n.data,
            EnumMemberNode::Spread(n) => &n.data,
        }
    }
}

impl<'a> ObjectLiteralMember<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            ObjectLiteralMember::Property(n) => &n.data,
            ObjectLiteralMember::Spread(n) => &n.data,
        }
    }
}
