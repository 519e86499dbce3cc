//! Syntax node definitions.
//!
//! Nodes are allocated in the compilation arena and reference their children
//! through `&'a` borrows, so every enum below is `Copy` and can be stored in
//! symbol tables and checker caches without cloning subtrees.

use crate::syntax_kind::SyntaxKind;
use crate::types::*;
use tspec_core::intern::InternedString;
use tspec_core::text::TextRange;

// ============================================================================
// Core Node Wrapper
// ============================================================================

/// Common data shared by all syntax nodes.
#[derive(Debug, Clone, Copy)]
pub struct NodeData {
    pub kind: SyntaxKind,
    pub range: TextRange,
    pub id: NodeId,
}

impl NodeData {
    pub fn new(kind: SyntaxKind, id: NodeId, pos: u32, end: u32) -> Self {
        Self {
            kind,
            range: TextRange::new(pos, end),
            id,
        }
    }
}

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

// ============================================================================
// Source File
// ============================================================================

#[derive(Debug)]
pub struct SourceFile<'a> {
    pub data: NodeData,
    pub id: SourceFileId,
    pub file_name: &'a str,
    pub text: &'a str,
    pub statements: NodeList<'a, Statement<'a>>,
}

impl<'a> SourceFile<'a> {
    /// Paths named by `import` statements, in source order.
    pub fn imports(&self) -> impl Iterator<Item = &'a ImportStatement<'a>> + '_ {
        self.statements.iter().filter_map(|s| match s {
            Statement::Import(import) => Some(*import),
            _ => None,
        })
    }
}

// ============================================================================
// Identifier and names
// ============================================================================

#[derive(Debug)]
pub struct Identifier<'a> {
    pub data: NodeData,
    /// The interned text of this identifier.
    pub text: InternedString,
    /// The identifier's spelling.
    pub text_name: &'a str,
}

/// A possibly dotted name: `Foo` or `A.B.Foo`.
#[derive(Debug, Clone, Copy)]
pub enum NamePath<'a> {
    Identifier(&'a Identifier<'a>),
    Member(&'a MemberExpression<'a>),
}

#[derive(Debug)]
pub struct MemberExpression<'a> {
    pub data: NodeData,
    pub base: NamePath<'a>,
    pub member: &'a Identifier<'a>,
    /// `::` meta-member selector instead of `.`.
    pub meta: bool,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    Import(&'a ImportStatement<'a>),
    Using(&'a UsingStatement<'a>),
    Namespace(&'a NamespaceStatement<'a>),
    Model(&'a ModelStatement<'a>),
    Scalar(&'a ScalarStatement<'a>),
    Enum(&'a EnumStatement<'a>),
    Union(&'a UnionStatement<'a>),
    Interface(&'a InterfaceStatement<'a>),
    Operation(&'a OperationStatement<'a>),
    Alias(&'a AliasStatement<'a>),
    Const(&'a ConstStatement<'a>),
    DecoratorDeclaration(&'a DecoratorDeclarationStatement<'a>),
    AugmentDecorator(&'a AugmentDecoratorStatement<'a>),
    Empty(&'a NodeData),
    Invalid(&'a NodeData),
}

#[derive(Debug)]
pub struct ImportStatement<'a> {
    pub data: NodeData,
    pub path: &'a StringLiteral<'a>,
}

#[derive(Debug)]
pub struct UsingStatement<'a> {
    pub data: NodeData,
    pub name: NamePath<'a>,
}

/// `namespace A.B { ... }` or the blockless file-level `namespace A.B;`.
#[derive(Debug)]
pub struct NamespaceStatement<'a> {
    pub data: NodeData,
    /// Each segment of the dotted name, outermost first.
    pub path: NodeList<'a, &'a Identifier<'a>>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
    pub statements: NodeList<'a, Statement<'a>>,
    pub blockless: bool,
}

#[derive(Debug)]
pub struct TemplateParameterDeclaration<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub constraint: Option<Expression<'a>>,
    pub default: Option<Expression<'a>>,
}

#[derive(Debug)]
pub struct ModelStatement<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub template_parameters: NodeList<'a, &'a TemplateParameterDeclaration<'a>>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
    pub extends: Option<Expression<'a>>,
    pub is: Option<Expression<'a>>,
    pub properties: NodeList<'a, ModelMember<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub enum ModelMember<'a> {
    Property(&'a ModelProperty<'a>),
    Spread(&'a ModelSpreadProperty<'a>),
}

#[derive(Debug)]
pub struct ModelProperty<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub value: Expression<'a>,
    pub optional: bool,
    pub default: Option<Expression<'a>>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
}

#[derive(Debug)]
pub struct ModelSpreadProperty<'a> {
    pub data: NodeData,
    pub target: &'a TypeReference<'a>,
}

#[derive(Debug)]
pub struct ScalarStatement<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub template_parameters: NodeList<'a, &'a TemplateParameterDeclaration<'a>>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
    pub extends: Option<&'a TypeReference<'a>>,
}

#[derive(Debug)]
pub struct EnumStatement<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
    pub members: NodeList<'a, EnumMemberNode<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub enum EnumMemberNode<'a> {
    Member(&'a EnumMember<'a>),
    Spread(&'a EnumSpreadMember<'a>),
}

#[derive(Debug)]
pub struct EnumMember<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub value: Option<Expression<'a>>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
}

#[derive(Debug)]
pub struct EnumSpreadMember<'a> {
    pub data: NodeData,
    pub target: &'a TypeReference<'a>,
}

#[derive(Debug)]
pub struct UnionStatement<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub template_parameters: NodeList<'a, &'a TemplateParameterDeclaration<'a>>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
    pub variants: NodeList<'a, &'a UnionVariant<'a>>,
}

#[derive(Debug)]
pub struct UnionVariant<'a> {
    pub data: NodeData,
    /// Named variants use `name: Type`; unnamed variants are just `Type`.
    pub id: Option<&'a Identifier<'a>>,
    pub value: Expression<'a>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
}

#[derive(Debug)]
pub struct InterfaceStatement<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub template_parameters: NodeList<'a, &'a TemplateParameterDeclaration<'a>>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
    pub extends: NodeList<'a, &'a TypeReference<'a>>,
    pub operations: NodeList<'a, &'a OperationStatement<'a>>,
}

#[derive(Debug)]
pub struct OperationStatement<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub template_parameters: NodeList<'a, &'a TemplateParameterDeclaration<'a>>,
    pub decorators: NodeList<'a, &'a DecoratorExpression<'a>>,
    pub signature: OperationSignature<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum OperationSignature<'a> {
    /// `op foo(a: string): int32`
    Declaration {
        parameters: &'a ModelExpression<'a>,
        return_type: Expression<'a>,
    },
    /// `op foo is bar<string>`
    Reference(&'a TypeReference<'a>),
}

#[derive(Debug)]
pub struct AliasStatement<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub template_parameters: NodeList<'a, &'a TemplateParameterDeclaration<'a>>,
    pub value: Expression<'a>,
}

#[derive(Debug)]
pub struct ConstStatement<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub type_annotation: Option<Expression<'a>>,
    pub value: Expression<'a>,
}

/// `extern dec name(target: Type, arg: valueof string, ...rest: valueof string[]);`
#[derive(Debug)]
pub struct DecoratorDeclarationStatement<'a> {
    pub data: NodeData,
    pub modifiers: ModifierFlags,
    pub id: &'a Identifier<'a>,
    pub target: &'a FunctionParameter<'a>,
    pub parameters: NodeList<'a, &'a FunctionParameter<'a>>,
}

#[derive(Debug)]
pub struct FunctionParameter<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub type_annotation: Option<Expression<'a>>,
    pub optional: bool,
    pub rest: bool,
}

/// `@@doc(Target.member, "text");`
#[derive(Debug)]
pub struct AugmentDecoratorStatement<'a> {
    pub data: NodeData,
    pub decorator: NamePath<'a>,
    pub target: &'a TypeReference<'a>,
    pub arguments: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub struct DecoratorExpression<'a> {
    pub data: NodeData,
    pub target: NamePath<'a>,
    pub arguments: NodeList<'a, Expression<'a>>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Expression<'a> {
    Reference(&'a TypeReference<'a>),
    StringLiteral(&'a StringLiteral<'a>),
    NumericLiteral(&'a NumericLiteral<'a>),
    BooleanLiteral(&'a BooleanLiteral),
    StringTemplate(&'a StringTemplateExpression<'a>),
    Array(&'a ArrayExpression<'a>),
    Tuple(&'a TupleExpression<'a>),
    Union(&'a UnionExpression<'a>),
    Intersection(&'a IntersectionExpression<'a>),
    Model(&'a ModelExpression<'a>),
    ValueOf(&'a ValueOfExpression<'a>),
    ObjectLiteral(&'a ObjectLiteral<'a>),
    ArrayLiteral(&'a ArrayLiteral<'a>),
    Call(&'a CallExpression<'a>),
    Intrinsic(&'a IntrinsicExpression),
    Invalid(&'a NodeData),
}

#[derive(Debug)]
pub struct TypeReference<'a> {
    pub data: NodeData,
    pub name: NamePath<'a>,
    pub arguments: NodeList<'a, &'a TemplateArgument<'a>>,
}

#[derive(Debug)]
pub struct TemplateArgument<'a> {
    pub data: NodeData,
    /// Set for named arguments `Foo<T = string>`.
    pub name: Option<&'a Identifier<'a>>,
    pub argument: Expression<'a>,
}

#[derive(Debug)]
pub struct StringLiteral<'a> {
    pub data: NodeData,
    /// The unescaped value.
    pub value: &'a str,
}

#[derive(Debug)]
pub struct NumericLiteral<'a> {
    pub data: NodeData,
    /// Source spelling, kept so values are parsed exactly.
    pub text: &'a str,
}

#[derive(Debug)]
pub struct BooleanLiteral {
    pub data: NodeData,
    pub value: bool,
}

/// `"head ${expr} middle ${expr} tail"`
#[derive(Debug)]
pub struct StringTemplateExpression<'a> {
    pub data: NodeData,
    pub head: &'a str,
    pub spans: NodeList<'a, &'a StringTemplateSpan<'a>>,
}

#[derive(Debug)]
pub struct StringTemplateSpan<'a> {
    pub data: NodeData,
    pub expression: Expression<'a>,
    /// Literal text following the interpolation.
    pub literal: &'a str,
}

#[derive(Debug)]
pub struct ArrayExpression<'a> {
    pub data: NodeData,
    pub element: Expression<'a>,
}

#[derive(Debug)]
pub struct TupleExpression<'a> {
    pub data: NodeData,
    pub values: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub struct UnionExpression<'a> {
    pub data: NodeData,
    pub options: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub struct IntersectionExpression<'a> {
    pub data: NodeData,
    pub options: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub struct ModelExpression<'a> {
    pub data: NodeData,
    pub properties: NodeList<'a, ModelMember<'a>>,
}

#[derive(Debug)]
pub struct ValueOfExpression<'a> {
    pub data: NodeData,
    pub target: Expression<'a>,
}

/// `#{ name: "x", ...Other }`
#[derive(Debug)]
pub struct ObjectLiteral<'a> {
    pub data: NodeData,
    pub properties: NodeList<'a, ObjectLiteralMember<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub enum ObjectLiteralMember<'a> {
    Property(&'a ObjectLiteralProperty<'a>),
    Spread(&'a ObjectLiteralSpreadProperty<'a>),
}

#[derive(Debug)]
pub struct ObjectLiteralProperty<'a> {
    pub data: NodeData,
    pub id: &'a Identifier<'a>,
    pub value: Expression<'a>,
}

#[derive(Debug)]
pub struct ObjectLiteralSpreadProperty<'a> {
    pub data: NodeData,
    pub target: &'a TypeReference<'a>,
}

/// `#[1, 2, 3]`
#[derive(Debug)]
pub struct ArrayLiteral<'a> {
    pub data: NodeData,
    pub values: NodeList<'a, Expression<'a>>,
}

/// `int8(12)`
#[derive(Debug)]
pub struct CallExpression<'a> {
    pub data: NodeData,
    pub target: NamePath<'a>,
    pub arguments: NodeList<'a, Expression<'a>>,
}

/// `void`, `never`, `unknown`, `null`.
#[derive(Debug)]
pub struct IntrinsicExpression {
    pub data: NodeData,
    pub keyword: IntrinsicKeyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicKeyword {
    Void,
    Never,
    Unknown,
    Null,
}
