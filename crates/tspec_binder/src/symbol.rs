//! Symbol and symbol table definitions.

use tspec_ast::node::*;
use tspec_ast::types::{NodeId, SourceFileId};
use tspec_core::collections::OrderedMap;
use tspec_core::intern::InternedString;
use tspec_core::text::TextRange;

/// Identifies a symbol within one compilation's binder.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// What kind of entity a symbol names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SymbolFlags: u16 {
        const NONE               = 0;
        const NAMESPACE          = 1 << 0;
        const MODEL              = 1 << 1;
        const SCALAR             = 1 << 2;
        const ENUM               = 1 << 3;
        const UNION              = 1 << 4;
        const INTERFACE          = 1 << 5;
        const OPERATION          = 1 << 6;
        const ALIAS              = 1 << 7;
        const CONST              = 1 << 8;
        const DECORATOR          = 1 << 9;
        const TEMPLATE_PARAMETER = 1 << 10;
        /// Declared inside another declaration (interface operations).
        const MEMBER             = 1 << 11;
        /// Has a duplicate-symbol diagnostic already.
        const DUPLICATE          = 1 << 12;

        const TYPE = Self::MODEL.bits()
            | Self::SCALAR.bits()
            | Self::ENUM.bits()
            | Self::UNION.bits()
            | Self::INTERFACE.bits()
            | Self::OPERATION.bits()
            | Self::ALIAS.bits();
        const TEMPLATABLE = Self::MODEL.bits()
            | Self::SCALAR.bits()
            | Self::UNION.bits()
            | Self::INTERFACE.bits()
            | Self::OPERATION.bits()
            | Self::ALIAS.bits();
    }
}

/// The syntax that declares a symbol.
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Namespace(&'a NamespaceStatement<'a>),
    Model(&'a ModelStatement<'a>),
    Scalar(&'a ScalarStatement<'a>),
    Enum(&'a EnumStatement<'a>),
    Union(&'a UnionStatement<'a>),
    Interface(&'a InterfaceStatement<'a>),
    Operation(&'a OperationStatement<'a>),
    Alias(&'a AliasStatement<'a>),
    Const(&'a ConstStatement<'a>),
    Decorator(&'a DecoratorDeclarationStatement<'a>),
    TemplateParameter {
        node: &'a TemplateParameterDeclaration<'a>,
        index: u32,
    },
}

impl<'a> Declaration<'a> {
    pub fn node_id(&self) -> NodeId {
        self.data().id
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    fn data(&self) -> &NodeData {
        match self {
            Declaration::Namespace(n) => &n.data,
            Declaration::Model(n) => &n.data,
            Declaration::Scalar(n) => &n.data,
            Declaration::Enum(n) => &n.data,
            Declaration::Union(n) => &n.data,
            Declaration::Interface(n) => &n.data,
            Declaration::Operation(n) => &n.data,
            Declaration::Alias(n) => &n.data,
            Declaration::Const(n) => &n.data,
            Declaration::Decorator(n) => &n.data,
            Declaration::TemplateParameter { node, .. } => &node.data,
        }
    }

    /// Template parameters declared directly on this declaration.
    pub fn template_parameters(&self) -> &'a [&'a TemplateParameterDeclaration<'a>] {
        match self {
            Declaration::Model(n) => n.template_parameters,
            Declaration::Scalar(n) => n.template_parameters,
            Declaration::Union(n) => n.template_parameters,
            Declaration::Interface(n) => n.template_parameters,
            Declaration::Operation(n) => n.template_parameters,
            Declaration::Alias(n) => n.template_parameters,
            _ => &[],
        }
    }

    /// Name identifier, when the declaration has one of its own.
    pub fn identifier(&self) -> Option<&'a Identifier<'a>> {
        match self {
            Declaration::Namespace(n) => n.path.last().copied(),
            Declaration::Model(n) => Some(n.id),
            Declaration::Scalar(n) => Some(n.id),
            Declaration::Enum(n) => Some(n.id),
            Declaration::Union(n) => Some(n.id),
            Declaration::Interface(n) => Some(n.id),
            Declaration::Operation(n) => Some(n.id),
            Declaration::Alias(n) => Some(n.id),
            Declaration::Const(n) => Some(n.id),
            Declaration::Decorator(n) => Some(n.id),
            Declaration::TemplateParameter { node, .. } => Some(node.id),
        }
    }
}

/// A symbol represents a named declaration: a namespace, a type, a const,
/// a decorator or a template parameter.
#[derive(Debug)]
pub struct Symbol<'a> {
    /// Unique identifier for this symbol.
    pub id: SymbolId,
    /// The name of this symbol (interned).
    pub name: InternedString,
    /// The actual text name of this symbol.
    pub name_text: String,
    /// Symbol flags describing what kind of entity this is.
    pub flags: SymbolFlags,
    /// The declarations that contribute to this symbol. Only namespaces
    /// have more than one.
    pub declarations: Vec<Declaration<'a>>,
    /// File of the first declaration.
    pub file: Option<SourceFileId>,
    /// The enclosing namespace or declaration.
    pub parent: Option<SymbolId>,
    /// Declarations visible as `Namespace.name`.
    pub exports: SymbolTable,
    /// Template parameters, visible only inside the declaration.
    pub locals: SymbolTable,
    /// Interface operations.
    pub members: SymbolTable,
}

impl<'a> Symbol<'a> {
    pub fn new(id: SymbolId, name: InternedString, name_text: String, flags: SymbolFlags) -> Self {
        Self {
            id,
            name,
            name_text,
            flags,
            declarations: Vec::new(),
            file: None,
            parent: None,
            exports: SymbolTable::new(),
            locals: SymbolTable::new(),
            members: SymbolTable::new(),
        }
    }

    pub fn is_namespace(&self) -> bool {
        self.flags.contains(SymbolFlags::NAMESPACE)
    }

    /// The single declaration of a non-namespace symbol.
    pub fn declaration(&self) -> Option<Declaration<'a>> {
        self.declarations.first().copied()
    }
}

/// A symbol table maps names to symbols, in declaration order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    table: OrderedMap<InternedString, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            table: OrderedMap::new(),
        }
    }

    pub fn get(&self, name: &InternedString) -> Option<SymbolId> {
        self.table.get(name).copied()
    }

    pub fn set(&mut self, name: InternedString, symbol: SymbolId) {
        self.table.insert(name, symbol);
    }

    pub fn has(&self, name: &InternedString) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InternedString, &SymbolId)> {
        self.table.iter()
    }
}
