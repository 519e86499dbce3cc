//! Type graph representation.
//!
//! Types and values live in a `TypeTable` and are referenced by `TypeId` /
//! `ValueId`. The checker mutates the table while it builds the graph; once
//! checking ends the table is frozen into a `TypeGraph` that only hands out
//! shared references.

use crate::decorators::DecoratorFn;
use crate::numeric::{Numeric, NumericKind};
use crate::state::StateMaps;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tspec_ast::types::{NodeId, SourceFileId};
use tspec_core::text::TextRange;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ValueId(pub u32);

impl ValueId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What an expression evaluates to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Entity {
    Type(TypeId),
    Value(ValueId),
    /// A literal whose role is decided by the position it is used in: a
    /// literal type where a type is expected, a value where a value is.
    Indeterminate(TypeId),
}

impl Entity {
    /// The type, for types and undecided literals.
    pub fn as_type(self) -> Option<TypeId> {
        match self {
            Entity::Type(id) | Entity::Indeterminate(id) => Some(id),
            Entity::Value(_) => None,
        }
    }

    pub fn as_value(self) -> Option<ValueId> {
        match self {
            Entity::Value(id) => Some(id),
            _ => None,
        }
    }
}

/// A file and span, kept on decorator applications so copied decorators
/// report at their original site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: SourceFileId,
    pub range: TextRange,
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct Type {
    pub id: TypeId,
    pub kind: TypeKind,
    /// Declaration or expression node this type was created from.
    pub node: Option<NodeId>,
    /// Applied decorators, in application order.
    pub decorators: Vec<DecoratorApplication>,
    /// Set on template instances and on every type created while checking one.
    pub template_mapper: Option<Arc<TemplateMapper>>,
    /// The generic declaration itself: template parameters left unmapped.
    pub template_declaration: bool,
    /// Created while checking a template declaration or a partial instance.
    pub in_template: bool,
    /// Construction (heritage, members and decorators) has completed.
    pub finished: bool,
}

impl Type {
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Namespace(t) => Some(&t.name),
            TypeKind::Model(t) => Some(&t.name),
            TypeKind::ModelProperty(t) => Some(&t.name),
            TypeKind::Scalar(t) => Some(&t.name),
            TypeKind::Enum(t) => Some(&t.name),
            TypeKind::EnumMember(t) => Some(&t.name),
            TypeKind::Union(t) => t.name.as_deref(),
            TypeKind::UnionVariant(t) => t.name.as_deref(),
            TypeKind::Interface(t) => Some(&t.name),
            TypeKind::Operation(t) => Some(&t.name),
            TypeKind::TemplateParameter(t) => Some(&t.name),
            TypeKind::Decorator(t) => Some(&t.name),
            _ => None,
        }
    }

    /// Enclosing namespace of a declared type.
    pub fn namespace(&self) -> Option<TypeId> {
        match &self.kind {
            TypeKind::Namespace(t) => t.namespace,
            TypeKind::Model(t) => t.namespace,
            TypeKind::Scalar(t) => t.namespace,
            TypeKind::Enum(t) => t.namespace,
            TypeKind::Union(t) => t.namespace,
            TypeKind::Interface(t) => t.namespace,
            TypeKind::Operation(t) => t.namespace,
            TypeKind::Decorator(t) => t.namespace,
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.kind_name()
    }
}

/// Keyword types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicName {
    Void,
    Never,
    Unknown,
    Null,
    /// Produced wherever resolution failed. Assignable both ways so one
    /// error does not cascade.
    ErrorType,
}

impl IntrinsicName {
    pub fn as_str(self) -> &'static str {
        match self {
            IntrinsicName::Void => "void",
            IntrinsicName::Never => "never",
            IntrinsicName::Unknown => "unknown",
            IntrinsicName::Null => "null",
            IntrinsicName::ErrorType => "ErrorType",
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Intrinsic(IntrinsicName),
    /// String literal type.
    String(String),
    /// Numeric literal type.
    Number(Numeric),
    /// Boolean literal type.
    Boolean(bool),
    StringTemplate(StringTemplateType),
    Namespace(NamespaceType),
    Model(ModelType),
    ModelProperty(ModelPropertyType),
    Scalar(ScalarType),
    Enum(EnumType),
    EnumMember(EnumMemberType),
    Union(UnionType),
    UnionVariant(UnionVariantType),
    Interface(InterfaceType),
    Operation(OperationType),
    Tuple(TupleType),
    TemplateParameter(TemplateParameterType),
    Decorator(DecoratorType),
}

impl TypeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeKind::Intrinsic(_) => "Intrinsic",
            TypeKind::String(_) => "String",
            TypeKind::Number(_) => "Number",
            TypeKind::Boolean(_) => "Boolean",
            TypeKind::StringTemplate(_) => "StringTemplate",
            TypeKind::Namespace(_) => "Namespace",
            TypeKind::Model(_) => "Model",
            TypeKind::ModelProperty(_) => "ModelProperty",
            TypeKind::Scalar(_) => "Scalar",
            TypeKind::Enum(_) => "Enum",
            TypeKind::EnumMember(_) => "EnumMember",
            TypeKind::Union(_) => "Union",
            TypeKind::UnionVariant(_) => "UnionVariant",
            TypeKind::Interface(_) => "Interface",
            TypeKind::Operation(_) => "Operation",
            TypeKind::Tuple(_) => "Tuple",
            TypeKind::TemplateParameter(_) => "TemplateParameter",
            TypeKind::Decorator(_) => "Decorator",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NamespaceType {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub namespaces: IndexMap<String, TypeId>,
    pub models: IndexMap<String, TypeId>,
    pub scalars: IndexMap<String, TypeId>,
    pub enums: IndexMap<String, TypeId>,
    pub unions: IndexMap<String, TypeId>,
    pub interfaces: IndexMap<String, TypeId>,
    pub operations: IndexMap<String, TypeId>,
    pub decorator_declarations: IndexMap<String, TypeId>,
}

/// How a model took properties from another model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceModelUsage {
    Extends,
    Is,
    Spread,
    Intersection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceModel {
    pub model: TypeId,
    pub usage: SourceModelUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelIndexer {
    pub key: TypeId,
    pub value: TypeId,
}

#[derive(Debug, Clone, Default)]
pub struct ModelType {
    /// Empty for model expressions and intersections.
    pub name: String,
    pub namespace: Option<TypeId>,
    pub properties: IndexMap<String, TypeId>,
    pub base_model: Option<TypeId>,
    pub derived_models: Vec<TypeId>,
    /// The model this one was declared `is`.
    pub source_model: Option<TypeId>,
    pub source_models: Vec<SourceModel>,
    pub indexer: Option<ModelIndexer>,
}

#[derive(Debug, Clone)]
pub struct ModelPropertyType {
    pub name: String,
    pub model: Option<TypeId>,
    pub type_id: TypeId,
    pub optional: bool,
    pub default_value: Option<ValueId>,
    /// The property this one was copied from by `is`, spread or intersection.
    pub source_property: Option<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ScalarType {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub base_scalar: Option<TypeId>,
    pub derived_scalars: Vec<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct EnumType {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub members: IndexMap<String, TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumMemberValue {
    String(String),
    Number(Numeric),
}

#[derive(Debug, Clone)]
pub struct EnumMemberType {
    pub name: String,
    pub enum_type: TypeId,
    pub value: Option<EnumMemberValue>,
    pub source_member: Option<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct UnionType {
    /// `None` for union expressions.
    pub name: Option<String>,
    pub namespace: Option<TypeId>,
    pub variants: Vec<TypeId>,
    pub expression: bool,
}

#[derive(Debug, Clone)]
pub struct UnionVariantType {
    pub name: Option<String>,
    pub union: Option<TypeId>,
    pub type_id: TypeId,
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceType {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub operations: IndexMap<String, TypeId>,
    pub source_interfaces: Vec<TypeId>,
}

#[derive(Debug, Clone)]
pub struct OperationType {
    pub name: String,
    pub namespace: Option<TypeId>,
    pub interface: Option<TypeId>,
    /// Anonymous model holding the parameters.
    pub parameters: TypeId,
    pub return_type: TypeId,
    pub source_operation: Option<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct TupleType {
    pub values: Vec<TypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringTemplateSpan {
    pub is_interpolated: bool,
    pub type_id: TypeId,
}

#[derive(Debug, Clone, Default)]
pub struct StringTemplateType {
    pub spans: Vec<StringTemplateSpan>,
    /// Set when every span is a literal.
    pub string_value: Option<String>,
}

/// Accepted entities for a template parameter or decorator parameter:
/// `T extends string` (type), `valueof string` (value), or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MixedConstraint {
    pub type_id: Option<TypeId>,
    pub value_type: Option<TypeId>,
}

impl MixedConstraint {
    pub fn accepts_values(&self) -> bool {
        self.value_type.is_some()
    }

    pub fn accepts_types(&self) -> bool {
        self.type_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct TemplateParameterType {
    pub name: String,
    pub constraint: Option<MixedConstraint>,
    pub default: Option<Entity>,
}

#[derive(Debug, Clone)]
pub struct DecoratorParameter {
    pub name: String,
    pub constraint: Option<MixedConstraint>,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Clone)]
pub struct DecoratorType {
    pub name: String,
    pub namespace: Option<TypeId>,
    /// `None` for decorators that only exist as implementations and accept
    /// any target and arguments.
    pub target: Option<DecoratorParameter>,
    pub parameters: Vec<DecoratorParameter>,
    pub implementation: Option<DecoratorFn>,
    /// Declared with `dec` in source.
    pub declared: bool,
}

impl std::fmt::Debug for DecoratorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoratorType")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("target", &self.target)
            .field("parameters", &self.parameters)
            .field("implementation", &self.implementation.is_some())
            .field("declared", &self.declared)
            .finish()
    }
}

/// One decorator applied to a type.
#[derive(Debug, Clone)]
pub struct DecoratorApplication {
    pub decorator: TypeId,
    pub arguments: Vec<Entity>,
    pub location: Option<SourceLocation>,
}

/// Template parameter to argument bindings of one instantiation. Nested
/// declarations (operations of a templated interface) see their parent's
/// bindings too.
#[derive(Debug, Clone, Default)]
pub struct TemplateMapper {
    /// Arguments in parameter order, parents' first.
    pub args: Vec<Entity>,
    map: FxHashMap<TypeId, Entity>,
    /// Some argument still refers to an unmapped template parameter.
    pub partial: bool,
}

impl TemplateMapper {
    pub fn new(parent: Option<&TemplateMapper>) -> Self {
        match parent {
            Some(parent) => parent.clone(),
            None => Self::default(),
        }
    }

    pub fn bind(&mut self, parameter: TypeId, argument: Entity) {
        self.args.push(argument);
        self.map.insert(parameter, argument);
    }

    pub fn get(&self, parameter: TypeId) -> Option<Entity> {
        self.map.get(&parameter).copied()
    }

    /// Arguments of the innermost declaration only.
    pub fn own_args(&self, count: usize) -> &[Entity] {
        &self.args[self.args.len().saturating_sub(count)..]
    }
}

// ============================================================================
// Values
// ============================================================================

#[derive(Debug, Clone)]
pub struct Value {
    pub id: ValueId,
    pub kind: ValueKind,
    /// Type the value was checked against, or its literal type.
    pub type_id: TypeId,
    /// Scalar the value was created for, e.g. `int8` in `int8(12)`.
    pub scalar: Option<TypeId>,
}

#[derive(Debug, Clone)]
pub enum ValueKind {
    String(String),
    Numeric(Numeric),
    Boolean(bool),
    Null,
    /// An enum member used as a value.
    EnumMember(TypeId),
    Array(Vec<ValueId>),
    Object(IndexMap<String, ValueId>),
}

impl ValueKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueKind::String(_) => "StringValue",
            ValueKind::Numeric(_) => "NumericValue",
            ValueKind::Boolean(_) => "BooleanValue",
            ValueKind::Null => "NullValue",
            ValueKind::EnumMember(_) => "EnumValue",
            ValueKind::Array(_) => "ArrayValue",
            ValueKind::Object(_) => "ObjectValue",
        }
    }
}

/// Interning key of scalar-like values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SimpleValue {
    String(String),
    Numeric(Numeric),
    Boolean(bool),
    Null,
    EnumMember(TypeId),
}

// ============================================================================
// Standard library knowledge
// ============================================================================

/// Literal kinds a standard scalar accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarBacking {
    String,
    Boolean,
    Numeric(NumericKind),
}

impl ScalarBacking {
    pub fn value_kind_name(self) -> &'static str {
        match self {
            ScalarBacking::String => "StringValue",
            ScalarBacking::Boolean => "BooleanValue",
            ScalarBacking::Numeric(_) => "NumericValue",
        }
    }
}

/// `TypeSpec.Reflection` marker models accept any type of their kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectionKind {
    Model,
    ModelProperty,
    Scalar,
    Enum,
    EnumMember,
    Union,
    UnionVariant,
    Interface,
    Operation,
    Namespace,
}

impl ReflectionKind {
    pub fn from_name(name: &str) -> Option<ReflectionKind> {
        let kind = match name {
            "Model" => ReflectionKind::Model,
            "ModelProperty" => ReflectionKind::ModelProperty,
            "Scalar" => ReflectionKind::Scalar,
            "Enum" => ReflectionKind::Enum,
            "EnumMember" => ReflectionKind::EnumMember,
            "Union" => ReflectionKind::Union,
            "UnionVariant" => ReflectionKind::UnionVariant,
            "Interface" => ReflectionKind::Interface,
            "Operation" => ReflectionKind::Operation,
            "Namespace" => ReflectionKind::Namespace,
            _ => return None,
        };
        Some(kind)
    }

    pub fn matches(self, kind: &TypeKind) -> bool {
        matches!(
            (self, kind),
            (ReflectionKind::Model, TypeKind::Model(_))
                | (ReflectionKind::ModelProperty, TypeKind::ModelProperty(_))
                | (ReflectionKind::Scalar, TypeKind::Scalar(_))
                | (ReflectionKind::Enum, TypeKind::Enum(_))
                | (ReflectionKind::EnumMember, TypeKind::EnumMember(_))
                | (ReflectionKind::Union, TypeKind::Union(_))
                | (ReflectionKind::UnionVariant, TypeKind::UnionVariant(_))
                | (ReflectionKind::Interface, TypeKind::Interface(_))
                | (ReflectionKind::Operation, TypeKind::Operation(_))
                | (ReflectionKind::Namespace, TypeKind::Namespace(_))
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct StdTypes {
    /// Standard types by name (`string`, `int32`, `Array`, ...).
    pub by_name: IndexMap<String, TypeId>,
    pub backings: FxHashMap<TypeId, ScalarBacking>,
    pub reflection: FxHashMap<TypeId, ReflectionKind>,
    pub array: Option<TypeId>,
    pub record: Option<TypeId>,
}

// ============================================================================
// Type table
// ============================================================================

/// The type table stores every type and value of one compilation.
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<Type>,
    values: Vec<Value>,
    string_literals: FxHashMap<String, TypeId>,
    number_literals: FxHashMap<Numeric, TypeId>,
    simple_values: FxHashMap<(SimpleValue, TypeId, Option<TypeId>), ValueId>,
    pub(crate) std: StdTypes,
    pub void_type: TypeId,
    pub never_type: TypeId,
    pub unknown_type: TypeId,
    pub null_type: TypeId,
    pub error_type: TypeId,
    pub true_type: TypeId,
    pub false_type: TypeId,
    pub global_namespace: TypeId,
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::with_capacity(1024),
            values: Vec::new(),
            string_literals: FxHashMap::default(),
            number_literals: FxHashMap::default(),
            simple_values: FxHashMap::default(),
            std: StdTypes::default(),
            void_type: TypeId(0),
            never_type: TypeId(1),
            unknown_type: TypeId(2),
            null_type: TypeId(3),
            error_type: TypeId(4),
            true_type: TypeId(5),
            false_type: TypeId(6),
            global_namespace: TypeId(7),
        };

        table.add_type(TypeKind::Intrinsic(IntrinsicName::Void));
        table.add_type(TypeKind::Intrinsic(IntrinsicName::Never));
        table.add_type(TypeKind::Intrinsic(IntrinsicName::Unknown));
        table.add_type(TypeKind::Intrinsic(IntrinsicName::Null));
        table.add_type(TypeKind::Intrinsic(IntrinsicName::ErrorType));
        table.add_type(TypeKind::Boolean(true));
        table.add_type(TypeKind::Boolean(false));
        table.add_type(TypeKind::Namespace(NamespaceType::default()));
        for id in 0..table.types.len() {
            table.types[id].finished = true;
        }
        table
    }

    /// Add a new type to the table and return its ID.
    pub(crate) fn add_type(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type {
            id,
            kind,
            node: None,
            decorators: Vec::new(),
            template_mapper: None,
            template_declaration: false,
            in_template: false,
            finished: false,
        });
        id
    }

    /// Get a type by its ID.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        self.types.iter()
    }

    pub fn intrinsic(&self, name: IntrinsicName) -> TypeId {
        match name {
            IntrinsicName::Void => self.void_type,
            IntrinsicName::Never => self.never_type,
            IntrinsicName::Unknown => self.unknown_type,
            IntrinsicName::Null => self.null_type,
            IntrinsicName::ErrorType => self.error_type,
        }
    }

    pub fn is_error(&self, id: TypeId) -> bool {
        id == self.error_type
    }

    pub(crate) fn string_literal(&mut self, value: &str) -> TypeId {
        if let Some(id) = self.string_literals.get(value) {
            return *id;
        }
        let id = self.add_type(TypeKind::String(value.to_string()));
        self.types[id.index()].finished = true;
        self.string_literals.insert(value.to_string(), id);
        id
    }

    pub(crate) fn number_literal(&mut self, value: Numeric) -> TypeId {
        if let Some(id) = self.number_literals.get(&value) {
            return *id;
        }
        let id = self.add_type(TypeKind::Number(value.clone()));
        self.types[id.index()].finished = true;
        self.number_literals.insert(value, id);
        id
    }

    pub(crate) fn boolean_literal(&self, value: bool) -> TypeId {
        if value {
            self.true_type
        } else {
            self.false_type
        }
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Create a value. Scalar-like values are interned so equal values get
    /// equal ids, which keeps template instance keys stable.
    pub(crate) fn add_value(&mut self, kind: ValueKind, type_id: TypeId, scalar: Option<TypeId>) -> ValueId {
        let simple = match &kind {
            ValueKind::String(s) => Some(SimpleValue::String(s.clone())),
            ValueKind::Numeric(n) => Some(SimpleValue::Numeric(n.clone())),
            ValueKind::Boolean(b) => Some(SimpleValue::Boolean(*b)),
            ValueKind::Null => Some(SimpleValue::Null),
            ValueKind::EnumMember(m) => Some(SimpleValue::EnumMember(*m)),
            ValueKind::Array(_) | ValueKind::Object(_) => None,
        };
        let key = simple.map(|s| (s, type_id, scalar));
        if let Some(existing) = key.as_ref().and_then(|k| self.simple_values.get(k)) {
            return *existing;
        }
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value {
            id,
            kind,
            type_id,
            scalar,
        });
        if let Some(key) = key {
            self.simple_values.insert(key, id);
        }
        id
    }

    // ------------------------------------------------------------------------
    // Kind accessors
    // ------------------------------------------------------------------------

    pub fn model(&self, id: TypeId) -> Option<&ModelType> {
        match &self.get(id).kind {
            TypeKind::Model(m) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn model_mut(&mut self, id: TypeId) -> Option<&mut ModelType> {
        match &mut self.get_mut(id).kind {
            TypeKind::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn property(&self, id: TypeId) -> Option<&ModelPropertyType> {
        match &self.get(id).kind {
            TypeKind::ModelProperty(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn property_mut(&mut self, id: TypeId) -> Option<&mut ModelPropertyType> {
        match &mut self.get_mut(id).kind {
            TypeKind::ModelProperty(p) => Some(p),
            _ => None,
        }
    }

    pub fn scalar(&self, id: TypeId) -> Option<&ScalarType> {
        match &self.get(id).kind {
            TypeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn scalar_mut(&mut self, id: TypeId) -> Option<&mut ScalarType> {
        match &mut self.get_mut(id).kind {
            TypeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn enum_type(&self, id: TypeId) -> Option<&EnumType> {
        match &self.get(id).kind {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn enum_mut(&mut self, id: TypeId) -> Option<&mut EnumType> {
        match &mut self.get_mut(id).kind {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn enum_member(&self, id: TypeId) -> Option<&EnumMemberType> {
        match &self.get(id).kind {
            TypeKind::EnumMember(m) => Some(m),
            _ => None,
        }
    }

    pub fn union(&self, id: TypeId) -> Option<&UnionType> {
        match &self.get(id).kind {
            TypeKind::Union(u) => Some(u),
            _ => None,
        }
    }

    pub(crate) fn union_mut(&mut self, id: TypeId) -> Option<&mut UnionType> {
        match &mut self.get_mut(id).kind {
            TypeKind::Union(u) => Some(u),
            _ => None,
        }
    }

    pub fn union_variant(&self, id: TypeId) -> Option<&UnionVariantType> {
        match &self.get(id).kind {
            TypeKind::UnionVariant(v) => Some(v),
            _ => None,
        }
    }

    pub fn interface(&self, id: TypeId) -> Option<&InterfaceType> {
        match &self.get(id).kind {
            TypeKind::Interface(i) => Some(i),
            _ => None,
        }
    }

    pub(crate) fn interface_mut(&mut self, id: TypeId) -> Option<&mut InterfaceType> {
        match &mut self.get_mut(id).kind {
            TypeKind::Interface(i) => Some(i),
            _ => None,
        }
    }

    pub fn operation(&self, id: TypeId) -> Option<&OperationType> {
        match &self.get(id).kind {
            TypeKind::Operation(o) => Some(o),
            _ => None,
        }
    }

    pub(crate) fn operation_mut(&mut self, id: TypeId) -> Option<&mut OperationType> {
        match &mut self.get_mut(id).kind {
            TypeKind::Operation(o) => Some(o),
            _ => None,
        }
    }

    pub fn namespace(&self, id: TypeId) -> Option<&NamespaceType> {
        match &self.get(id).kind {
            TypeKind::Namespace(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn namespace_mut(&mut self, id: TypeId) -> Option<&mut NamespaceType> {
        match &mut self.get_mut(id).kind {
            TypeKind::Namespace(n) => Some(n),
            _ => None,
        }
    }

    pub fn template_parameter(&self, id: TypeId) -> Option<&TemplateParameterType> {
        match &self.get(id).kind {
            TypeKind::TemplateParameter(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn template_parameter_mut(&mut self, id: TypeId) -> Option<&mut TemplateParameterType> {
        match &mut self.get_mut(id).kind {
            TypeKind::TemplateParameter(t) => Some(t),
            _ => None,
        }
    }

    pub fn decorator(&self, id: TypeId) -> Option<&DecoratorType> {
        match &self.get(id).kind {
            TypeKind::Decorator(d) => Some(d),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Model helpers
    // ------------------------------------------------------------------------

    /// Look up a property on a model or any of its base models.
    pub fn find_property(&self, model: TypeId, name: &str) -> Option<TypeId> {
        let mut current = Some(model);
        let mut steps = 0;
        while let Some(id) = current {
            let m = self.model(id)?;
            if let Some(prop) = m.properties.get(name) {
                return Some(*prop);
            }
            current = m.base_model;
            steps += 1;
            if steps > self.types.len() {
                break;
            }
        }
        None
    }

    /// Properties of a model followed by those inherited from its bases,
    /// nearest first; shadowed names are skipped.
    pub fn inherited_properties(&self, model: TypeId) -> Vec<TypeId> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut result = Vec::new();
        let mut current = Some(model);
        let mut steps = 0;
        while let Some(id) = current {
            let Some(m) = self.model(id) else {
                break;
            };
            for (name, prop) in &m.properties {
                if seen.insert(name.clone()) {
                    result.push(*prop);
                }
            }
            current = m.base_model;
            steps += 1;
            if steps > self.types.len() {
                break;
            }
        }
        result
    }

    /// The element type of an array model (`integer`-keyed indexer).
    pub fn array_element(&self, id: TypeId) -> Option<TypeId> {
        let indexer = self.model(id)?.indexer?;
        (Some(indexer.key) == self.std.by_name.get("integer").copied()).then_some(indexer.value)
    }

    /// The value type of a record model (`string`-keyed indexer).
    pub fn record_element(&self, id: TypeId) -> Option<TypeId> {
        let indexer = self.model(id)?.indexer?;
        (Some(indexer.key) == self.std.by_name.get("string").copied()).then_some(indexer.value)
    }

    /// Literal kinds accepted by a scalar, inherited from the nearest
    /// standard scalar in its base chain.
    pub fn scalar_backing(&self, id: TypeId) -> Option<ScalarBacking> {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(scalar) = current {
            if let Some(backing) = self.std.backings.get(&scalar) {
                return Some(*backing);
            }
            current = self.scalar(scalar)?.base_scalar;
            steps += 1;
            if steps > self.types.len() {
                break;
            }
        }
        None
    }

    pub fn reflection_kind(&self, id: TypeId) -> Option<ReflectionKind> {
        self.std.reflection.get(&id).copied()
    }

    pub fn std_type(&self, name: &str) -> Option<TypeId> {
        self.std.by_name.get(name).copied()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Frozen graph
// ============================================================================

/// The checked program: a read-only view of every type, value and decorator
/// state produced by one compilation.
#[derive(Debug)]
pub struct TypeGraph {
    table: TypeTable,
    state: StateMaps,
}

impl TypeGraph {
    pub(crate) fn new(table: TypeTable, state: StateMaps) -> Self {
        Self { table, state }
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    pub fn get(&self, id: TypeId) -> &Type {
        self.table.get(id)
    }

    pub fn value(&self, id: ValueId) -> &Value {
        self.table.value(id)
    }

    pub fn state(&self) -> &StateMaps {
        &self.state
    }

    pub fn global_namespace(&self) -> TypeId {
        self.table.global_namespace
    }

    /// A standard library type by name, e.g. `string`, `int32` or `Array`.
    pub fn get_std_type(&self, name: &str) -> Option<TypeId> {
        self.table.std_type(name)
    }

    pub fn is_type_assignable_to(&self, source: TypeId, target: TypeId) -> bool {
        crate::assignability::Relation::new().is_type_assignable(&self.table, source, target)
    }

    pub fn type_name(&self, id: TypeId) -> String {
        crate::names::type_name(&self.table, id)
    }

    /// Find a declared type by dotted name from the global namespace:
    /// `A.B.Foo`, `A.B.Foo.prop`, `E.member` or `I.op`.
    pub fn find(&self, path: &str) -> Option<TypeId> {
        let mut current = self.table.global_namespace;
        for part in path.split('.') {
            current = self.member(current, part)?;
        }
        Some(current)
    }

    fn member(&self, parent: TypeId, name: &str) -> Option<TypeId> {
        match &self.get(parent).kind {
            TypeKind::Namespace(ns) => [
                &ns.namespaces,
                &ns.models,
                &ns.scalars,
                &ns.enums,
                &ns.unions,
                &ns.interfaces,
                &ns.operations,
            ]
            .into_iter()
            .find_map(|map| map.get(name).copied()),
            TypeKind::Model(_) => self.table.find_property(parent, name),
            TypeKind::Enum(e) => e.members.get(name).copied(),
            TypeKind::Interface(i) => i.operations.get(name).copied(),
            TypeKind::Union(u) => u
                .variants
                .iter()
                .copied()
                .find(|v| self.table.union_variant(*v).and_then(|v| v.name.as_deref()) == Some(name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsics_preallocated() {
        let table = TypeTable::new();
        assert!(matches!(table.get(table.void_type).kind, TypeKind::Intrinsic(IntrinsicName::Void)));
        assert!(matches!(table.get(table.error_type).kind, TypeKind::Intrinsic(IntrinsicName::ErrorType)));
        assert!(table.namespace(table.global_namespace).is_some());
        assert_eq!(table.intrinsic(IntrinsicName::Null), table.null_type);
    }

    #[test]
    fn test_literals_are_interned() {
        let mut table = TypeTable::new();
        let a = table.string_literal("abc");
        let b = table.string_literal("abc");
        let c = table.string_literal("abd");
        assert_eq!(a, b);
        assert_ne!(a, c);
        let one = table.number_literal(Numeric::parse("1.0").unwrap());
        let one_again = table.number_literal(Numeric::parse("1").unwrap());
        assert_eq!(one, one_again);
        assert_eq!(table.boolean_literal(true), table.true_type);
    }

    #[test]
    fn test_simple_values_are_interned() {
        let mut table = TypeTable::new();
        let ty = table.string_literal("x");
        let a = table.add_value(ValueKind::String("x".into()), ty, None);
        let b = table.add_value(ValueKind::String("x".into()), ty, None);
        assert_eq!(a, b);
        let c = table.add_value(ValueKind::Array(vec![a]), table.unknown_type, None);
        let d = table.add_value(ValueKind::Array(vec![a]), table.unknown_type, None);
        assert_ne!(c, d);
    }

    #[test]
    fn test_inherited_properties_nearest_first() {
        let mut table = TypeTable::new();
        let base = table.add_type(TypeKind::Model(ModelType::default()));
        let derived = table.add_type(TypeKind::Model(ModelType::default()));
        let prop = |table: &mut TypeTable, model: TypeId, name: &str| {
            let id = table.add_type(TypeKind::ModelProperty(ModelPropertyType {
                name: name.to_string(),
                model: Some(model),
                type_id: table.unknown_type,
                optional: false,
                default_value: None,
                source_property: None,
            }));
            table.model_mut(model).unwrap().properties.insert(name.to_string(), id);
            id
        };
        let base_a = prop(&mut table, base, "a");
        let base_b = prop(&mut table, base, "b");
        let derived_a = prop(&mut table, derived, "a");
        table.model_mut(derived).unwrap().base_model = Some(base);

        assert_eq!(table.inherited_properties(derived), vec![derived_a, base_b]);
        assert_eq!(table.find_property(derived, "b"), Some(base_b));
        assert_ne!(table.find_property(derived, "a"), Some(base_a));
    }

    #[test]
    fn test_mapper_inherits_parent_bindings() {
        let mut parent = TemplateMapper::new(None);
        parent.bind(TypeId(100), Entity::Type(TypeId(1)));
        let mut child = TemplateMapper::new(Some(&parent));
        child.bind(TypeId(101), Entity::Type(TypeId(2)));
        assert_eq!(child.get(TypeId(100)), Some(Entity::Type(TypeId(1))));
        assert_eq!(child.own_args(1), &[Entity::Type(TypeId(2))]);
        assert_eq!(child.args.len(), 2);
    }

    #[test]
    fn test_reflection_kind_matching() {
        assert!(ReflectionKind::Model.matches(&TypeKind::Model(ModelType::default())));
        assert!(!ReflectionKind::Scalar.matches(&TypeKind::Model(ModelType::default())));
        assert_eq!(ReflectionKind::from_name("ModelProperty"), Some(ReflectionKind::ModelProperty));
    }
}
