//! The checker turns bound syntax into the type graph.
//!
//! Declarations are checked lazily: the driver walks every file in order,
//! and a reference to a declaration that has not been checked yet checks it
//! on the spot. A declaration registers its type before its heritage and
//! members are checked, so self references see the type under construction.
//! Cycles that would need a finished type are caught with [`Coloring`]s.

use crate::assignability::{Mismatch, Relation};
use crate::cycles::{Coloring, ResolutionPath, Step, Visit};
use crate::decorators::{DecoratorFn, ModuleRecord};
use crate::names::{entity_name, type_name};
use crate::numeric::{Numeric, NumericKind};
use crate::state::StateMaps;
use crate::stdlib;
use crate::types::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{debug, trace};
use tspec_ast::node::*;
use tspec_ast::types::{NodeId, SourceFileId};
use tspec_binder::{Binder, Declaration, ResolutionResult, Scope, SymbolFlags, SymbolId, GLOBAL_NAMESPACE};
use tspec_core::text::TextRange;
use tspec_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage, DiagnosticTarget};

/// Cache key of a template instance: the declaration and every argument,
/// those of enclosing templates first.
pub(crate) type InstanceKey = (SymbolId, Vec<Entity>);

/// Where an expression is being checked.
#[derive(Debug, Clone)]
pub(crate) struct CheckContext {
    pub scope: Scope,
    /// Bindings of the template instance being checked.
    pub mapper: Option<Arc<TemplateMapper>>,
    /// Checking a template declaration or a partial instance: decorators
    /// do not run and some validations are deferred to instances.
    pub in_template: bool,
    /// Namespace new types are created in.
    pub namespace: TypeId,
}

/// What a dotted name refers to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum NameTarget {
    Symbol(SymbolId),
    /// A member of a checked type (`Model.prop`, `Enum.member`, `op::returnType`).
    Entity(Entity),
}

pub struct Checker<'a> {
    pub(crate) binder: Binder<'a>,
    pub(crate) types: TypeTable,
    pub(crate) state: StateMaps,
    relation: Relation,
    diagnostics: DiagnosticCollection,
    /// (code, location, message) of every diagnostic reported so far.
    reported: FxHashSet<(&'static str, Option<(String, u32, u32)>, String)>,
    pub(crate) declared: FxHashMap<SymbolId, Entity>,
    pub(crate) instances: FxHashMap<InstanceKey, Entity>,
    namespaces: FxHashMap<SymbolId, TypeId>,
    pub(crate) template_parameters: FxHashMap<SymbolId, TypeId>,
    pub(crate) base_coloring: Coloring<TypeId>,
    pub(crate) property_coloring: Coloring<TypeId>,
    pub(crate) alias_coloring: Coloring<InstanceKey>,
    pub(crate) const_coloring: Coloring<SymbolId>,
    pub(crate) op_coloring: Coloring<TypeId>,
    /// Alias values and heritage clauses being resolved. A heritage step
    /// holds the declaring type and the location of its clause.
    pub(crate) resolution_path: ResolutionPath<InstanceKey, (TypeId, SourceFileId, TextRange)>,
    /// Declarations already reported as part of a base type cycle.
    pub(crate) circular_reported: FxHashSet<SymbolId>,
    /// Registered decorator implementations by full name (`TypeSpec.doc`).
    pub(crate) implementations: FxHashMap<String, DecoratorFn>,
    /// Types created for implementation-only decorators.
    pub(crate) implementation_decorators: FxHashMap<String, TypeId>,
}

impl<'a> Checker<'a> {
    /// Create a checker over a finished binder. Binder diagnostics are
    /// carried over, and the standard library implementations registered.
    pub fn new(mut binder: Binder<'a>) -> Self {
        let diagnostics = binder.take_diagnostics();
        let mut checker = Self {
            binder,
            types: TypeTable::new(),
            state: StateMaps::new(),
            relation: Relation::new(),
            diagnostics,
            reported: FxHashSet::default(),
            declared: FxHashMap::default(),
            instances: FxHashMap::default(),
            namespaces: FxHashMap::default(),
            template_parameters: FxHashMap::default(),
            base_coloring: Coloring::new(),
            property_coloring: Coloring::new(),
            alias_coloring: Coloring::new(),
            const_coloring: Coloring::new(),
            op_coloring: Coloring::new(),
            resolution_path: ResolutionPath::new(),
            circular_reported: FxHashSet::default(),
            implementations: FxHashMap::default(),
            implementation_decorators: FxHashMap::default(),
        };
        checker.register_module(&stdlib::std_module());
        checker
    }

    /// Make the decorator implementations of a library module available.
    /// Must be called before [`Checker::check_program`].
    pub fn register_module(&mut self, module: &ModuleRecord) {
        for (name, implementation) in module.qualified_decorators() {
            self.implementations.insert(name, implementation.clone());
        }
    }

    /// Check every bound file in order, then apply augment decorators.
    pub fn check_program(&mut self) {
        let files = self.binder.source_files();
        for file in &files {
            trace!(target: "tspec::checker", file = file.file_name, "checking file");
            let ctx = CheckContext {
                scope: Scope::new(file.id, GLOBAL_NAMESPACE),
                mapper: None,
                in_template: false,
                namespace: self.types.global_namespace,
            };
            for statement in file.statements.iter() {
                self.check_statement(&ctx, statement);
            }
        }
        self.apply_augments();
        debug!(
            target: "tspec::checker",
            files = files.len(),
            types = self.types.len(),
            diagnostics = self.diagnostics.len(),
            "checked program"
        );
    }

    /// Freeze the graph.
    pub fn finish(self) -> (TypeGraph, DiagnosticCollection) {
        (TypeGraph::new(self.types, self.state), self.diagnostics)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub(crate) fn report(&mut self, file: SourceFileId, range: TextRange, message: &DiagnosticMessage, args: &[&str]) {
        let diagnostic = match self.binder.file(file) {
            Some(source) => Diagnostic::with_target(DiagnosticTarget::new(source.file_name, range), message, args),
            None => Diagnostic::new(message, args),
        };
        self.add_diagnostic(diagnostic);
    }

    /// Add a diagnostic unless an identical one (same code, location and
    /// message) was already reported.
    pub(crate) fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        let location = diagnostic.target.as_ref().map(|t| (t.file.clone(), t.pos, t.end));
        let key = (diagnostic.code, location, diagnostic.message.clone());
        if self.reported.insert(key) {
            self.diagnostics.add(diagnostic);
        }
    }

    /// Report the mismatch found by a value check.
    pub(crate) fn report_mismatch(&mut self, file: SourceFileId, range: TextRange, mismatch: Mismatch) {
        match mismatch {
            Mismatch::Unassignable { source, target } => {
                self.report(file, range, &messages::UNASSIGNABLE, &[source.as_str(), target.as_str()]);
            }
            Mismatch::MissingProperty {
                property,
                source,
                target,
            } => {
                self.report(
                    file,
                    range,
                    &messages::MISSING_PROPERTY,
                    &[property.as_str(), source.as_str(), target.as_str()],
                );
            }
            Mismatch::UnexpectedProperty { property, target } => {
                self.report(
                    file,
                    range,
                    &messages::UNEXPECTED_PROPERTY,
                    &[property.as_str(), target.as_str()],
                );
            }
        }
    }

    pub(crate) fn is_assignable(&mut self, source: TypeId, target: TypeId) -> bool {
        // Types are still growing while the graph is built.
        self.relation.clear();
        self.relation.is_type_assignable(&self.types, source, target)
    }

    pub(crate) fn check_value_assignable(&mut self, value: ValueId, target: TypeId) -> Result<(), Mismatch> {
        self.relation.clear();
        self.relation.check_value(&self.types, value, target)
    }

    // ========================================================================
    // Statements and declarations
    // ========================================================================

    fn check_statement(&mut self, ctx: &CheckContext, statement: &Statement<'a>) {
        match *statement {
            Statement::Namespace(node) => {
                let Some(sym) = self.binder.symbol_of(node.data.id) else {
                    return;
                };
                let namespace = self.namespace_type(sym);
                for decorator in node.decorators.iter() {
                    self.apply_decorator(ctx, namespace, decorator.target, decorator.arguments, decorator.data.range);
                }
                let inner = CheckContext {
                    scope: ctx.scope.with_symbol(sym),
                    mapper: None,
                    in_template: false,
                    namespace,
                };
                for statement in node.statements.iter() {
                    self.check_statement(&inner, statement);
                }
            }
            Statement::Model(node) => self.check_declared_node(node.data.id),
            Statement::Scalar(node) => self.check_declared_node(node.data.id),
            Statement::Enum(node) => self.check_declared_node(node.data.id),
            Statement::Union(node) => self.check_declared_node(node.data.id),
            Statement::Interface(node) => self.check_declared_node(node.data.id),
            Statement::Operation(node) => self.check_declared_node(node.data.id),
            Statement::Alias(node) => self.check_declared_node(node.data.id),
            Statement::Const(node) => self.check_declared_node(node.data.id),
            Statement::DecoratorDeclaration(node) => self.check_declared_node(node.data.id),
            Statement::Import(_)
            | Statement::Using(_)
            | Statement::AugmentDecorator(_)
            | Statement::Empty(_)
            | Statement::Invalid(_) => {}
        }
    }

    fn check_declared_node(&mut self, node: NodeId) {
        if let Some(sym) = self.binder.symbol_of(node) {
            self.check_declaration(sym, None);
        }
    }

    /// The entity declared by `sym`, checking it on first use. With a
    /// mapper, the template instance for those bindings.
    pub(crate) fn check_declaration(&mut self, sym: SymbolId, mapper: Option<Arc<TemplateMapper>>) -> Entity {
        if let Some(entity) = self.cached(sym, &mapper) {
            return entity;
        }
        let Some(declaration) = self.binder.symbol(sym).declaration() else {
            return self.check_namespace_symbol(sym);
        };
        if self.binder.symbol(sym).flags.contains(SymbolFlags::MEMBER) && mapper.is_none() {
            return self.check_member_operation(sym);
        }
        if let Declaration::Alias(node) = declaration {
            return self.check_alias(sym, node, mapper);
        }
        self.resolution_path.push(Step::Nested);
        let entity = match declaration {
            Declaration::Namespace(_) => self.check_namespace_symbol(sym),
            Declaration::Model(node) => Entity::Type(self.check_model(sym, node, mapper)),
            Declaration::Scalar(node) => Entity::Type(self.check_scalar(sym, node, mapper)),
            Declaration::Enum(node) => Entity::Type(self.check_enum(sym, node)),
            Declaration::Union(node) => Entity::Type(self.check_union(sym, node, mapper)),
            Declaration::Interface(node) => Entity::Type(self.check_interface(sym, node, mapper)),
            Declaration::Operation(node) => {
                let interface = self.member_interface(sym, &mapper);
                Entity::Type(self.check_operation(sym, node, mapper, interface))
            }
            Declaration::Alias(_) => Entity::Type(self.types.error_type),
            Declaration::Const(node) => self.check_const(sym, node),
            Declaration::Decorator(node) => Entity::Type(self.check_decorator_declaration(sym, node)),
            Declaration::TemplateParameter { .. } => Entity::Type(self.template_parameter_type(sym)),
        };
        self.resolution_path.pop();
        entity
    }

    fn check_namespace_symbol(&mut self, sym: SymbolId) -> Entity {
        if self.binder.symbol(sym).is_namespace() {
            Entity::Type(self.namespace_type(sym))
        } else {
            Entity::Type(self.types.error_type)
        }
    }

    fn cached(&self, sym: SymbolId, mapper: &Option<Arc<TemplateMapper>>) -> Option<Entity> {
        match mapper {
            None => self.declared.get(&sym).copied(),
            Some(mapper) => self.instances.get(&(sym, mapper.args.clone())).copied(),
        }
    }

    /// Record the entity of a declaration before checking its body.
    pub(crate) fn register(&mut self, sym: SymbolId, mapper: &Option<Arc<TemplateMapper>>, entity: Entity) {
        match mapper {
            None => {
                self.declared.insert(sym, entity);
            }
            Some(mapper) => {
                self.instances.insert((sym, mapper.args.clone()), entity);
            }
        }
    }

    /// An interface operation referenced on its own: check the interface
    /// and pick the operation out of it.
    fn check_member_operation(&mut self, sym: SymbolId) -> Entity {
        let error = Entity::Type(self.types.error_type);
        let Some(parent) = self.binder.symbol(sym).parent else {
            return error;
        };
        let name = self.binder.symbol(sym).name_text.clone();
        let Some(interface) = self.check_declaration(parent, None).as_type() else {
            return error;
        };
        if let Some(entity) = self.declared.get(&sym) {
            return *entity;
        }
        match self.types.interface(interface).and_then(|i| i.operations.get(&name)) {
            Some(op) => Entity::Type(*op),
            None => error,
        }
    }

    /// The interface type an operation symbol belongs to, for the given
    /// bindings.
    fn member_interface(&mut self, sym: SymbolId, mapper: &Option<Arc<TemplateMapper>>) -> Option<TypeId> {
        let symbol = self.binder.symbol(sym);
        if !symbol.flags.contains(SymbolFlags::MEMBER) {
            return None;
        }
        let parent = symbol.parent?;
        let params = self.declaration_parameters(parent);
        if params.is_empty() {
            return self.check_declaration(parent, None).as_type();
        }
        let mapper = mapper.as_ref()?;
        let mut parent_mapper = TemplateMapper::new(None);
        for (param, arg) in params.iter().zip(mapper.args.iter()) {
            parent_mapper.bind(*param, *arg);
        }
        parent_mapper.partial = mapper.partial;
        self.check_declaration(parent, Some(Arc::new(parent_mapper))).as_type()
    }

    /// The namespace type of a namespace symbol, created on first use along
    /// with its parents.
    pub(crate) fn namespace_type(&mut self, sym: SymbolId) -> TypeId {
        if sym == GLOBAL_NAMESPACE {
            return self.types.global_namespace;
        }
        if let Some(id) = self.namespaces.get(&sym) {
            return *id;
        }
        let symbol = self.binder.symbol(sym);
        let name = symbol.name_text.clone();
        let parent = symbol.parent.unwrap_or(GLOBAL_NAMESPACE);
        let node = symbol.declaration().map(|d| d.node_id());
        let parent_type = self.namespace_type(parent);
        let id = self.types.add_type(TypeKind::Namespace(NamespaceType {
            name: name.clone(),
            namespace: Some(parent_type),
            ..NamespaceType::default()
        }));
        let ty = self.types.get_mut(id);
        ty.node = node;
        ty.finished = true;
        self.namespaces.insert(sym, id);
        if let Some(ns) = self.types.namespace_mut(parent_type) {
            ns.namespaces.entry(name).or_insert(id);
        }
        id
    }

    /// The namespace symbol enclosing a declaration.
    pub(crate) fn enclosing_namespace(&self, sym: SymbolId) -> SymbolId {
        let mut current = self.binder.symbol(sym).parent;
        while let Some(id) = current {
            if self.binder.symbol(id).is_namespace() {
                return id;
            }
            current = self.binder.symbol(id).parent;
        }
        GLOBAL_NAMESPACE
    }

    /// Template parameter types declared directly on a declaration.
    pub(crate) fn declaration_parameters(&mut self, sym: SymbolId) -> Vec<TypeId> {
        let Some(declaration) = self.binder.symbol(sym).declaration() else {
            return Vec::new();
        };
        declaration
            .template_parameters()
            .iter()
            .map(|param| match self.binder.symbol_of(param.data.id) {
                Some(param_sym) => self.template_parameter_type(param_sym),
                None => self.types.error_type,
            })
            .collect()
    }

    /// Context for checking the body of a declaration.
    pub(crate) fn declaration_context(&mut self, sym: SymbolId, mapper: Option<Arc<TemplateMapper>>) -> CheckContext {
        let file = self.binder.symbol(sym).file.unwrap_or(SourceFileId(0));
        let namespace_sym = self.enclosing_namespace(sym);
        let namespace = self.namespace_type(namespace_sym);

        let mut in_template = mapper.as_ref().is_some_and(|m| m.partial);
        let mut owner = Some(sym);
        while let Some(current) = owner {
            if self.binder.symbol(current).is_namespace() {
                break;
            }
            for param in self.declaration_parameters(current) {
                if mapper.as_ref().and_then(|m| m.get(param)).is_none() {
                    in_template = true;
                }
            }
            owner = self.binder.symbol(current).parent;
        }

        CheckContext {
            scope: Scope::new(file, sym),
            mapper,
            in_template,
            namespace,
        }
    }

    /// Whether the declaration's own template parameters are left unmapped.
    pub(crate) fn is_declaration_template(&mut self, sym: SymbolId, mapper: &Option<Arc<TemplateMapper>>) -> bool {
        let params = self.declaration_parameters(sym);
        !params.is_empty() && params.iter().any(|p| mapper.as_ref().and_then(|m| m.get(*p)).is_none())
    }

    /// Set the bookkeeping fields shared by all declared types.
    pub(crate) fn init_declared_type(&mut self, id: TypeId, sym: SymbolId, node: NodeId, ctx: &CheckContext) {
        let template_declaration = self.is_declaration_template(sym, &ctx.mapper);
        let ty = self.types.get_mut(id);
        ty.node = Some(node);
        ty.template_mapper = ctx.mapper.clone();
        ty.template_declaration = template_declaration;
        ty.in_template = ctx.in_template;
    }

    /// Set the bookkeeping fields of a type created inside a declaration.
    pub(crate) fn init_member_type(&mut self, id: TypeId, node: Option<NodeId>, ctx: &CheckContext) {
        let ty = self.types.get_mut(id);
        ty.node = node;
        ty.template_mapper = ctx.mapper.clone();
        ty.in_template = ctx.in_template;
    }

    /// Whether a symbol is declared directly in the standard library
    /// namespace, or in `TypeSpec.Reflection` when `reflection` is set.
    pub(crate) fn is_std_symbol(&self, sym: SymbolId, reflection: bool) -> bool {
        let parent = self.binder.symbol(sym).parent;
        let namespace = if reflection {
            self.binder.reflection_namespace()
        } else {
            self.binder.std_namespace()
        };
        parent.is_some() && parent == namespace
    }

    /// Record a standard library scalar or model by name.
    pub(crate) fn register_std_type(&mut self, sym: SymbolId, name: &str, id: TypeId) {
        if self.is_std_symbol(sym, true) {
            if let Some(kind) = ReflectionKind::from_name(name) {
                self.types.std.reflection.insert(id, kind);
            }
            return;
        }
        if !self.is_std_symbol(sym, false) || self.types.get(id).template_mapper.is_some() {
            return;
        }
        self.types.std.by_name.insert(name.to_string(), id);
        match &self.types.get(id).kind {
            TypeKind::Scalar(_) => {
                let backing = match name {
                    "string" => Some(ScalarBacking::String),
                    "boolean" => Some(ScalarBacking::Boolean),
                    _ => NumericKind::from_name(name).map(ScalarBacking::Numeric),
                };
                if let Some(backing) = backing {
                    self.types.std.backings.insert(id, backing);
                }
            }
            TypeKind::Model(_) if name == "Array" => self.types.std.array = Some(id),
            TypeKind::Model(_) if name == "Record" => self.types.std.record = Some(id),
            _ => {}
        }
    }

    /// A standard library declaration by name.
    pub(crate) fn std_symbol(&self, name: &str) -> Option<SymbolId> {
        let std = self.binder.std_namespace()?;
        let key = self.binder.interner().get(name)?;
        self.binder.lookup_export(std, key)
    }

    /// Make a declared type visible in its namespace's member maps.
    pub(crate) fn register_in_namespace(&mut self, namespace: TypeId, id: TypeId) {
        let ty = self.types.get(id);
        let Some(name) = ty.name().map(str::to_string) else {
            return;
        };
        let kind = ty.kind_name();
        let Some(ns) = self.types.namespace_mut(namespace) else {
            return;
        };
        let map = match kind {
            "Model" => &mut ns.models,
            "Scalar" => &mut ns.scalars,
            "Enum" => &mut ns.enums,
            "Union" => &mut ns.unions,
            "Interface" => &mut ns.interfaces,
            "Operation" => &mut ns.operations,
            _ => return,
        };
        map.entry(name).or_insert(id);
    }

    // ========================================================================
    // Alias
    // ========================================================================

    fn check_alias(&mut self, sym: SymbolId, node: &'a AliasStatement<'a>, mapper: Option<Arc<TemplateMapper>>) -> Entity {
        let key: InstanceKey = (sym, mapper.as_ref().map(|m| m.args.clone()).unwrap_or_default());
        let file = self.binder.symbol(sym).file.unwrap_or(SourceFileId(0));
        if self.alias_coloring.enter(key.clone()) == Visit::Cycle {
            if let Some(&(owner, owner_file, range)) = self.resolution_path.heritage_cycle(&key) {
                self.report_circular_base(owner_file, owner, range);
            } else {
                debug!(target: "tspec::checker", alias = node.id.text_name, "circular alias");
                self.report(file, node.id.data.range, &messages::CIRCULAR_ALIAS, &[node.id.text_name]);
            }
            return Entity::Type(self.types.error_type);
        }
        let ctx = self.declaration_context(sym, mapper.clone());
        self.resolution_path.push(Step::Alias(key.clone()));
        let entity = self.check_expression(&ctx, node.value);
        self.resolution_path.pop();
        self.alias_coloring.leave(key);
        self.register(sym, &mapper, entity);
        entity
    }

    // ========================================================================
    // Name resolution
    // ========================================================================

    /// Resolve a dotted name. Reports and returns `None` when some segment
    /// does not resolve.
    pub(crate) fn resolve_name(&mut self, ctx: &CheckContext, path: NamePath<'a>) -> Option<NameTarget> {
        match path {
            NamePath::Identifier(id) => self.resolve_identifier(ctx, id).map(NameTarget::Symbol),
            NamePath::Member(member) => {
                let base = self.resolve_name(ctx, member.base)?;
                self.resolve_member(ctx, base, member)
            }
        }
    }

    fn resolve_identifier(&mut self, ctx: &CheckContext, id: &'a Identifier<'a>) -> Option<SymbolId> {
        match self.binder.resolve(ctx.scope, id.text) {
            ResolutionResult::Resolved(sym) => Some(sym),
            ResolutionResult::Ambiguous(candidates) => {
                let names: Vec<String> = candidates.iter().map(|c| self.binder.full_name(*c)).collect();
                let joined = names.join(", ");
                self.report(
                    ctx.scope.file,
                    id.data.range,
                    &messages::AMBIGUOUS_SYMBOL,
                    &[id.text_name, joined.as_str(), joined.as_str()],
                );
                None
            }
            ResolutionResult::Unresolved => {
                self.report(ctx.scope.file, id.data.range, &messages::INVALID_REF, &[id.text_name]);
                None
            }
        }
    }

    fn resolve_member(
        &mut self,
        ctx: &CheckContext,
        base: NameTarget,
        member: &'a MemberExpression<'a>,
    ) -> Option<NameTarget> {
        let name = member.member.text_name;
        let base_entity = match base {
            NameTarget::Symbol(sym) if self.binder.symbol(sym).is_namespace() && !member.meta => {
                return match self.binder.lookup_export(sym, member.member.text) {
                    Some(found) => Some(NameTarget::Symbol(found)),
                    None => {
                        let base_name = self.binder.full_name(sym);
                        self.report(
                            ctx.scope.file,
                            member.member.data.range,
                            &messages::INVALID_REF_MEMBER,
                            &[base_name.as_str(), name],
                        );
                        None
                    }
                };
            }
            NameTarget::Symbol(sym) => self.symbol_entity(ctx, sym),
            NameTarget::Entity(entity) => entity,
        };

        let Some(base_type) = base_entity.as_type() else {
            let base_name = entity_name(&self.types, base_entity);
            self.report(
                ctx.scope.file,
                member.member.data.range,
                &messages::INVALID_REF_MEMBER,
                &[base_name.as_str(), name],
            );
            return None;
        };
        let error = Some(NameTarget::Entity(Entity::Type(self.types.error_type)));
        if self.types.is_error(base_type) || self.types.template_parameter(base_type).is_some() {
            return error;
        }

        let found = if member.meta {
            self.meta_member(base_type, name)
        } else {
            self.type_member(base_type, name)
        };
        match found {
            Some(found) if self.property_coloring.is_in_progress(&found) => {
                debug!(target: "tspec::checker", property = name, "circular property");
                self.report(ctx.scope.file, member.member.data.range, &messages::CIRCULAR_PROP, &[name]);
                error
            }
            Some(found) => Some(NameTarget::Entity(Entity::Type(found))),
            None => {
                let base_name = type_name(&self.types, base_type);
                self.report(
                    ctx.scope.file,
                    member.member.data.range,
                    &messages::INVALID_REF_MEMBER,
                    &[base_name.as_str(), name],
                );
                None
            }
        }
    }

    /// The entity of a symbol used as the base of a member access. Template
    /// declarations are used as is, without arguments.
    fn symbol_entity(&mut self, ctx: &CheckContext, sym: SymbolId) -> Entity {
        let flags = self.binder.symbol(sym).flags;
        if flags.contains(SymbolFlags::TEMPLATE_PARAMETER) {
            return self.template_parameter_entity(ctx, sym);
        }
        self.check_declaration(sym, None)
    }

    fn type_member(&self, base: TypeId, name: &str) -> Option<TypeId> {
        match &self.types.get(base).kind {
            TypeKind::Model(_) => self.types.find_property(base, name),
            TypeKind::Enum(e) => e.members.get(name).copied(),
            TypeKind::Union(u) => u
                .variants
                .iter()
                .copied()
                .find(|v| self.types.union_variant(*v).and_then(|v| v.name.as_deref()) == Some(name)),
            TypeKind::Interface(i) => i.operations.get(name).copied(),
            TypeKind::Namespace(ns) => [&ns.namespaces, &ns.models, &ns.scalars, &ns.enums, &ns.unions, &ns.interfaces, &ns.operations]
                .into_iter()
                .find_map(|map| map.get(name).copied()),
            _ => None,
        }
    }

    /// `op::parameters`, `op::returnType` and `prop::type`.
    fn meta_member(&self, base: TypeId, name: &str) -> Option<TypeId> {
        match (&self.types.get(base).kind, name) {
            (TypeKind::Operation(op), "parameters") => Some(op.parameters),
            (TypeKind::Operation(op), "returnType") => Some(op.return_type),
            (TypeKind::ModelProperty(prop), "type") => Some(prop.type_id),
            _ => None,
        }
    }

    // ========================================================================
    // References
    // ========================================================================

    pub(crate) fn check_type_reference(&mut self, ctx: &CheckContext, node: &'a TypeReference<'a>) -> Entity {
        let Some(target) = self.resolve_name(ctx, node.name) else {
            return Entity::Type(self.types.error_type);
        };
        match target {
            NameTarget::Symbol(sym) => self.check_symbol(ctx, sym, node.arguments, node.data.range),
            NameTarget::Entity(entity) if node.arguments.is_empty() => entity,
            NameTarget::Entity(entity) => self.instantiate_member(ctx, entity, node),
        }
    }

    /// The entity a reference to `sym` with the given template arguments
    /// denotes.
    pub(crate) fn check_symbol(
        &mut self,
        ctx: &CheckContext,
        sym: SymbolId,
        args: &'a [&'a TemplateArgument<'a>],
        range: TextRange,
    ) -> Entity {
        let flags = self.binder.symbol(sym).flags;
        let templated = flags.intersects(SymbolFlags::TEMPLATABLE) && !self.declaration_parameters(sym).is_empty();
        if !templated {
            if !args.is_empty() {
                self.report(ctx.scope.file, range, &messages::NOT_A_TEMPLATE, &[]);
            }
            if flags.contains(SymbolFlags::TEMPLATE_PARAMETER) {
                return self.template_parameter_entity(ctx, sym);
            }
            if flags.contains(SymbolFlags::DECORATOR) {
                let name = self.binder.symbol(sym).name_text.clone();
                self.report(ctx.scope.file, range, &messages::INVALID_REF, &[name.as_str()]);
                return Entity::Type(self.types.error_type);
            }
            return self.check_declaration(sym, None);
        }
        self.instantiate(ctx, sym, args, range, None)
    }

    /// Template arguments on a member reference, e.g. `I<string>.op<int32>`.
    fn instantiate_member(&mut self, ctx: &CheckContext, entity: Entity, node: &'a TypeReference<'a>) -> Entity {
        let declaration = entity
            .as_type()
            .filter(|t| self.types.get(*t).template_declaration)
            .and_then(|t| {
                let ty = self.types.get(t);
                let sym = ty.node.and_then(|n| self.binder.symbol_of(n))?;
                Some((sym, ty.template_mapper.clone()))
            });
        match declaration {
            Some((sym, parent)) => self.instantiate(ctx, sym, node.arguments, node.data.range, parent),
            None => {
                self.report(ctx.scope.file, node.data.range, &messages::NOT_A_TEMPLATE, &[]);
                Entity::Type(self.types.error_type)
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub(crate) fn check_expression(&mut self, ctx: &CheckContext, expr: Expression<'a>) -> Entity {
        match expr {
            Expression::Reference(node) => self.check_type_reference(ctx, node),
            Expression::StringLiteral(node) => Entity::Indeterminate(self.types.string_literal(node.value)),
            Expression::NumericLiteral(node) => match Numeric::parse(node.text) {
                Some(value) => Entity::Indeterminate(self.types.number_literal(value)),
                None => Entity::Type(self.types.error_type),
            },
            Expression::BooleanLiteral(node) => Entity::Indeterminate(self.types.boolean_literal(node.value)),
            Expression::StringTemplate(node) => self.check_string_template(ctx, node),
            Expression::Array(node) => Entity::Type(self.check_array_expression(ctx, node)),
            Expression::Tuple(node) => Entity::Type(self.check_tuple(ctx, node)),
            Expression::Union(node) => Entity::Type(self.check_union_expression(ctx, node)),
            Expression::Intersection(node) => Entity::Type(self.check_intersection(ctx, node)),
            Expression::Model(node) => Entity::Type(self.check_model_expression(ctx, node)),
            Expression::ValueOf(node) => Entity::Type(self.check_type_expression(ctx, node.target)),
            Expression::ObjectLiteral(_) | Expression::ArrayLiteral(_) | Expression::Call(_) => {
                match self.check_value_expression(ctx, expr, None) {
                    Some(value) => Entity::Value(value),
                    None => Entity::Type(self.types.error_type),
                }
            }
            Expression::Intrinsic(node) => {
                let name = match node.keyword {
                    IntrinsicKeyword::Void => IntrinsicName::Void,
                    IntrinsicKeyword::Never => IntrinsicName::Never,
                    IntrinsicKeyword::Unknown => IntrinsicName::Unknown,
                    IntrinsicKeyword::Null => IntrinsicName::Null,
                };
                Entity::Type(self.types.intrinsic(name))
            }
            Expression::Invalid(_) => Entity::Type(self.types.error_type),
        }
    }

    /// Check an expression in a position that requires a type.
    pub(crate) fn check_type_expression(&mut self, ctx: &CheckContext, expr: Expression<'a>) -> TypeId {
        match self.check_expression(ctx, expr) {
            Entity::Type(id) | Entity::Indeterminate(id) => id,
            Entity::Value(_) => {
                self.report(ctx.scope.file, expr.range(), &messages::VALUE_IN_TYPE, &[]);
                self.types.error_type
            }
        }
    }

    /// `T[]` is `Array<T>`.
    fn check_array_expression(&mut self, ctx: &CheckContext, node: &'a ArrayExpression<'a>) -> TypeId {
        let element = self.check_type_expression(ctx, node.element);
        let Some(array) = self.std_symbol("Array") else {
            return self.types.error_type;
        };
        let params = self.declaration_parameters(array);
        let mut mapper = TemplateMapper::new(None);
        if let Some(param) = params.first() {
            if self.entity_in_template(Entity::Type(element)) {
                mapper.partial = true;
            }
            mapper.bind(*param, Entity::Type(element));
        }
        self.instantiate_mapper(array, mapper).as_type().unwrap_or(self.types.error_type)
    }

    fn check_tuple(&mut self, ctx: &CheckContext, node: &'a TupleExpression<'a>) -> TypeId {
        let values: Vec<TypeId> = node.values.iter().map(|v| self.check_type_expression(ctx, *v)).collect();
        let id = self.types.add_type(TypeKind::Tuple(TupleType { values }));
        self.init_member_type(id, Some(node.data.id), ctx);
        self.types.get_mut(id).finished = true;
        id
    }

    // ========================================================================
    // Augment decorators
    // ========================================================================

    fn apply_augments(&mut self) {
        let augments: Vec<_> = self.binder.augments().to_vec();
        for (scope, node) in augments {
            let namespace_sym = if self.binder.symbol(scope.symbol).is_namespace() {
                scope.symbol
            } else {
                self.enclosing_namespace(scope.symbol)
            };
            let ctx = CheckContext {
                scope,
                mapper: None,
                in_template: false,
                namespace: self.namespace_type(namespace_sym),
            };
            let Some(target) = self.resolve_name(&ctx, node.target.name) else {
                continue;
            };
            let entity = match target {
                // Augmenting a template declaration has no effect.
                NameTarget::Symbol(sym)
                    if node.target.arguments.is_empty() && !self.declaration_parameters(sym).is_empty() =>
                {
                    continue;
                }
                NameTarget::Symbol(sym) => self.check_symbol(&ctx, sym, node.target.arguments, node.target.data.range),
                NameTarget::Entity(entity) if node.target.arguments.is_empty() => entity,
                NameTarget::Entity(entity) => self.instantiate_member(&ctx, entity, node.target),
            };
            let Some(target) = entity.as_type() else {
                self.report(scope.file, node.target.data.range, &messages::VALUE_IN_TYPE, &[]);
                continue;
            };
            if self.types.is_error(target) || self.types.get(target).template_declaration {
                continue;
            }
            self.apply_decorator(&ctx, target, node.decorator, node.arguments, node.data.range);
        }
    }
}
