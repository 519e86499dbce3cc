//! Decorator resolution, argument checking and execution.
//!
//! A decorator is either declared in source (`extern dec doc(...)`) with an
//! implementation registered from a [`ModuleRecord`], or exists only as an
//! implementation. Declared decorators get their target and arguments
//! checked against the declared parameters; implementation-only decorators
//! accept anything.

use crate::checker::{CheckContext, Checker, NameTarget};
use crate::names::type_name;
use crate::numeric::Numeric;
use crate::state::StateMaps;
use crate::types::{
    DecoratorApplication, DecoratorParameter, DecoratorType, Entity, MixedConstraint, SourceLocation, TypeId, TypeKind, TypeTable,
    ValueKind,
};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::trace;
use tspec_ast::node::*;
use tspec_ast::types::ModifierFlags;
use tspec_binder::{ResolutionResult, SymbolId};
use tspec_core::text::TextRange;
use tspec_diagnostics::{messages, Diagnostic, DiagnosticMessage, DiagnosticTarget};

/// A decorator implementation: called with the decorated type and the
/// checked arguments.
pub type DecoratorFn = Arc<dyn Fn(&mut DecoratorContext<'_>, TypeId, &[Entity]) + Send + Sync>;

/// What a decorator implementation can see and do while it runs.
pub struct DecoratorContext<'c> {
    table: &'c TypeTable,
    state: &'c mut StateMaps,
    diagnostics: &'c mut Vec<Diagnostic>,
    target: Option<DiagnosticTarget>,
    decorator_name: &'c str,
}

impl<'c> DecoratorContext<'c> {
    pub(crate) fn new(
        table: &'c TypeTable,
        state: &'c mut StateMaps,
        diagnostics: &'c mut Vec<Diagnostic>,
        target: Option<DiagnosticTarget>,
        decorator_name: &'c str,
    ) -> Self {
        Self {
            table,
            state,
            diagnostics,
            target,
            decorator_name,
        }
    }

    pub fn table(&self) -> &TypeTable {
        self.table
    }

    pub fn state(&mut self) -> &mut StateMaps {
        self.state
    }

    pub fn decorator_name(&self) -> &str {
        self.decorator_name
    }

    /// Report a diagnostic at the decorator application.
    pub fn report(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let diagnostic = match &self.target {
            Some(target) => Diagnostic::with_target(target.clone(), message, args),
            None => Diagnostic::new(message, args),
        };
        self.diagnostics.push(diagnostic);
    }

    /// A string argument, given either as a value or as a literal.
    pub fn string_arg(&self, args: &[Entity], index: usize) -> Option<String> {
        match args.get(index)? {
            Entity::Value(id) => match &self.table.value(*id).kind {
                ValueKind::String(s) => Some(s.clone()),
                _ => None,
            },
            Entity::Type(id) | Entity::Indeterminate(id) => match &self.table.get(*id).kind {
                TypeKind::String(s) => Some(s.clone()),
                TypeKind::StringTemplate(t) => t.string_value.clone(),
                _ => None,
            },
        }
    }

    pub fn numeric_arg(&self, args: &[Entity], index: usize) -> Option<Numeric> {
        match args.get(index)? {
            Entity::Value(id) => match &self.table.value(*id).kind {
                ValueKind::Numeric(n) => Some(n.clone()),
                _ => None,
            },
            Entity::Type(id) | Entity::Indeterminate(id) => match &self.table.get(*id).kind {
                TypeKind::Number(n) => Some(n.clone()),
                _ => None,
            },
        }
    }

    pub fn type_name(&self, id: TypeId) -> String {
        type_name(self.table, id)
    }
}

/// Decorator implementations contributed by one library module.
#[derive(Clone)]
pub struct ModuleRecord {
    pub path: String,
    /// Namespace the decorators are declared in, `None` for global.
    pub namespace: Option<String>,
    pub decorators: IndexMap<String, DecoratorFn>,
}

impl ModuleRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: None,
            decorators: IndexMap::new(),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_decorator<F>(mut self, name: impl Into<String>, implementation: F) -> Self
    where
        F: Fn(&mut DecoratorContext<'_>, TypeId, &[Entity]) + Send + Sync + 'static,
    {
        self.decorators.insert(name.into(), Arc::new(implementation));
        self
    }

    /// `Namespace.name` of each decorator, with its implementation.
    pub fn qualified_decorators(&self) -> impl Iterator<Item = (String, &DecoratorFn)> {
        self.decorators.iter().map(|(name, f)| (qualify(self.namespace.as_deref(), name), f))
    }
}

impl std::fmt::Debug for ModuleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("path", &self.path)
            .field("namespace", &self.namespace)
            .field("decorators", &self.decorators.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

impl<'a> Checker<'a> {
    /// Find the decorator named by `path`: a declared `dec`, or failing
    /// that a registered implementation visible from the current namespace.
    pub(crate) fn resolve_decorator(&mut self, ctx: &CheckContext, path: NamePath<'a>) -> Option<TypeId> {
        let name = path.last().text_name;
        let key = self.binder.decorator_key(name);
        let (declared, namespaces) = match path {
            NamePath::Identifier(id) => match self.binder.resolve(ctx.scope, key) {
                ResolutionResult::Resolved(sym) => (Some(sym), Vec::new()),
                ResolutionResult::Ambiguous(candidates) => {
                    let names: Vec<String> = candidates.iter().map(|c| self.binder.full_name(*c)).collect();
                    let joined = names.join(", ");
                    self.report(
                        ctx.scope.file,
                        id.data.range,
                        &messages::AMBIGUOUS_SYMBOL,
                        &[name, joined.as_str(), joined.as_str()],
                    );
                    return None;
                }
                ResolutionResult::Unresolved => (None, self.visible_namespaces(ctx.scope.symbol)),
            },
            NamePath::Member(member) => match self.resolve_name(ctx, member.base)? {
                NameTarget::Symbol(base) if self.binder.symbol(base).is_namespace() => {
                    let found = self.binder.lookup_export(base, key);
                    (found, vec![self.binder.full_name(base)])
                }
                _ => (None, Vec::new()),
            },
        };

        if let Some(sym) = declared {
            return match self.check_declaration(sym, None) {
                Entity::Type(id) if self.types.decorator(id).is_some() => Some(id),
                _ => {
                    let text = path.to_text();
                    self.report(ctx.scope.file, path.range(), &messages::INVALID_DECORATOR, &[text.as_str()]);
                    None
                }
            };
        }

        for namespace in namespaces {
            let full = qualify(Some(&namespace), name);
            if let Some(id) = self.implementation_decorator(&full, name) {
                return Some(id);
            }
        }
        let text = path.to_text();
        self.report(ctx.scope.file, path.range(), &messages::INVALID_REF_DECORATOR, &[text.as_str()]);
        None
    }

    /// Full names of the namespaces enclosing `symbol`, innermost first,
    /// then the global namespace and `TypeSpec`.
    fn visible_namespaces(&self, symbol: SymbolId) -> Vec<String> {
        let mut result = Vec::new();
        let mut current = Some(symbol);
        while let Some(sym) = current {
            if self.binder.symbol(sym).is_namespace() {
                result.push(self.binder.full_name(sym));
            }
            current = self.binder.symbol(sym).parent;
        }
        if !result.iter().any(|n| n.is_empty()) {
            result.push(String::new());
        }
        if !result.iter().any(|n| n == tspec_binder::STD_NAMESPACE) {
            result.push(tspec_binder::STD_NAMESPACE.to_string());
        }
        result
    }

    /// Type of a decorator that only exists as a registered implementation.
    fn implementation_decorator(&mut self, full_name: &str, name: &str) -> Option<TypeId> {
        if let Some(id) = self.implementation_decorators.get(full_name) {
            return Some(*id);
        }
        let implementation = self.implementations.get(full_name)?.clone();
        let id = self.types.add_type(TypeKind::Decorator(DecoratorType {
            name: name.to_string(),
            namespace: None,
            target: None,
            parameters: Vec::new(),
            implementation: Some(implementation),
            declared: false,
        }));
        self.types.get_mut(id).finished = true;
        self.implementation_decorators.insert(full_name.to_string(), id);
        Some(id)
    }

    pub(crate) fn check_decorator_declaration(
        &mut self,
        sym: SymbolId,
        node: &'a DecoratorDeclarationStatement<'a>,
    ) -> TypeId {
        let ctx = self.declaration_context(sym, None);
        let name = node.id.text_name.to_string();
        let id = self.types.add_type(TypeKind::Decorator(DecoratorType {
            name: name.clone(),
            namespace: Some(ctx.namespace),
            target: None,
            parameters: Vec::new(),
            implementation: None,
            declared: true,
        }));
        self.types.get_mut(id).node = Some(node.data.id);
        self.declared.insert(sym, Entity::Type(id));
        if let Some(ns) = self.types.namespace_mut(ctx.namespace) {
            ns.decorator_declarations.entry(name).or_insert(id);
        }

        let target = self.decorator_parameter(&ctx, node.target);
        let parameters: Vec<DecoratorParameter> =
            node.parameters.iter().map(|p| self.decorator_parameter(&ctx, p)).collect();
        let full_name = self.binder.full_name(sym);
        let implementation = self.implementations.get(&full_name).cloned();
        if implementation.is_none() && node.modifiers.contains(ModifierFlags::EXTERN) {
            self.report(
                ctx.scope.file,
                node.id.data.range,
                &messages::DECORATOR_MISSING_IMPLEMENTATION,
                &[],
            );
        }
        if let TypeKind::Decorator(d) = &mut self.types.get_mut(id).kind {
            d.target = Some(target);
            d.parameters = parameters;
            d.implementation = implementation;
        }
        self.types.get_mut(id).finished = true;
        id
    }

    fn decorator_parameter(&mut self, ctx: &CheckContext, node: &'a FunctionParameter<'a>) -> DecoratorParameter {
        DecoratorParameter {
            name: node.id.text_name.to_string(),
            constraint: node.type_annotation.map(|t| self.check_constraint(ctx, t)),
            optional: node.optional,
            rest: node.rest,
        }
    }

    /// Apply the decorators written on a declaration, after any copied
    /// from a source type, then mark the type finished. Nothing runs inside
    /// template declarations or partial instances.
    pub(crate) fn finish_type(
        &mut self,
        ctx: &CheckContext,
        id: TypeId,
        inherited: Vec<DecoratorApplication>,
        decorators: &'a [&'a DecoratorExpression<'a>],
    ) {
        if !ctx.in_template {
            for application in inherited {
                self.push_decorator(id, application);
            }
            for decorator in decorators {
                self.apply_decorator(ctx, id, decorator.target, decorator.arguments, decorator.data.range);
            }
        }
        self.types.get_mut(id).finished = true;
    }

    /// Re-run decorators of `source` on its copy `target`.
    pub(crate) fn copy_decorators(&mut self, ctx: &CheckContext, source: TypeId, target: TypeId) {
        if ctx.in_template {
            return;
        }
        let applications = self.types.get(source).decorators.clone();
        for application in applications {
            self.push_decorator(target, application);
        }
    }

    fn push_decorator(&mut self, target: TypeId, application: DecoratorApplication) {
        self.types.get_mut(target).decorators.push(application.clone());
        self.run_decorator(target, &application);
    }

    pub(crate) fn apply_decorator(
        &mut self,
        ctx: &CheckContext,
        target: TypeId,
        path: NamePath<'a>,
        arguments: &'a [Expression<'a>],
        range: TextRange,
    ) {
        let Some(decorator) = self.resolve_decorator(ctx, path) else {
            return;
        };
        let Some(declaration) = self.types.decorator(decorator).cloned() else {
            return;
        };
        let Some(args) = self.check_decorator_arguments(ctx, &declaration, arguments, range) else {
            return;
        };
        let target_constraint = declaration
            .target
            .as_ref()
            .and_then(|t| t.constraint)
            .and_then(|c| c.type_id);
        if let Some(constraint) = target_constraint {
            if !self.is_assignable(target, constraint) {
                let target_name = type_name(&self.types, target);
                let constraint_name = type_name(&self.types, constraint);
                self.report(
                    ctx.scope.file,
                    range,
                    &messages::DECORATOR_WRONG_TARGET,
                    &[declaration.name.as_str(), target_name.as_str(), constraint_name.as_str()],
                );
                return;
            }
        }
        let application = DecoratorApplication {
            decorator,
            arguments: args,
            location: Some(SourceLocation {
                file: ctx.scope.file,
                range,
            }),
        };
        self.push_decorator(target, application);
    }

    fn check_decorator_arguments(
        &mut self,
        ctx: &CheckContext,
        declaration: &DecoratorType,
        arguments: &'a [Expression<'a>],
        range: TextRange,
    ) -> Option<Vec<Entity>> {
        if !declaration.declared {
            return Some(arguments.iter().map(|a| self.check_argument(ctx, *a, None, &messages::INVALID_ARGUMENT)).collect());
        }
        let parameters = &declaration.parameters;
        let rest = parameters.last().filter(|p| p.rest);
        let positional = parameters.len() - usize::from(rest.is_some());
        let required = parameters.iter().filter(|p| !p.optional && !p.rest).count();
        let got = arguments.len();
        if got < required || (rest.is_none() && got > positional) {
            let got_text = got.to_string();
            if rest.is_some() {
                let expected = required.to_string();
                self.report(
                    ctx.scope.file,
                    range,
                    &messages::INVALID_ARGUMENT_COUNT_AT_LEAST,
                    &[expected.as_str(), got_text.as_str()],
                );
            } else {
                let expected = if required == positional {
                    required.to_string()
                } else {
                    format!("{}-{}", required, positional)
                };
                self.report(
                    ctx.scope.file,
                    range,
                    &messages::INVALID_ARGUMENT_COUNT,
                    &[expected.as_str(), got_text.as_str()],
                );
            }
            return None;
        }

        let mut result = Vec::with_capacity(got);
        for (index, argument) in arguments.iter().enumerate() {
            let constraint = if index < positional {
                parameters[index].constraint
            } else {
                rest.and_then(|r| r.constraint).map(|c| MixedConstraint {
                    type_id: c.type_id.map(|t| self.types.array_element(t).unwrap_or(t)),
                    value_type: c.value_type.map(|t| self.types.array_element(t).unwrap_or(t)),
                })
            };
            result.push(self.check_argument(ctx, *argument, constraint, &messages::INVALID_ARGUMENT));
        }
        Some(result)
    }

    /// Run the implementation of an applied decorator, if it has one, and
    /// collect what it reports.
    pub(crate) fn run_decorator(&mut self, target: TypeId, application: &DecoratorApplication) {
        let Some(declaration) = self.types.decorator(application.decorator) else {
            return;
        };
        let Some(implementation) = declaration.implementation.clone() else {
            return;
        };
        let name = declaration.name.clone();
        let location = application.location.and_then(|l| {
            self.binder
                .file(l.file)
                .map(|f| DiagnosticTarget::new(f.file_name, l.range))
        });
        trace!(target: "tspec::checker", decorator = %name, target = target.0, "running decorator");
        let mut reported = Vec::new();
        {
            let mut context = DecoratorContext::new(&self.types, &mut self.state, &mut reported, location, &name);
            implementation(&mut context, target, &application.arguments);
        }
        for diagnostic in reported {
            self.add_diagnostic(diagnostic);
        }
    }
}
