//! Template parameters, constraints and instantiation.

use crate::checker::{CheckContext, Checker};
use crate::cycles::Step;
use crate::names::type_name;
use crate::types::*;
use std::sync::Arc;
use tracing::trace;
use tspec_ast::node::*;
use tspec_binder::{Declaration, SymbolId};
use tspec_core::text::TextRange;
use tspec_diagnostics::messages;

impl<'a> Checker<'a> {
    /// The type of a template parameter declaration. Created once; its
    /// constraint and default are checked in the owner's context.
    pub(crate) fn template_parameter_type(&mut self, sym: SymbolId) -> TypeId {
        if let Some(id) = self.template_parameters.get(&sym) {
            return *id;
        }
        let Some(Declaration::TemplateParameter { node, .. }) = self.binder.symbol(sym).declaration() else {
            return self.types.error_type;
        };
        let id = self.types.add_type(TypeKind::TemplateParameter(TemplateParameterType {
            name: node.id.text_name.to_string(),
            constraint: None,
            default: None,
        }));
        {
            let ty = self.types.get_mut(id);
            ty.node = Some(node.data.id);
            ty.in_template = true;
        }
        self.template_parameters.insert(sym, id);

        let Some(owner) = self.binder.symbol(sym).parent else {
            self.types.get_mut(id).finished = true;
            return id;
        };
        let mut ctx = self.declaration_context(owner, None);
        ctx.in_template = true;

        let constraint = node.constraint.map(|c| self.check_constraint(&ctx, c));
        if let Some(param) = self.types.template_parameter_mut(id) {
            param.constraint = constraint;
        }
        if let Some(default) = node.default {
            let entity = self.check_argument(&ctx, default, constraint, &messages::INVALID_TEMPLATE_ARGUMENT);
            if let Some(param) = self.types.template_parameter_mut(id) {
                param.default = Some(entity);
            }
        }
        self.types.get_mut(id).finished = true;
        id
    }

    /// What a template parameter reference denotes in `ctx`: its argument
    /// inside an instance, the parameter itself otherwise.
    pub(crate) fn template_parameter_entity(&mut self, ctx: &CheckContext, sym: SymbolId) -> Entity {
        let param = self.template_parameter_type(sym);
        ctx.mapper
            .as_ref()
            .and_then(|m| m.get(param))
            .unwrap_or(Entity::Type(param))
    }

    /// Whether an entity still depends on unmapped template parameters.
    pub(crate) fn entity_in_template(&self, entity: Entity) -> bool {
        match entity {
            Entity::Value(_) => false,
            Entity::Type(id) | Entity::Indeterminate(id) => {
                let ty = self.types.get(id);
                matches!(ty.kind, TypeKind::TemplateParameter(_)) || ty.in_template || ty.template_declaration
            }
        }
    }

    /// The type argument of an unmapped parameter with a value constraint,
    /// i.e. a value that is only known per instance.
    pub(crate) fn deferred_value_constraint(&self, id: TypeId) -> Option<TypeId> {
        self.types.template_parameter(id)?.constraint?.value_type
    }

    /// `extends` clause of a template parameter or the type annotation of a
    /// decorator parameter. `valueof` options accept values.
    pub(crate) fn check_constraint(&mut self, ctx: &CheckContext, expr: Expression<'a>) -> MixedConstraint {
        match expr {
            Expression::ValueOf(node) => MixedConstraint {
                type_id: None,
                value_type: Some(self.check_type_expression(ctx, node.target)),
            },
            Expression::Union(node) if node.options.iter().any(|o| matches!(o, Expression::ValueOf(_))) => {
                let mut types = Vec::new();
                let mut values = Vec::new();
                for option in node.options.iter() {
                    match *option {
                        Expression::ValueOf(value) => values.push(self.check_type_expression(ctx, value.target)),
                        other => types.push(self.check_type_expression(ctx, other)),
                    }
                }
                MixedConstraint {
                    type_id: self.union_of(ctx, types),
                    value_type: self.union_of(ctx, values),
                }
            }
            _ => MixedConstraint {
                type_id: Some(self.check_type_expression(ctx, expr)),
                value_type: None,
            },
        }
    }

    fn union_of(&mut self, ctx: &CheckContext, types: Vec<TypeId>) -> Option<TypeId> {
        match types.len() {
            0 => None,
            1 => types.first().copied(),
            _ => Some(self.make_union(ctx, types)),
        }
    }

    /// Bind the arguments of a template reference to the declaration's
    /// parameters. Missing arguments take the parameter default.
    fn check_template_arguments(
        &mut self,
        ctx: &CheckContext,
        sym: SymbolId,
        args: &'a [&'a TemplateArgument<'a>],
        range: TextRange,
        parent: Option<&TemplateMapper>,
    ) -> TemplateMapper {
        let params = self.declaration_parameters(sym);
        let names: Vec<Option<&'a str>> = match self.binder.symbol(sym).declaration() {
            Some(declaration) => declaration.template_parameters().iter().map(|p| Some(p.id.text_name)).collect(),
            None => Vec::new(),
        };

        let mut assigned: Vec<Option<&'a TemplateArgument<'a>>> = vec![None; params.len()];
        let mut positional = 0;
        let mut too_many_reported = false;
        for arg in args.iter() {
            match arg.name {
                Some(name) => match names.iter().position(|n| *n == Some(name.text_name)) {
                    Some(index) => assigned[index] = Some(arg),
                    None => {
                        self.report(
                            ctx.scope.file,
                            name.data.range,
                            &messages::UNKNOWN_TEMPLATE_ARG,
                            &[name.text_name],
                        );
                    }
                },
                None if positional < params.len() => {
                    assigned[positional] = Some(arg);
                    positional += 1;
                }
                None => {
                    if !too_many_reported {
                        self.report(ctx.scope.file, arg.data.range, &messages::TOO_MANY_TEMPLATE_ARGS, &[]);
                        too_many_reported = true;
                    }
                }
            }
        }

        let mut mapper = TemplateMapper::new(parent);
        let error = Entity::Type(self.types.error_type);
        for (index, param) in params.iter().enumerate() {
            let constraint = self.types.template_parameter(*param).and_then(|p| p.constraint);
            let entity = match assigned[index] {
                Some(arg) => self.check_argument(ctx, arg.argument, constraint, &messages::INVALID_TEMPLATE_ARGUMENT),
                None => match self.parameter_default(sym, *param, &mapper) {
                    Some(entity) => entity,
                    None => {
                        let name = names.get(index).copied().flatten().unwrap_or("");
                        self.report(ctx.scope.file, range, &messages::TEMPLATE_ARG_REQUIRED, &[name]);
                        error
                    }
                },
            };
            if self.entity_in_template(entity) {
                mapper.partial = true;
            }
            mapper.bind(*param, entity);
        }
        mapper
    }

    /// The default of a template parameter, evaluated against the
    /// arguments bound so far.
    fn parameter_default(&mut self, sym: SymbolId, param: TypeId, bound: &TemplateMapper) -> Option<Entity> {
        let node = self
            .types
            .get(param)
            .node
            .and_then(|n| self.binder.symbol_of(n))
            .and_then(|s| match self.binder.symbol(s).declaration() {
                Some(Declaration::TemplateParameter { node, .. }) => Some(node),
                _ => None,
            })?;
        let default = node.default?;
        let ctx = self.declaration_context(sym, Some(Arc::new(bound.clone())));
        let constraint = self.types.template_parameter(param).and_then(|p| p.constraint);
        Some(self.check_argument(&ctx, default, constraint, &messages::INVALID_TEMPLATE_ARGUMENT))
    }

    /// Instantiate a templated declaration with the given arguments.
    pub(crate) fn instantiate(
        &mut self,
        ctx: &CheckContext,
        sym: SymbolId,
        args: &'a [&'a TemplateArgument<'a>],
        range: TextRange,
        parent: Option<Arc<TemplateMapper>>,
    ) -> Entity {
        self.resolution_path.push(Step::Nested);
        let mapper = self.check_template_arguments(ctx, sym, args, range, parent.as_deref());
        self.resolution_path.pop();
        self.instantiate_mapper(sym, mapper)
    }

    /// The instance of `sym` for a complete set of bindings, reused when
    /// the same arguments were seen before.
    pub(crate) fn instantiate_mapper(&mut self, sym: SymbolId, mapper: TemplateMapper) -> Entity {
        if let Some(entity) = self.instances.get(&(sym, mapper.args.clone())) {
            return *entity;
        }
        if tracing::enabled!(target: "tspec::checker", tracing::Level::TRACE) {
            let args: Vec<String> = mapper
                .args
                .iter()
                .map(|a| a.as_type().map(|t| type_name(&self.types, t)).unwrap_or_default())
                .collect();
            trace!(
                target: "tspec::checker",
                template = %self.binder.full_name(sym),
                args = %args.join(", "),
                partial = mapper.partial,
                "instantiating template"
            );
        }
        self.check_declaration(sym, Some(Arc::new(mapper)))
    }
}
