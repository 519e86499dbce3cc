//! Declarations with heritage: models (`extends`, `is`, spreads and
//! intersections), scalars, enums, unions, interfaces and operations.

use crate::checker::{CheckContext, Checker};
use crate::cycles::{Step, Visit};
use crate::names::type_name;
use crate::types::*;
use std::sync::Arc;
use tracing::debug;
use tspec_ast::node::*;
use tspec_ast::types::SourceFileId;
use tspec_binder::SymbolId;
use tspec_core::text::TextRange;
use tspec_diagnostics::{messages, DiagnosticMessage};

impl<'a> Checker<'a> {
    // ========================================================================
    // Models
    // ========================================================================

    pub(crate) fn check_model(
        &mut self,
        sym: SymbolId,
        node: &'a ModelStatement<'a>,
        mapper: Option<Arc<TemplateMapper>>,
    ) -> TypeId {
        let ctx = self.declaration_context(sym, mapper.clone());
        let name = node.id.text_name.to_string();
        let id = self.types.add_type(TypeKind::Model(ModelType {
            name: name.clone(),
            namespace: Some(ctx.namespace),
            ..ModelType::default()
        }));
        self.init_declared_type(id, sym, node.data.id, &ctx);
        self.register(sym, &mapper, Entity::Type(id));
        if mapper.is_none() {
            self.register_in_namespace(ctx.namespace, id);
        }
        self.register_std_type(sym, &name, id);

        self.base_coloring.enter(id);
        let inherited = match node.is {
            Some(is) => self.check_model_is(&ctx, id, is, !node.properties.is_empty()),
            None => Vec::new(),
        };
        if let Some(extends) = node.extends {
            self.check_model_extends(&ctx, id, extends);
        }
        self.base_coloring.leave(id);

        self.set_std_indexer(&ctx, sym, id);
        self.check_model_members(&ctx, id, node.properties);
        self.finish_type(&ctx, id, inherited, node.decorators);
        id
    }

    /// `model A is B`: copy everything from `B`. Returns the decorators of
    /// `B`, which `A` inherits.
    fn check_model_is(
        &mut self,
        ctx: &CheckContext,
        id: TypeId,
        expr: Expression<'a>,
        has_properties: bool,
    ) -> Vec<DecoratorApplication> {
        let Some(source) = self.check_heritage_target(ctx, id, expr, &messages::IS_MODEL, &messages::IS_MODEL_EXPRESSION) else {
            return Vec::new();
        };
        if has_properties && self.types.array_element(source).is_some() {
            self.report(ctx.scope.file, expr.range(), &messages::NO_ARRAY_PROPERTIES, &[]);
        }
        let Some(model) = self.types.model(source).cloned() else {
            return Vec::new();
        };
        if let Some(target) = self.types.model_mut(id) {
            target.source_model = Some(source);
            target.source_models.push(SourceModel {
                model: source,
                usage: SourceModelUsage::Is,
            });
            target.base_model = model.base_model;
            target.indexer = model.indexer;
        }
        if let Some(base) = model.base_model.and_then(|b| self.types.model_mut(b)) {
            base.derived_models.push(id);
        }
        for prop in model.properties.values() {
            let clone = self.clone_property(ctx, *prop, id);
            let name = self.types.property(clone).map(|p| p.name.clone()).unwrap_or_default();
            if let Some(target) = self.types.model_mut(id) {
                target.properties.insert(name, clone);
            }
        }
        self.types.get(source).decorators.clone()
    }

    fn check_model_extends(&mut self, ctx: &CheckContext, id: TypeId, expr: Expression<'a>) {
        let Some(base) = self.check_heritage_target(ctx, id, expr, &messages::EXTEND_MODEL, &messages::EXTEND_MODEL_EXPRESSION)
        else {
            return;
        };
        if let Some(model) = self.types.model_mut(id) {
            model.base_model = Some(base);
            model.source_models.push(SourceModel {
                model: base,
                usage: SourceModelUsage::Extends,
            });
        }
        if let Some(base) = self.types.model_mut(base) {
            base.derived_models.push(id);
        }
    }

    /// The named model an `extends` or `is` clause refers to.
    fn check_heritage_target(
        &mut self,
        ctx: &CheckContext,
        owner: TypeId,
        expr: Expression<'a>,
        not_model: &DiagnosticMessage,
        model_expression: &DiagnosticMessage,
    ) -> Option<TypeId> {
        if matches!(expr, Expression::Model(_)) {
            self.report(ctx.scope.file, expr.range(), model_expression, &[]);
            return None;
        }
        self.resolution_path.push(Step::Heritage((owner, ctx.scope.file, expr.range())));
        let target = self.check_type_expression(ctx, expr);
        self.resolution_path.pop();
        if self.types.is_error(target) || self.types.template_parameter(target).is_some() {
            return None;
        }
        let Some(model) = self.types.model(target) else {
            self.report(ctx.scope.file, expr.range(), not_model, &[]);
            return None;
        };
        if model.name.is_empty() {
            self.report(ctx.scope.file, expr.range(), model_expression, &[]);
            return None;
        }
        if self.base_coloring.is_in_progress(&target) {
            self.report_circular_base(ctx.scope.file, target, expr.range());
            return None;
        }
        Some(target)
    }

    /// Report a base type cycle once per declaration, however many
    /// instances of it run into the cycle.
    pub(crate) fn report_circular_base(&mut self, file: SourceFileId, target: TypeId, range: TextRange) {
        let declaration = self.types.get(target).node.and_then(|n| self.binder.symbol_of(n));
        if let Some(sym) = declaration {
            if !self.circular_reported.insert(sym) {
                return;
            }
        }
        let name = type_name(&self.types, target);
        debug!(target: "tspec::checker", name = %name, "circular base type");
        self.report(file, range, &messages::CIRCULAR_BASE_TYPE, &[name.as_str()]);
    }

    /// `Array<Element>` and `Record<Element>` get an indexer keyed by
    /// `integer` and `string`.
    fn set_std_indexer(&mut self, ctx: &CheckContext, sym: SymbolId, id: TypeId) {
        let key_name = if self.std_symbol("Array") == Some(sym) {
            "integer"
        } else if self.std_symbol("Record") == Some(sym) {
            "string"
        } else {
            return;
        };
        let Some(key) = self.std_symbol(key_name).and_then(|s| self.check_declaration(s, None).as_type()) else {
            return;
        };
        let Some(param) = self.declaration_parameters(sym).first().copied() else {
            return;
        };
        let value = ctx
            .mapper
            .as_ref()
            .and_then(|m| m.get(param))
            .and_then(|e| e.as_type())
            .unwrap_or(param);
        if let Some(model) = self.types.model_mut(id) {
            model.indexer = Some(ModelIndexer { key, value });
        }
    }

    fn check_model_members(&mut self, ctx: &CheckContext, model: TypeId, members: &'a [ModelMember<'a>]) {
        for member in members.iter() {
            match *member {
                ModelMember::Property(node) => self.check_model_property(ctx, model, node),
                ModelMember::Spread(node) => self.check_spread(ctx, model, node),
            }
        }
    }

    fn check_model_property(&mut self, ctx: &CheckContext, model: TypeId, node: &'a ModelProperty<'a>) {
        let name = node.id.text_name.to_string();
        let prop = self.types.add_type(TypeKind::ModelProperty(ModelPropertyType {
            name: name.clone(),
            model: Some(model),
            type_id: self.types.error_type,
            optional: node.optional,
            default_value: None,
            source_property: None,
        }));
        self.init_member_type(prop, Some(node.data.id), ctx);

        let duplicate = self.types.model(model).is_some_and(|m| m.properties.contains_key(&name));
        if duplicate {
            self.report(ctx.scope.file, node.id.data.range, &messages::DUPLICATE_PROPERTY, &[name.as_str()]);
        } else if let Some(m) = self.types.model_mut(model) {
            m.properties.insert(name, prop);
        }

        self.property_coloring.enter(prop);
        let type_id = self.check_type_expression(ctx, node.value);
        self.property_coloring.leave(prop);
        if let Some(p) = self.types.property_mut(prop) {
            p.type_id = type_id;
        }
        if !duplicate {
            self.check_property_override(ctx, model, prop, node.id.data.range);
        }
        if let Some(default) = node.default {
            let value = self.check_default(ctx, type_id, default);
            if let Some(p) = self.types.property_mut(prop) {
                p.default_value = value;
            }
        }
        self.finish_type(ctx, prop, Vec::new(), node.decorators);
    }

    /// A property that shadows one of a base model must keep a compatible
    /// type and stay required if the base one is.
    fn check_property_override(&mut self, ctx: &CheckContext, model: TypeId, prop: TypeId, range: TextRange) {
        if ctx.in_template {
            return;
        }
        let Some(base) = self.types.model(model).and_then(|m| m.base_model) else {
            return;
        };
        let Some((name, own_type, optional)) = self.types.property(prop).map(|p| (p.name.clone(), p.type_id, p.optional))
        else {
            return;
        };
        let Some(base_prop) = self.types.find_property(base, &name) else {
            return;
        };
        let Some((base_type, base_optional)) = self.types.property(base_prop).map(|p| (p.type_id, p.optional)) else {
            return;
        };
        if self.types.is_error(own_type) || self.types.is_error(base_type) {
            return;
        }
        if !self.is_assignable(own_type, base_type) {
            let own = type_name(&self.types, own_type);
            let inherited = type_name(&self.types, base_type);
            self.report(
                ctx.scope.file,
                range,
                &messages::OVERRIDE_PROPERTY_TYPE,
                &[name.as_str(), own.as_str(), inherited.as_str()],
            );
        }
        if optional && !base_optional {
            self.report(ctx.scope.file, range, &messages::OVERRIDE_PROPERTY_OPTIONAL, &[name.as_str()]);
        }
    }

    fn check_spread(&mut self, ctx: &CheckContext, model: TypeId, node: &'a ModelSpreadProperty<'a>) {
        let range = node.data.range;
        let Some(target) = self.check_type_reference(ctx, node.target).as_type() else {
            self.report(ctx.scope.file, range, &messages::VALUE_IN_TYPE, &[]);
            return;
        };
        if self.types.is_error(target) || self.types.template_parameter(target).is_some() {
            return;
        }
        if target == model {
            self.report(ctx.scope.file, range, &messages::SPREAD_MODEL_SELF, &[]);
            return;
        }
        if self.types.model(target).is_none() || self.types.array_element(target).is_some() {
            self.report(ctx.scope.file, range, &messages::SPREAD_MODEL, &[]);
            return;
        }
        if let Some(m) = self.types.model_mut(model) {
            m.source_models.push(SourceModel {
                model: target,
                usage: SourceModelUsage::Spread,
            });
        }
        if let Some(value) = self.types.record_element(target) {
            self.merge_indexer(ctx, model, value);
            return;
        }
        for prop in self.types.inherited_properties(target) {
            let name = self.types.property(prop).map(|p| p.name.clone()).unwrap_or_default();
            if self.types.model(model).is_some_and(|m| m.properties.contains_key(&name)) {
                self.report(ctx.scope.file, range, &messages::DUPLICATE_PROPERTY, &[name.as_str()]);
                continue;
            }
            let clone = self.clone_property(ctx, prop, model);
            if let Some(m) = self.types.model_mut(model) {
                m.properties.insert(name, clone);
            }
            self.check_property_override(ctx, model, clone, range);
        }
    }

    /// Add a `string`-keyed element type to a model's indexer.
    fn merge_indexer(&mut self, ctx: &CheckContext, model: TypeId, value: TypeId) {
        let Some(key) = self.types.std_type("string") else {
            return;
        };
        let existing = self.types.model(model).and_then(|m| m.indexer);
        let value = match existing {
            Some(indexer) if indexer.value != value => self.make_union(ctx, vec![indexer.value, value]),
            _ => value,
        };
        if let Some(m) = self.types.model_mut(model) {
            m.indexer = Some(ModelIndexer { key, value });
        }
    }

    /// Copy a property into `model`, keeping a link to where it came from.
    fn clone_property(&mut self, ctx: &CheckContext, source: TypeId, model: TypeId) -> TypeId {
        let Some(property) = self.types.property(source).cloned() else {
            return self.types.error_type;
        };
        let node = self.types.get(source).node;
        let id = self.types.add_type(TypeKind::ModelProperty(ModelPropertyType {
            model: Some(model),
            source_property: Some(source),
            ..property
        }));
        self.init_member_type(id, node, ctx);
        self.copy_decorators(ctx, source, id);
        self.types.get_mut(id).finished = true;
        id
    }

    /// `{ ... }` in type position.
    pub(crate) fn check_model_expression(&mut self, ctx: &CheckContext, node: &'a ModelExpression<'a>) -> TypeId {
        let id = self.anonymous_model(ctx, Some(node.data.id));
        self.check_model_members(ctx, id, node.properties);
        self.types.get_mut(id).finished = true;
        id
    }

    fn anonymous_model(&mut self, ctx: &CheckContext, node: Option<tspec_ast::types::NodeId>) -> TypeId {
        let id = self.types.add_type(TypeKind::Model(ModelType {
            namespace: Some(ctx.namespace),
            ..ModelType::default()
        }));
        self.init_member_type(id, node, ctx);
        id
    }

    /// `A & B`: an anonymous model with the properties of every option.
    pub(crate) fn check_intersection(&mut self, ctx: &CheckContext, node: &'a IntersectionExpression<'a>) -> TypeId {
        let id = self.anonymous_model(ctx, Some(node.data.id));
        for option in node.options.iter() {
            let t = self.check_type_expression(ctx, *option);
            if self.types.is_error(t) || self.types.template_parameter(t).is_some() {
                continue;
            }
            if self.types.model(t).is_none() || self.types.array_element(t).is_some() {
                self.report(ctx.scope.file, option.range(), &messages::INTERSECT_NON_MODEL, &[]);
                continue;
            }
            if let Some(m) = self.types.model_mut(id) {
                m.source_models.push(SourceModel {
                    model: t,
                    usage: SourceModelUsage::Intersection,
                });
            }
            if let Some(value) = self.types.record_element(t) {
                self.merge_indexer(ctx, id, value);
                continue;
            }
            for prop in self.types.inherited_properties(t) {
                let name = self.types.property(prop).map(|p| p.name.clone()).unwrap_or_default();
                let existing = self.types.model(id).and_then(|m| m.properties.get(&name).copied());
                if let Some(existing) = existing {
                    if !self.are_properties_compatible(existing, prop) {
                        self.report(
                            ctx.scope.file,
                            node.data.range,
                            &messages::INTERSECT_DUPLICATE_PROPERTY,
                            &[name.as_str()],
                        );
                    }
                    continue;
                }
                let clone = self.clone_property(ctx, prop, id);
                if let Some(m) = self.types.model_mut(id) {
                    m.properties.insert(name, clone);
                }
            }
        }
        self.types.get_mut(id).finished = true;
        id
    }

    /// Two same-named properties merge when they agree on optionality and
    /// their types are mutually assignable.
    fn are_properties_compatible(&mut self, a: TypeId, b: TypeId) -> bool {
        let (Some(left), Some(right)) = (self.types.property(a), self.types.property(b)) else {
            return false;
        };
        let (left_type, right_type) = (left.type_id, right.type_id);
        if left.optional != right.optional {
            return false;
        }
        if self.types.is_error(left_type) || self.types.is_error(right_type) {
            return true;
        }
        self.is_assignable(left_type, right_type) && self.is_assignable(right_type, left_type)
    }

    // ========================================================================
    // Scalars
    // ========================================================================

    pub(crate) fn check_scalar(
        &mut self,
        sym: SymbolId,
        node: &'a ScalarStatement<'a>,
        mapper: Option<Arc<TemplateMapper>>,
    ) -> TypeId {
        let ctx = self.declaration_context(sym, mapper.clone());
        let name = node.id.text_name.to_string();
        let id = self.types.add_type(TypeKind::Scalar(ScalarType {
            name: name.clone(),
            namespace: Some(ctx.namespace),
            ..ScalarType::default()
        }));
        self.init_declared_type(id, sym, node.data.id, &ctx);
        self.register(sym, &mapper, Entity::Type(id));
        if mapper.is_none() {
            self.register_in_namespace(ctx.namespace, id);
        }
        self.register_std_type(sym, &name, id);

        if let Some(extends) = node.extends {
            self.base_coloring.enter(id);
            self.resolution_path.push(Step::Heritage((id, ctx.scope.file, extends.data.range)));
            let target = self.check_type_reference(&ctx, extends).as_type().unwrap_or(self.types.error_type);
            self.resolution_path.pop();
            if !self.types.is_error(target) && self.types.template_parameter(target).is_none() {
                if self.types.scalar(target).is_none() {
                    self.report(ctx.scope.file, extends.data.range, &messages::EXTEND_SCALAR, &[]);
                } else if self.base_coloring.is_in_progress(&target) {
                    self.report_circular_base(ctx.scope.file, target, extends.data.range);
                } else {
                    if let Some(scalar) = self.types.scalar_mut(id) {
                        scalar.base_scalar = Some(target);
                    }
                    if let Some(base) = self.types.scalar_mut(target) {
                        base.derived_scalars.push(id);
                    }
                }
            }
            self.base_coloring.leave(id);
        }
        self.finish_type(&ctx, id, Vec::new(), node.decorators);
        id
    }

    // ========================================================================
    // Enums
    // ========================================================================

    pub(crate) fn check_enum(&mut self, sym: SymbolId, node: &'a EnumStatement<'a>) -> TypeId {
        let ctx = self.declaration_context(sym, None);
        let id = self.types.add_type(TypeKind::Enum(EnumType {
            name: node.id.text_name.to_string(),
            namespace: Some(ctx.namespace),
            ..EnumType::default()
        }));
        self.init_declared_type(id, sym, node.data.id, &ctx);
        self.register(sym, &None, Entity::Type(id));
        self.register_in_namespace(ctx.namespace, id);

        for member in node.members.iter() {
            match *member {
                EnumMemberNode::Member(m) => self.check_enum_member(&ctx, id, m),
                EnumMemberNode::Spread(spread) => self.check_enum_spread(&ctx, id, spread),
            }
        }
        self.finish_type(&ctx, id, Vec::new(), node.decorators);
        id
    }

    fn has_enum_member(&self, enum_type: TypeId, name: &str) -> bool {
        self.types.enum_type(enum_type).is_some_and(|e| e.members.contains_key(name))
    }

    fn check_enum_member(&mut self, ctx: &CheckContext, enum_type: TypeId, node: &'a EnumMember<'a>) {
        let name = node.id.text_name;
        if self.has_enum_member(enum_type, name) {
            self.report(ctx.scope.file, node.id.data.range, &messages::ENUM_MEMBER_DUPLICATE, &[name]);
            return;
        }
        let value = node.value.and_then(|v| match self.check_expression(ctx, v) {
            Entity::Indeterminate(t) => match &self.types.get(t).kind {
                TypeKind::String(s) => Some(EnumMemberValue::String(s.clone())),
                TypeKind::Number(n) => Some(EnumMemberValue::Number(n.clone())),
                _ => None,
            },
            _ => None,
        });
        let id = self.types.add_type(TypeKind::EnumMember(EnumMemberType {
            name: name.to_string(),
            enum_type,
            value,
            source_member: None,
        }));
        self.init_member_type(id, Some(node.data.id), ctx);
        if let Some(e) = self.types.enum_mut(enum_type) {
            e.members.insert(name.to_string(), id);
        }
        self.finish_type(ctx, id, Vec::new(), node.decorators);
    }

    fn check_enum_spread(&mut self, ctx: &CheckContext, enum_type: TypeId, node: &'a EnumSpreadMember<'a>) {
        let range = node.data.range;
        let Some(target) = self.check_type_reference(ctx, node.target).as_type() else {
            self.report(ctx.scope.file, range, &messages::SPREAD_ENUM, &[]);
            return;
        };
        if self.types.is_error(target) {
            return;
        }
        let Some(source) = self.types.enum_type(target) else {
            self.report(ctx.scope.file, range, &messages::SPREAD_ENUM, &[]);
            return;
        };
        let members: Vec<TypeId> = source.members.values().copied().collect();
        for source_member in members {
            let Some(member) = self.types.enum_member(source_member).cloned() else {
                continue;
            };
            if self.has_enum_member(enum_type, &member.name) {
                self.report(ctx.scope.file, range, &messages::ENUM_MEMBER_DUPLICATE, &[member.name.as_str()]);
                continue;
            }
            let name = member.name.clone();
            let node = self.types.get(source_member).node;
            let id = self.types.add_type(TypeKind::EnumMember(EnumMemberType {
                enum_type,
                source_member: Some(source_member),
                ..member
            }));
            self.init_member_type(id, node, ctx);
            if let Some(e) = self.types.enum_mut(enum_type) {
                e.members.insert(name, id);
            }
            self.copy_decorators(ctx, source_member, id);
            self.types.get_mut(id).finished = true;
        }
    }

    // ========================================================================
    // Unions
    // ========================================================================

    pub(crate) fn check_union(
        &mut self,
        sym: SymbolId,
        node: &'a UnionStatement<'a>,
        mapper: Option<Arc<TemplateMapper>>,
    ) -> TypeId {
        let ctx = self.declaration_context(sym, mapper.clone());
        let id = self.types.add_type(TypeKind::Union(UnionType {
            name: Some(node.id.text_name.to_string()),
            namespace: Some(ctx.namespace),
            variants: Vec::new(),
            expression: false,
        }));
        self.init_declared_type(id, sym, node.data.id, &ctx);
        self.register(sym, &mapper, Entity::Type(id));
        if mapper.is_none() {
            self.register_in_namespace(ctx.namespace, id);
        }

        for variant in node.variants.iter() {
            let name = variant.id.map(|i| i.text_name.to_string());
            if let (Some(name), Some(ident)) = (&name, variant.id) {
                let exists = self.types.union(id).is_some_and(|u| {
                    u.variants
                        .iter()
                        .any(|v| self.types.union_variant(*v).and_then(|v| v.name.as_ref()) == Some(name))
                });
                if exists {
                    self.report(ctx.scope.file, ident.data.range, &messages::UNION_DUPLICATE, &[name.as_str()]);
                    continue;
                }
            }
            let type_id = self.check_type_expression(&ctx, variant.value);
            let variant_id = self.types.add_type(TypeKind::UnionVariant(UnionVariantType {
                name,
                union: Some(id),
                type_id,
            }));
            self.init_member_type(variant_id, Some(variant.data.id), &ctx);
            if let Some(u) = self.types.union_mut(id) {
                u.variants.push(variant_id);
            }
            self.finish_type(&ctx, variant_id, Vec::new(), variant.decorators);
        }
        self.finish_type(&ctx, id, Vec::new(), node.decorators);
        id
    }

    /// `A | B | C`. Options that are themselves union expressions are
    /// flattened.
    pub(crate) fn check_union_expression(&mut self, ctx: &CheckContext, node: &'a UnionExpression<'a>) -> TypeId {
        let mut options = Vec::with_capacity(node.options.len());
        for option in node.options.iter() {
            let t = self.check_type_expression(ctx, *option);
            match self.types.union(t) {
                Some(union) if union.expression => {
                    options.extend(union.variants.iter().filter_map(|v| self.types.union_variant(*v).map(|v| v.type_id)));
                }
                _ => options.push(t),
            }
        }
        let id = self.make_union(ctx, options);
        self.types.get_mut(id).node = Some(node.data.id);
        id
    }

    /// An anonymous union over `options`.
    pub(crate) fn make_union(&mut self, ctx: &CheckContext, options: Vec<TypeId>) -> TypeId {
        let id = self.types.add_type(TypeKind::Union(UnionType {
            name: None,
            namespace: Some(ctx.namespace),
            variants: Vec::new(),
            expression: true,
        }));
        self.init_member_type(id, None, ctx);
        let mut variants = Vec::with_capacity(options.len());
        for option in options {
            let variant = self.types.add_type(TypeKind::UnionVariant(UnionVariantType {
                name: None,
                union: Some(id),
                type_id: option,
            }));
            self.init_member_type(variant, None, ctx);
            self.types.get_mut(variant).finished = true;
            variants.push(variant);
        }
        if let Some(u) = self.types.union_mut(id) {
            u.variants = variants;
        }
        self.types.get_mut(id).finished = true;
        id
    }

    // ========================================================================
    // Interfaces and operations
    // ========================================================================

    pub(crate) fn check_interface(
        &mut self,
        sym: SymbolId,
        node: &'a InterfaceStatement<'a>,
        mapper: Option<Arc<TemplateMapper>>,
    ) -> TypeId {
        let ctx = self.declaration_context(sym, mapper.clone());
        let id = self.types.add_type(TypeKind::Interface(InterfaceType {
            name: node.id.text_name.to_string(),
            namespace: Some(ctx.namespace),
            ..InterfaceType::default()
        }));
        self.init_declared_type(id, sym, node.data.id, &ctx);
        self.register(sym, &mapper, Entity::Type(id));
        if mapper.is_none() {
            self.register_in_namespace(ctx.namespace, id);
        }

        self.base_coloring.enter(id);
        for extends in node.extends.iter() {
            self.check_interface_extends(&ctx, id, extends);
        }
        self.base_coloring.leave(id);

        let mut own: Vec<String> = Vec::with_capacity(node.operations.len());
        for op in node.operations.iter() {
            let name = op.id.text_name;
            if own.iter().any(|n| n == name) {
                self.report(ctx.scope.file, op.id.data.range, &messages::INTERFACE_DUPLICATE, &[name]);
                continue;
            }
            own.push(name.to_string());
            let Some(op_sym) = self.binder.symbol_of(op.data.id) else {
                continue;
            };
            let op_type = self.check_operation(op_sym, op, ctx.mapper.clone(), Some(id));
            if let Some(interface) = self.types.interface_mut(id) {
                interface.operations.insert(name.to_string(), op_type);
            }
        }
        self.finish_type(&ctx, id, Vec::new(), node.decorators);
        id
    }

    fn check_interface_extends(&mut self, ctx: &CheckContext, id: TypeId, node: &'a TypeReference<'a>) {
        let range = node.data.range;
        self.resolution_path.push(Step::Heritage((id, ctx.scope.file, range)));
        let target = self.check_type_reference(ctx, node).as_type().unwrap_or(self.types.error_type);
        self.resolution_path.pop();
        if self.types.is_error(target) || self.types.template_parameter(target).is_some() {
            return;
        }
        if self.types.interface(target).is_none() {
            self.report(ctx.scope.file, range, &messages::EXTENDS_INTERFACE, &[]);
            return;
        }
        if self.base_coloring.is_in_progress(&target) {
            self.report_circular_base(ctx.scope.file, target, range);
            return;
        }
        if let Some(interface) = self.types.interface_mut(id) {
            interface.source_interfaces.push(target);
        }
        let inherited: Vec<(String, TypeId)> = self
            .types
            .interface(target)
            .map(|i| i.operations.iter().map(|(n, op)| (n.clone(), *op)).collect())
            .unwrap_or_default();
        for (name, op) in inherited {
            if self.types.interface(id).is_some_and(|i| i.operations.contains_key(&name)) {
                self.report(ctx.scope.file, range, &messages::INTERFACE_DUPLICATE, &[name.as_str()]);
                continue;
            }
            let clone = self.clone_operation(ctx, op, id);
            if let Some(interface) = self.types.interface_mut(id) {
                interface.operations.insert(name, clone);
            }
        }
    }

    fn clone_operation(&mut self, ctx: &CheckContext, source: TypeId, interface: TypeId) -> TypeId {
        let Some(op) = self.types.operation(source).cloned() else {
            return self.types.error_type;
        };
        let node = self.types.get(source).node;
        let id = self.types.add_type(TypeKind::Operation(OperationType {
            namespace: Some(ctx.namespace),
            interface: Some(interface),
            ..op
        }));
        self.init_member_type(id, node, ctx);
        self.copy_decorators(ctx, source, id);
        self.types.get_mut(id).finished = true;
        id
    }

    pub(crate) fn check_operation(
        &mut self,
        sym: SymbolId,
        node: &'a OperationStatement<'a>,
        mapper: Option<Arc<TemplateMapper>>,
        interface: Option<TypeId>,
    ) -> TypeId {
        let ctx = self.declaration_context(sym, mapper.clone());
        let id = self.types.add_type(TypeKind::Operation(OperationType {
            name: node.id.text_name.to_string(),
            namespace: Some(ctx.namespace),
            interface,
            parameters: self.types.error_type,
            return_type: self.types.void_type,
            source_operation: None,
        }));
        self.init_declared_type(id, sym, node.data.id, &ctx);
        self.register(sym, &mapper, Entity::Type(id));
        if mapper.is_none() && interface.is_none() {
            self.register_in_namespace(ctx.namespace, id);
        }

        let mut inherited = Vec::new();
        let (parameters, return_type) = match node.signature {
            OperationSignature::Declaration {
                parameters,
                return_type,
            } => {
                let parameters = self.check_model_expression(&ctx, parameters);
                (parameters, self.check_type_expression(&ctx, return_type))
            }
            OperationSignature::Reference(reference) => match self.check_operation_reference(&ctx, id, reference) {
                Some(source) => {
                    let (source_parameters, source_return) = self
                        .types
                        .operation(source)
                        .map(|op| (op.parameters, op.return_type))
                        .unwrap_or((self.types.error_type, self.types.void_type));
                    let parameters = self.anonymous_model(&ctx, None);
                    for prop in self.types.inherited_properties(source_parameters) {
                        let name = self.types.property(prop).map(|p| p.name.clone()).unwrap_or_default();
                        let clone = self.clone_property(&ctx, prop, parameters);
                        if let Some(m) = self.types.model_mut(parameters) {
                            m.properties.insert(name, clone);
                        }
                    }
                    self.types.get_mut(parameters).finished = true;
                    if let Some(op) = self.types.operation_mut(id) {
                        op.source_operation = Some(source);
                    }
                    inherited = self.types.get(source).decorators.clone();
                    (parameters, source_return)
                }
                None => {
                    let parameters = self.anonymous_model(&ctx, None);
                    self.types.get_mut(parameters).finished = true;
                    (parameters, self.types.void_type)
                }
            },
        };
        if let Some(op) = self.types.operation_mut(id) {
            op.parameters = parameters;
            op.return_type = return_type;
        }
        self.finish_type(&ctx, id, inherited, node.decorators);
        id
    }

    /// `op a is b`: the operation whose signature is reused.
    fn check_operation_reference(
        &mut self,
        ctx: &CheckContext,
        id: TypeId,
        reference: &'a TypeReference<'a>,
    ) -> Option<TypeId> {
        if self.op_coloring.enter(id) != Visit::Entered {
            return None;
        }
        let target = self.check_type_reference(ctx, reference).as_type().unwrap_or(self.types.error_type);
        let result = if self.types.is_error(target) || self.types.template_parameter(target).is_some() {
            None
        } else if self.types.operation(target).is_none() {
            self.report(ctx.scope.file, reference.data.range, &messages::IS_OPERATION, &[]);
            None
        } else if self.op_coloring.is_in_progress(&target) {
            let name = type_name(&self.types, target);
            debug!(target: "tspec::checker", operation = %name, "circular operation signature");
            self.report(ctx.scope.file, reference.data.range, &messages::CIRCULAR_OP_SIGNATURE, &[name.as_str()]);
            None
        } else {
            Some(target)
        };
        self.op_coloring.leave(id);
        result
    }
}
