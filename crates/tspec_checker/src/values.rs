//! Values: literals used as values, object and array literals, scalar
//! constructor calls and string templates.

use crate::assignability::Mismatch;
use crate::checker::{CheckContext, Checker, NameTarget};
use crate::names::{entity_name, type_name};
use crate::types::*;
use crate::types::StringTemplateSpan;
use indexmap::IndexMap;
use tspec_ast::node::*;
use tspec_core::text::TextRange;
use tspec_diagnostics::{messages, DiagnosticMessage};

/// How a type converts to a value.
enum Conversion {
    EnumMember(TypeId),
    Literal(TypeId),
    /// A union variant wrapping an enum member.
    Variant(TypeId),
    Null,
    /// A parameter whose value is only known per instance.
    Deferred,
    NotAValue,
}

const MAX_SCALAR_SEARCH_DEPTH: u32 = 8;

impl<'a> Checker<'a> {
    /// Check an argument to a template or decorator against the parameter's
    /// constraint. Literals become values where the constraint accepts
    /// values, and stay types otherwise.
    pub(crate) fn check_argument(
        &mut self,
        ctx: &CheckContext,
        expr: Expression<'a>,
        constraint: Option<MixedConstraint>,
        message: &DiagnosticMessage,
    ) -> Entity {
        let Some(constraint) = constraint else {
            return self.check_expression(ctx, expr);
        };
        let range = expr.range();
        let error = Entity::Type(self.types.error_type);

        let raw = match expr {
            Expression::ObjectLiteral(_) | Expression::ArrayLiteral(_) | Expression::Call(_) => {
                match self.check_value_expression(ctx, expr, constraint.value_type) {
                    Some(value) => Entity::Value(value),
                    None => return error,
                }
            }
            _ => self.check_expression(ctx, expr),
        };
        if let Some(t) = raw.as_type() {
            if self.types.is_error(t) || self.is_unmapped_parameter(ctx, t) {
                return raw;
            }
        }

        if let Some(value_type) = constraint.value_type {
            let as_value = match raw {
                Entity::Value(_) | Entity::Indeterminate(_) => true,
                Entity::Type(_) => constraint.type_id.is_none(),
            };
            if as_value {
                return match self.entity_to_value(ctx, raw, Some(value_type), range) {
                    Some(value) => self.accept_value(ctx, value, value_type, range, message),
                    None => error,
                };
            }
        }

        let t = match raw {
            Entity::Value(_) => {
                self.report(ctx.scope.file, range, &messages::VALUE_IN_TYPE, &[]);
                return error;
            }
            Entity::Type(t) | Entity::Indeterminate(t) => t,
        };
        if let Some(type_id) = constraint.type_id {
            if !self.is_assignable(t, type_id) {
                let source = type_name(&self.types, t);
                let target = type_name(&self.types, type_id);
                self.report(ctx.scope.file, range, message, &[source.as_str(), target.as_str()]);
                return error;
            }
        }
        raw
    }

    /// A template parameter reference left unmapped in the current context.
    fn is_unmapped_parameter(&self, ctx: &CheckContext, id: TypeId) -> bool {
        self.types.template_parameter(id).is_some() && ctx.mapper.as_ref().and_then(|m| m.get(id)).is_none()
    }

    fn accept_value(
        &mut self,
        ctx: &CheckContext,
        value: ValueId,
        value_type: TypeId,
        range: TextRange,
        message: &DiagnosticMessage,
    ) -> Entity {
        match self.check_value_assignable(value, value_type) {
            Ok(()) => Entity::Value(value),
            Err(Mismatch::Unassignable { source, target }) => {
                self.report(ctx.scope.file, range, message, &[source.as_str(), target.as_str()]);
                Entity::Type(self.types.error_type)
            }
            Err(mismatch) => {
                self.report_mismatch(ctx.scope.file, range, mismatch);
                Entity::Type(self.types.error_type)
            }
        }
    }

    /// Check an expression in a position that requires a value.
    pub(crate) fn check_value_expression(
        &mut self,
        ctx: &CheckContext,
        expr: Expression<'a>,
        expected: Option<TypeId>,
    ) -> Option<ValueId> {
        match expr {
            Expression::ObjectLiteral(node) => self.check_object_literal(ctx, node, expected),
            Expression::ArrayLiteral(node) => self.check_array_literal(ctx, node, expected),
            Expression::Call(node) => self.check_call(ctx, node),
            _ => {
                let entity = self.check_expression(ctx, expr);
                self.entity_to_value(ctx, entity, expected, expr.range())
            }
        }
    }

    /// Convert an entity to a value. Literals, enum members and `null`
    /// convert; other types report that a value was expected.
    pub(crate) fn entity_to_value(
        &mut self,
        ctx: &CheckContext,
        entity: Entity,
        expected: Option<TypeId>,
        range: TextRange,
    ) -> Option<ValueId> {
        let t = match entity {
            Entity::Value(value) => return Some(value),
            Entity::Indeterminate(t) => return self.literal_to_value(ctx, t, expected, range),
            Entity::Type(t) => t,
        };
        if self.types.is_error(t) {
            return None;
        }
        let conversion = match &self.types.get(t).kind {
            TypeKind::EnumMember(member) => Conversion::EnumMember(member.enum_type),
            TypeKind::UnionVariant(variant) => match &self.types.get(variant.type_id).kind {
                TypeKind::String(_) | TypeKind::Number(_) | TypeKind::Boolean(_) => Conversion::Literal(variant.type_id),
                TypeKind::EnumMember(_) => Conversion::Variant(variant.type_id),
                _ => Conversion::NotAValue,
            },
            TypeKind::String(_) | TypeKind::Number(_) | TypeKind::Boolean(_) => Conversion::Literal(t),
            TypeKind::StringTemplate(template) if template.string_value.is_some() => Conversion::Literal(t),
            TypeKind::Intrinsic(IntrinsicName::Null) => Conversion::Null,
            TypeKind::TemplateParameter(param) if param.constraint.is_some_and(|c| c.accepts_values()) => {
                Conversion::Deferred
            }
            _ => Conversion::NotAValue,
        };
        match conversion {
            Conversion::EnumMember(enum_type) => Some(self.types.add_value(ValueKind::EnumMember(t), enum_type, None)),
            Conversion::Literal(literal) => self.literal_to_value(ctx, literal, expected, range),
            Conversion::Variant(member) => self.entity_to_value(ctx, Entity::Type(member), expected, range),
            Conversion::Null => Some(self.types.add_value(ValueKind::Null, self.types.null_type, None)),
            Conversion::Deferred => None,
            Conversion::NotAValue => {
                let name = type_name(&self.types, t);
                self.report(ctx.scope.file, range, &messages::EXPECT_VALUE, &[name.as_str()]);
                None
            }
        }
    }

    /// A literal type used as a value. The value's type is the scalar the
    /// expected type implies, or the literal type when none does.
    fn literal_to_value(
        &mut self,
        ctx: &CheckContext,
        literal: TypeId,
        expected: Option<TypeId>,
        range: TextRange,
    ) -> Option<ValueId> {
        let (kind, literal) = match &self.types.get(literal).kind {
            TypeKind::String(s) => (ValueKind::String(s.clone()), literal),
            TypeKind::Number(n) => (ValueKind::Numeric(n.clone()), literal),
            TypeKind::Boolean(b) => (ValueKind::Boolean(*b), literal),
            TypeKind::StringTemplate(StringTemplateType {
                string_value: Some(s), ..
            }) => {
                let s = s.clone();
                let literal = self.types.string_literal(&s);
                (ValueKind::String(s), literal)
            }
            _ => return None,
        };
        let scalar = expected.and_then(|e| self.infer_scalar(ctx, literal, e, range));
        Some(self.types.add_value(kind, scalar.unwrap_or(literal), scalar))
    }

    /// The scalar among those `expected` allows that a literal belongs to.
    /// Reports when several scalars fit.
    fn infer_scalar(&mut self, ctx: &CheckContext, literal: TypeId, expected: TypeId, range: TextRange) -> Option<TypeId> {
        let mut candidates = Vec::new();
        self.collect_scalars(expected, &mut candidates, 0);
        let mut fitting: Vec<TypeId> = Vec::new();
        for candidate in candidates {
            if !fitting.contains(&candidate) && self.is_assignable(literal, candidate) {
                fitting.push(candidate);
            }
        }
        match fitting.as_slice() {
            [] => None,
            [scalar] => Some(*scalar),
            [first, ..] => {
                let value = type_name(&self.types, literal);
                let names: Vec<String> = fitting.iter().map(|s| type_name(&self.types, *s)).collect();
                let joined = names.join(", ");
                let first = type_name(&self.types, *first);
                self.report(
                    ctx.scope.file,
                    range,
                    &messages::AMBIGUOUS_SCALAR_TYPE,
                    &[value.as_str(), joined.as_str(), first.as_str()],
                );
                None
            }
        }
    }

    fn collect_scalars(&self, id: TypeId, out: &mut Vec<TypeId>, depth: u32) {
        if depth > MAX_SCALAR_SEARCH_DEPTH {
            return;
        }
        match &self.types.get(id).kind {
            TypeKind::Scalar(_) => out.push(id),
            TypeKind::Union(union) => {
                for variant in &union.variants {
                    self.collect_scalars(*variant, out, depth + 1);
                }
            }
            TypeKind::UnionVariant(variant) => self.collect_scalars(variant.type_id, out, depth + 1),
            TypeKind::TemplateParameter(param) => {
                if let Some(constraint) = param.constraint {
                    for t in constraint.value_type.into_iter().chain(constraint.type_id) {
                        self.collect_scalars(t, out, depth + 1);
                    }
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Object and array literals
    // ========================================================================

    fn check_object_literal(
        &mut self,
        ctx: &CheckContext,
        node: &'a ObjectLiteral<'a>,
        expected: Option<TypeId>,
    ) -> Option<ValueId> {
        let mut properties = IndexMap::new();
        let mut ok = true;
        for member in node.properties.iter() {
            match *member {
                ObjectLiteralMember::Property(prop) => {
                    let expected_prop = expected.and_then(|e| self.expected_property_type(e, prop.id.text_name));
                    match self.check_value_expression(ctx, prop.value, expected_prop) {
                        Some(value) => {
                            properties.insert(prop.id.text_name.to_string(), value);
                        }
                        None => ok = false,
                    }
                }
                ObjectLiteralMember::Spread(spread) => {
                    let entity = self.check_type_reference(ctx, spread.target);
                    let source = entity.as_value().map(|v| &self.types.value(v).kind);
                    match source {
                        Some(ValueKind::Object(props)) => {
                            for (name, value) in props.clone() {
                                properties.insert(name, value);
                            }
                        }
                        _ => {
                            ok = false;
                            if entity.as_type().is_some_and(|t| self.types.is_error(t)) {
                                continue;
                            }
                            let name = entity_name(&self.types, entity);
                            self.report(ctx.scope.file, spread.data.range, &messages::EXPECT_VALUE, &[name.as_str()]);
                        }
                    }
                }
            }
        }
        if !ok {
            return None;
        }
        let type_id = expected.unwrap_or(self.types.unknown_type);
        Some(self.types.add_value(ValueKind::Object(properties), type_id, None))
    }

    fn expected_property_type(&self, expected: TypeId, name: &str) -> Option<TypeId> {
        match self.types.find_property(expected, name) {
            Some(prop) => self.types.property(prop).map(|p| p.type_id),
            None => self.types.record_element(expected),
        }
    }

    fn check_array_literal(
        &mut self,
        ctx: &CheckContext,
        node: &'a ArrayLiteral<'a>,
        expected: Option<TypeId>,
    ) -> Option<ValueId> {
        let element = expected.and_then(|e| self.types.array_element(e));
        let tuple = expected.and_then(|e| match &self.types.get(e).kind {
            TypeKind::Tuple(t) => Some(t.values.clone()),
            _ => None,
        });
        let mut items = Vec::with_capacity(node.values.len());
        let mut ok = true;
        for (index, value) in node.values.iter().enumerate() {
            let item_expected = element.or_else(|| tuple.as_ref().and_then(|t| t.get(index).copied()));
            match self.check_value_expression(ctx, *value, item_expected) {
                Some(item) => items.push(item),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }
        let type_id = expected.unwrap_or(self.types.unknown_type);
        Some(self.types.add_value(ValueKind::Array(items), type_id, None))
    }

    // ========================================================================
    // Scalar constructors
    // ========================================================================

    /// `int8(12)`: a value of an explicit scalar.
    fn check_call(&mut self, ctx: &CheckContext, node: &'a CallExpression<'a>) -> Option<ValueId> {
        let target = match self.resolve_name(ctx, node.target)? {
            NameTarget::Symbol(sym) => self.check_symbol(ctx, sym, &[], node.target.range()),
            NameTarget::Entity(entity) => entity,
        };
        let scalar = match target.as_type() {
            Some(t) if self.types.is_error(t) => return None,
            Some(t) if self.types.scalar(t).is_some() => t,
            _ => {
                let name = entity_name(&self.types, target);
                self.report(ctx.scope.file, node.target.range(), &messages::NON_CALLABLE, &[name.as_str()]);
                return None;
            }
        };
        let Some(backing) = self.types.scalar_backing(scalar) else {
            let name = type_name(&self.types, scalar);
            self.report(ctx.scope.file, node.target.range(), &messages::NON_CALLABLE, &[name.as_str()]);
            return None;
        };
        let [argument] = node.arguments else {
            let got = node.arguments.len().to_string();
            self.report(ctx.scope.file, node.data.range, &messages::INVALID_ARGUMENT_COUNT, &["1", got.as_str()]);
            return None;
        };

        let range = argument.range();
        let kind = match self.check_expression(ctx, *argument) {
            Entity::Indeterminate(t) => match &self.types.get(t).kind {
                TypeKind::String(s) => ValueKind::String(s.clone()),
                TypeKind::Number(n) => ValueKind::Numeric(n.clone()),
                TypeKind::Boolean(b) => ValueKind::Boolean(*b),
                TypeKind::StringTemplate(StringTemplateType {
                    string_value: Some(s), ..
                }) => ValueKind::String(s.clone()),
                _ => return None,
            },
            Entity::Value(v) => self.types.value(v).kind.clone(),
            Entity::Type(t) => {
                if !self.types.is_error(t) {
                    let name = type_name(&self.types, t);
                    self.report(ctx.scope.file, range, &messages::EXPECT_VALUE, &[name.as_str()]);
                }
                return None;
            }
        };

        let expected_kind = backing.value_kind_name();
        if kind.kind_name() != expected_kind {
            self.report(
                ctx.scope.file,
                range,
                &messages::INVALID_ARGUMENT_KIND,
                &[expected_kind, kind.kind_name()],
            );
            return None;
        }
        let literal = match &kind {
            ValueKind::String(s) => self.types.string_literal(s),
            ValueKind::Numeric(n) => self.types.number_literal(n.clone()),
            ValueKind::Boolean(b) => self.types.boolean_literal(*b),
            _ => return None,
        };
        if !self.is_assignable(literal, scalar) {
            let source = type_name(&self.types, literal);
            let target = type_name(&self.types, scalar);
            self.report(ctx.scope.file, range, &messages::UNASSIGNABLE, &[source.as_str(), target.as_str()]);
            return None;
        }
        Some(self.types.add_value(kind, scalar, Some(scalar)))
    }

    // ========================================================================
    // String templates
    // ========================================================================

    /// A string template is a string value when it interpolates values, and
    /// a template type when it interpolates types. Mixing both is an error.
    pub(crate) fn check_string_template(&mut self, ctx: &CheckContext, node: &'a StringTemplateExpression<'a>) -> Entity {
        let error = Entity::Type(self.types.error_type);
        let mut parts: Vec<(Entity, &'a str)> = Vec::with_capacity(node.spans.len());
        for span in node.spans.iter() {
            parts.push((self.check_expression(ctx, span.expression), span.literal));
        }

        let mut has_value = false;
        let mut has_type = false;
        let mut mixed = false;
        for (entity, _) in &parts {
            match *entity {
                Entity::Value(_) => has_value = true,
                Entity::Indeterminate(_) => {}
                Entity::Type(t) => match self.types.template_parameter(t).and_then(|p| p.constraint) {
                    Some(c) if c.accepts_values() && c.accepts_types() => mixed = true,
                    Some(c) if c.accepts_values() => has_value = true,
                    _ => {
                        if self.literal_text(t).is_none() && !self.types.is_error(t) {
                            has_type = true;
                        }
                    }
                },
            }
        }
        if mixed || (has_value && has_type) {
            self.report(ctx.scope.file, node.data.range, &messages::MIXED_STRING_TEMPLATE, &[]);
            return error;
        }

        if has_value {
            let mut text = node.head.to_string();
            for (entity, literal) in &parts {
                match self.span_text(*entity) {
                    Some(s) => text.push_str(&s),
                    None => return error,
                }
                text.push_str(literal);
            }
            let string = self.types.std_type("string").unwrap_or(self.types.unknown_type);
            return Entity::Value(self.types.add_value(ValueKind::String(text), string, None));
        }

        let mut spans = Vec::new();
        let mut all_literal = true;
        let mut text = node.head.to_string();
        if !node.head.is_empty() {
            spans.push(StringTemplateSpan {
                is_interpolated: false,
                type_id: self.types.string_literal(node.head),
            });
        }
        for (entity, literal) in parts {
            let t = entity.as_type().unwrap_or(self.types.error_type);
            match self.literal_text(t) {
                Some(s) => text.push_str(&s),
                None => all_literal = false,
            }
            spans.push(StringTemplateSpan {
                is_interpolated: true,
                type_id: t,
            });
            if !literal.is_empty() {
                spans.push(StringTemplateSpan {
                    is_interpolated: false,
                    type_id: self.types.string_literal(literal),
                });
                text.push_str(literal);
            }
        }
        let id = self.types.add_type(TypeKind::StringTemplate(StringTemplateType {
            spans,
            string_value: all_literal.then_some(text),
        }));
        self.init_member_type(id, Some(node.data.id), ctx);
        self.types.get_mut(id).finished = true;
        if all_literal {
            Entity::Indeterminate(id)
        } else {
            Entity::Type(id)
        }
    }

    /// Text of an interpolated value or literal.
    fn span_text(&self, entity: Entity) -> Option<String> {
        match entity {
            Entity::Value(v) => match &self.types.value(v).kind {
                ValueKind::String(s) => Some(s.clone()),
                ValueKind::Numeric(n) => Some(n.to_string()),
                ValueKind::Boolean(b) => Some(b.to_string()),
                _ => None,
            },
            Entity::Indeterminate(t) => self.literal_text(t),
            Entity::Type(_) => None,
        }
    }

    fn literal_text(&self, id: TypeId) -> Option<String> {
        match &self.types.get(id).kind {
            TypeKind::String(s) => Some(s.clone()),
            TypeKind::Number(n) => Some(n.to_string()),
            TypeKind::Boolean(b) => Some(b.to_string()),
            TypeKind::StringTemplate(t) => t.string_value.clone(),
            _ => None,
        }
    }
}
