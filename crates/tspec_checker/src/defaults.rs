//! Property defaults and `const` declarations.

use crate::checker::{CheckContext, Checker};
use crate::cycles::Visit;
use crate::names::type_name;
use crate::types::*;
use tracing::debug;
use tspec_ast::node::*;
use tspec_ast::types::SourceFileId;
use tspec_binder::SymbolId;
use tspec_diagnostics::messages;

impl<'a> Checker<'a> {
    /// Check the default of a property declared with type `declared`. The
    /// default must be a value assignable to that type.
    pub(crate) fn check_default(&mut self, ctx: &CheckContext, declared: TypeId, expr: Expression<'a>) -> Option<ValueId> {
        if self.types.is_error(declared) {
            return None;
        }
        let target = match self.types.template_parameter(declared) {
            Some(param) => match param.constraint {
                Some(constraint) => constraint.value_type.or(constraint.type_id)?,
                None => self.types.unknown_type,
            },
            None => declared,
        };
        let range = expr.range();
        let value = match expr {
            Expression::ObjectLiteral(_) | Expression::ArrayLiteral(_) | Expression::Call(_) => {
                self.check_value_expression(ctx, expr, Some(target))?
            }
            _ => {
                let entity = self.check_expression(ctx, expr);
                if let Some(constraint) = entity.as_type().and_then(|t| self.deferred_value_constraint(t)) {
                    if !self.is_assignable(constraint, target) {
                        let source = type_name(&self.types, constraint);
                        let target = type_name(&self.types, target);
                        self.report(ctx.scope.file, range, &messages::UNASSIGNABLE, &[source.as_str(), target.as_str()]);
                    }
                    return None;
                }
                self.entity_to_value(ctx, entity, Some(target), range)?
            }
        };
        match self.check_value_assignable(value, target) {
            Ok(()) => Some(value),
            Err(mismatch) => {
                self.report_mismatch(ctx.scope.file, range, mismatch);
                None
            }
        }
    }

    /// `const name: Type = value;`. The value is checked against the type
    /// annotation when there is one.
    pub(crate) fn check_const(&mut self, sym: SymbolId, node: &'a ConstStatement<'a>) -> Entity {
        if let Some(entity) = self.declared.get(&sym) {
            return *entity;
        }
        let error = Entity::Type(self.types.error_type);
        match self.const_coloring.enter(sym) {
            Visit::Entered => {}
            Visit::Cycle => {
                let file = self.binder.symbol(sym).file.unwrap_or(SourceFileId(0));
                debug!(target: "tspec::checker", name = node.id.text_name, "circular const");
                self.report(file, node.id.data.range, &messages::CIRCULAR_CONST, &[node.id.text_name]);
                return error;
            }
            Visit::Done => return self.declared.get(&sym).copied().unwrap_or(error),
        }

        let ctx = self.declaration_context(sym, None);
        let declared = node.type_annotation.map(|t| self.check_type_expression(&ctx, t));
        let mut value = self.check_value_expression(&ctx, node.value, declared);
        if let (Some(v), Some(t)) = (value, declared) {
            if !self.types.is_error(t) {
                if let Err(mismatch) = self.check_value_assignable(v, t) {
                    self.report_mismatch(ctx.scope.file, node.value.range(), mismatch);
                    value = None;
                }
            }
        }
        self.const_coloring.leave(sym);

        let entity = value.map(Entity::Value).unwrap_or(error);
        self.declared.insert(sym, entity);
        entity
    }
}
