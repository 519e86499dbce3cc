//! tspec_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Every user-facing problem found while scanning, parsing, binding, or
//! checking is a [`Diagnostic`] appended to a [`DiagnosticCollection`]. No
//! stage aborts on a recoverable problem; the record shape serializes to
//! `{ code, message, severity, target: { file, pos, end } }` for tooling.

use serde::Serialize;
use std::fmt;
use tspec_core::text::TextRange;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message template with a code and severity.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticMessage {
    /// Stable kebab-case code, e.g. `circular-base-type`.
    pub code: &'static str,
    pub severity: Severity,
    /// The message template. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// Where in the sources a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticTarget {
    pub file: String,
    pub pos: u32,
    pub end: u32,
}

impl DiagnosticTarget {
    pub fn new(file: impl Into<String>, range: TextRange) -> Self {
        Self {
            file: file.into(),
            pos: range.pos,
            end: range.end,
        }
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(self.pos, self.end)
    }
}

/// A realized diagnostic with resolved message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<DiagnosticTarget>,
}

impl Diagnostic {
    /// A diagnostic that is not attached to any source location.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            code: message.code,
            message: format_message(message.message, args),
            severity: message.severity,
            target: None,
        }
    }

    pub fn with_target(target: DiagnosticTarget, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            target: Some(target),
            ..Self::new(message, args)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref target) = self.target {
            write!(f, "{}:{} - ", target.file, target.pos)?;
        }
        write!(f, "{} {}: {}", self.severity, self.code, self.message)
    }
}

/// Format a message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Append-only sink of diagnostics for one compilation.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Drop diagnostics recorded after the first `len`. Used when the
    /// scanner rewinds a speculative lookahead.
    pub fn truncate(&mut self, len: usize) {
        self.diagnostics.truncate(len);
    }

    /// Promote every warning to an error.
    pub fn escalate_warnings(&mut self) {
        for diagnostic in &mut self.diagnostics {
            diagnostic.severity = Severity::Error;
        }
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, severity: Severity::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, severity: Severity::Warning, message: $msg }
        };
    }

    // ========================================================================
    // Scanner errors
    // ========================================================================
    pub const UNTERMINATED_STRING: DiagnosticMessage = diag!("unterminated", Error, "Unterminated string literal.");
    pub const UNTERMINATED_COMMENT: DiagnosticMessage = diag!("unterminated", Error, "Unterminated multi-line comment.");
    pub const INVALID_CHARACTER: DiagnosticMessage = diag!("invalid-character", Error, "Invalid character.");
    pub const DIGIT_EXPECTED: DiagnosticMessage = diag!("digit-expected", Error, "Digit expected.");
    pub const HEX_DIGIT_EXPECTED: DiagnosticMessage = diag!("hex-digit-expected", Error, "Hexadecimal digit expected.");
    pub const BINARY_DIGIT_EXPECTED: DiagnosticMessage = diag!("binary-digit-expected", Error, "Binary digit expected.");
    pub const INVALID_ESCAPE: DiagnosticMessage = diag!("invalid-escape-sequence", Error, "Invalid escape sequence.");

    // ========================================================================
    // Parser errors
    // ========================================================================
    pub const TOKEN_EXPECTED: DiagnosticMessage = diag!("token-expected", Error, "'{0}' expected.");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!("token-expected", Error, "Identifier expected.");
    pub const EXPRESSION_EXPECTED: DiagnosticMessage = diag!("token-expected", Error, "Expression expected.");
    pub const STATEMENT_EXPECTED: DiagnosticMessage = diag!("token-expected", Error, "Statement expected.");
    pub const PROPERTY_EXPECTED: DiagnosticMessage = diag!("token-expected", Error, "Property expected.");
    pub const UNEXPECTED_TOKEN: DiagnosticMessage = diag!("unexpected-token", Error, "Unexpected token {0}");
    pub const NESTING_TOO_DEEP: DiagnosticMessage = diag!("nesting-too-deep", Error, "Expression is nested too deeply.");
    pub const IMPORT_FIRST: DiagnosticMessage = diag!("import-first", Error, "Imports must come prior to namespaces or other declarations.");
    pub const BLOCKLESS_NAMESPACE_FIRST: DiagnosticMessage = diag!("blockless-namespace-first", Error, "Blockless namespaces can't follow other declarations.");
    pub const MULTIPLE_BLOCKLESS_NAMESPACE: DiagnosticMessage = diag!("multiple-blockless-namespace", Error, "Cannot use multiple blockless namespaces.");

    // ========================================================================
    // Binding errors
    // ========================================================================
    pub const DUPLICATE_SYMBOL: DiagnosticMessage = diag!("duplicate-symbol", Error, "Duplicate name: \"{0}\"");
    pub const INVALID_REF: DiagnosticMessage = diag!("invalid-ref", Error, "Unknown identifier {0}");
    pub const INVALID_REF_MEMBER: DiagnosticMessage = diag!("invalid-ref", Error, "{0} doesn't have member {1}");
    pub const INVALID_REF_DECORATOR: DiagnosticMessage = diag!("invalid-ref", Error, "Unknown decorator @{0}");
    pub const INVALID_REF_NAMESPACE: DiagnosticMessage = diag!("invalid-ref", Error, "Unknown namespace {0}");
    pub const AMBIGUOUS_SYMBOL: DiagnosticMessage = diag!("ambiguous-symbol", Error, "\"{0}\" is an ambiguous name between {1}. Try using fully qualified name instead: {2}");
    pub const USING_INVALID_REF: DiagnosticMessage = diag!("using-invalid-ref", Error, "Using must refer to a namespace");

    // ========================================================================
    // Value / type duality
    // ========================================================================
    pub const EXPECT_VALUE: DiagnosticMessage = diag!("expect-value", Error, "{0} refers to a type, but is being used as a value here.");
    pub const VALUE_IN_TYPE: DiagnosticMessage = diag!("value-in-type", Error, "A value cannot be used as a type.");
    pub const AMBIGUOUS_SCALAR_TYPE: DiagnosticMessage = diag!("ambiguous-scalar-type", Error, "Value {0} type is ambiguous between {1}. To resolve be explicit when instantiating this value(e.g. '{2}({0})').");
    pub const MIXED_STRING_TEMPLATE: DiagnosticMessage = diag!("mixed-string-template", Error, "String template is interpolating values and types. It must be either all values to produce a string value or or all types for string template type.");
    pub const NON_CALLABLE: DiagnosticMessage = diag!("non-callable", Error, "Type {0} is not callable.");
    pub const INVALID_ARGUMENT_KIND: DiagnosticMessage = diag!("invalid-argument", Error, "Expected a single argument of type {0} but got {1}.");

    // ========================================================================
    // Assignability
    // ========================================================================
    pub const UNASSIGNABLE: DiagnosticMessage = diag!("unassignable", Error, "Type '{0}' is not assignable to type '{1}'");
    pub const MISSING_PROPERTY: DiagnosticMessage = diag!("missing-property", Error, "Property '{0}' is missing on type '{1}' but required in '{2}'");
    pub const UNEXPECTED_PROPERTY: DiagnosticMessage = diag!("unexpected-property", Error, "Object value may only specify known properties, and '{0}' does not exist in type '{1}'.");

    // ========================================================================
    // Templates
    // ========================================================================
    pub const TOO_MANY_TEMPLATE_ARGS: DiagnosticMessage = diag!("invalid-template-args", Error, "Too many template arguments.");
    pub const TEMPLATE_ARG_REQUIRED: DiagnosticMessage = diag!("invalid-template-args", Error, "Template argument '{0}' is required and not specified.");
    pub const NOT_A_TEMPLATE: DiagnosticMessage = diag!("invalid-template-args", Error, "Can't pass template arguments to non-templated type");
    pub const UNKNOWN_TEMPLATE_ARG: DiagnosticMessage = diag!("invalid-template-args", Error, "No parameter named '{0}' exists in the target template.");
    pub const INVALID_TEMPLATE_ARGUMENT: DiagnosticMessage = diag!("invalid-argument", Error, "Argument of type '{0}' is not assignable to parameter of type '{1}'");

    // ========================================================================
    // Heritage
    // ========================================================================
    pub const DUPLICATE_PROPERTY: DiagnosticMessage = diag!("duplicate-property", Error, "Model already has a property named {0}");
    pub const OVERRIDE_PROPERTY_TYPE: DiagnosticMessage = diag!("override-property-mismatch", Error, "Model has an inherited property named {0} of type {1} which cannot override type {2}");
    pub const OVERRIDE_PROPERTY_OPTIONAL: DiagnosticMessage = diag!("override-property-mismatch", Error, "Model has a required inherited property named {0} which cannot be overridden as optional");
    pub const EXTEND_MODEL: DiagnosticMessage = diag!("extend-model", Error, "Models must extend other models.");
    pub const EXTEND_MODEL_EXPRESSION: DiagnosticMessage = diag!("extend-model", Error, "Models cannot extend model expressions.");
    pub const IS_MODEL: DiagnosticMessage = diag!("is-model", Error, "Model `is` must specify another model.");
    pub const IS_MODEL_EXPRESSION: DiagnosticMessage = diag!("is-model", Error, "Model `is` cannot specify a model expression.");
    pub const NO_ARRAY_PROPERTIES: DiagnosticMessage = diag!("no-array-properties", Error, "Array models cannot have any properties.");
    pub const SPREAD_MODEL: DiagnosticMessage = diag!("spread-model", Error, "Cannot spread properties of non-model type.");
    pub const SPREAD_MODEL_SELF: DiagnosticMessage = diag!("spread-model", Error, "Cannot spread type within its own declaration.");
    pub const INTERSECT_NON_MODEL: DiagnosticMessage = diag!("intersect-non-model", Error, "Cannot intersect non-model types (including union types).");
    pub const INTERSECT_DUPLICATE_PROPERTY: DiagnosticMessage = diag!("intersect-duplicate-property", Error, "Intersection contains duplicate property definitions for {0}");
    pub const CIRCULAR_BASE_TYPE: DiagnosticMessage = diag!("circular-base-type", Error, "Type '{0}' recursively references itself as a base type.");
    pub const CIRCULAR_PROP: DiagnosticMessage = diag!("circular-prop", Error, "Property '{0}' recursively references itself.");
    pub const CIRCULAR_ALIAS: DiagnosticMessage = diag!("circular-alias-type", Error, "Alias type '{0}' recursively references itself.");
    pub const CIRCULAR_OP_SIGNATURE: DiagnosticMessage = diag!("circular-op-signature", Error, "Operation '{0}' recursively references itself.");
    pub const CIRCULAR_CONST: DiagnosticMessage = diag!("circular-const", Error, "const '{0}' recursively references itself.");
    pub const EXTEND_SCALAR: DiagnosticMessage = diag!("extend-scalar", Error, "Scalar must extend other scalars.");
    pub const ENUM_MEMBER_DUPLICATE: DiagnosticMessage = diag!("enum-member-duplicate", Error, "Enum already has a member named {0}");
    pub const SPREAD_ENUM: DiagnosticMessage = diag!("spread-enum", Error, "Cannot spread members of non-enum type.");
    pub const UNION_DUPLICATE: DiagnosticMessage = diag!("union-duplicate", Error, "Union already has a variant named {0}");
    pub const INTERFACE_DUPLICATE: DiagnosticMessage = diag!("interface-duplicate", Error, "Interface already has a member named {0}");
    pub const EXTENDS_INTERFACE: DiagnosticMessage = diag!("extends-interface", Error, "Interfaces can only extend other interfaces");
    pub const IS_OPERATION: DiagnosticMessage = diag!("is-operation", Error, "Operation can only reuse the signature of another operation.");

    // ========================================================================
    // Decorators
    // ========================================================================
    pub const INVALID_DECORATOR: DiagnosticMessage = diag!("invalid-decorator", Error, "{0} is not a decorator");
    pub const DECORATOR_WRONG_TARGET: DiagnosticMessage = diag!("decorator-wrong-target", Error, "Cannot apply @{0} decorator to {1} since it is not assignable to {2}");
    pub const INVALID_ARGUMENT_COUNT: DiagnosticMessage = diag!("invalid-argument-count", Error, "Expected {0} arguments, but got {1}.");
    pub const INVALID_ARGUMENT_COUNT_AT_LEAST: DiagnosticMessage = diag!("invalid-argument-count", Error, "Expected at least {0} arguments, but got {1}.");
    pub const INVALID_ARGUMENT: DiagnosticMessage = diag!("invalid-argument", Error, "Argument of type '{0}' is not assignable to parameter of type '{1}'");
    pub const DECORATOR_MISSING_IMPLEMENTATION: DiagnosticMessage = diag!("missing-implementation", Warning, "Extern declaration must have an implementation in JS file.");

    // ========================================================================
    // Compilation host errors
    // ========================================================================
    pub const ENTRY_NOT_FOUND: DiagnosticMessage = diag!("entry-not-found", Error, "Entry file '{0}' was not found.");
    pub const FILE_NOT_FOUND: DiagnosticMessage = diag!("file-not-found", Error, "File {0} not found.");
    pub const IMPORT_NOT_FOUND: DiagnosticMessage = diag!("import-not-found", Error, "Couldn't resolve import \"{0}\"");
    pub const MODULE_IMPORT_FAILED: DiagnosticMessage = diag!("internal-error", Error, "Failed to load module \"{0}\": {1}");
    pub const INTERNAL_ERROR: DiagnosticMessage = diag!("internal-error", Error, "Internal compiler error: {0}");
}
