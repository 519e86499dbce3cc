//! The tspec parser implementation.
//!
//! A recursive descent parser that pulls tokens from the scanner and builds
//! an arena-allocated syntax tree. Every node gets a [`NodeId`] unique within
//! its file; paired with the file id it identifies the node across the whole
//! compilation.

use bumpalo::Bump;
use tspec_ast::node::*;
use tspec_ast::syntax_kind::SyntaxKind;
use tspec_ast::types::*;
use tspec_core::intern::StringInterner;
use tspec_core::text::TextRange;
use tspec_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage, DiagnosticTarget};
use tspec_scanner::Scanner;

use crate::precedence::{get_binary_operator_precedence, OperatorPrecedence};
use crate::utilities::{can_start_expression, can_start_statement, is_member_name};

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// The parser produces a SourceFile syntax tree from tspec source text.
pub struct Parser<'a> {
    arena: &'a Bump,
    interner: &'a StringInterner,
    scanner: Scanner,
    file_id: SourceFileId,
    file_name: &'a str,
    source_text: &'a str,
    diagnostics: DiagnosticCollection,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
    next_node_index: u32,
    /// End of the most recently consumed token.
    last_token_end: u32,
    in_blockless_namespace: bool,
    seen_declaration: bool,
}

impl<'a> Parser<'a> {
    pub fn new(
        arena: &'a Bump,
        interner: &'a StringInterner,
        file_id: SourceFileId,
        file_name: &str,
        source_text: &str,
    ) -> Self {
        Self {
            arena,
            interner,
            scanner: Scanner::new(file_name, source_text),
            file_id,
            file_name: arena.alloc_str(file_name),
            source_text: arena.alloc_str(source_text),
            diagnostics: DiagnosticCollection::new(),
            recursion_depth: 0,
            next_node_index: 0,
            last_token_end: 0,
            in_blockless_namespace: false,
            seen_declaration: false,
        }
    }

    pub fn parse_source_file(&mut self) -> &'a SourceFile<'a> {
        self.next_token();
        let statements = self.parse_statements(true);
        let end = self.source_text.len() as u32;
        let data = self.node(SyntaxKind::SourceFile, 0, end);
        self.arena.alloc(SourceFile {
            data,
            id: self.file_id,
            file_name: self.file_name,
            text: self.source_text,
            statements,
        })
    }

    /// Parser diagnostics followed by scanner diagnostics.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        let scanner_diags = self.scanner.take_diagnostics();
        let mut diagnostics = std::mem::take(&mut self.diagnostics);
        diagnostics.extend(scanner_diags);
        diagnostics
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn current_token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    #[inline]
    fn next_token(&mut self) -> SyntaxKind {
        self.last_token_end = self.scanner.token_end() as u32;
        self.scanner.scan()
    }

    #[inline]
    fn token_pos(&self) -> u32 {
        self.scanner.token_start() as u32
    }

    #[inline]
    fn token_end(&self) -> u32 {
        self.scanner.token_end() as u32
    }

    #[inline]
    fn token_value(&self) -> &str {
        self.scanner.token_value()
    }

    fn expect_token(&mut self, kind: SyntaxKind) -> bool {
        if self.current_token() == kind {
            self.next_token();
            true
        } else {
            let text = kind.text().unwrap_or("token");
            self.error(&messages::TOKEN_EXPECTED, &[text]);
            false
        }
    }

    fn optional_token(&mut self, kind: SyntaxKind) -> bool {
        if self.current_token() == kind {
            self.next_token();
            true
        } else {
            false
        }
    }

    fn parse_expected_semicolon(&mut self) {
        self.expect_token(SyntaxKind::SemicolonToken);
    }

    /// Members may be separated by `;` or `,`.
    fn parse_member_separator(&mut self) {
        if !self.optional_token(SyntaxKind::SemicolonToken) {
            self.optional_token(SyntaxKind::CommaToken);
        }
    }

    fn error(&mut self, msg: &DiagnosticMessage, args: &[&str]) {
        let range = TextRange::new(self.token_pos(), self.token_end());
        let target = DiagnosticTarget::new(self.file_name, range);
        self.diagnostics.add(Diagnostic::with_target(target, msg, args));
    }

    fn node(&mut self, kind: SyntaxKind, pos: u32, end: u32) -> NodeData {
        let id = NodeId::new(self.file_id, self.next_node_index);
        self.next_node_index += 1;
        NodeData::new(kind, id, pos, end)
    }

    /// Node data spanning from `pos` to the end of the last consumed token.
    fn finish_node(&mut self, kind: SyntaxKind, pos: u32) -> NodeData {
        let end = self.last_token_end.max(pos);
        self.node(kind, pos, end)
    }

    fn alloc_list<T: Copy>(&self, items: Vec<T>) -> &'a [T] {
        if items.is_empty() {
            return &[];
        }
        self.arena.alloc_slice_copy(&items)
    }

    fn alloc_text(&self, text: &str) -> &'a str {
        self.arena.alloc_str(text)
    }

    // ========================================================================
    // Statement parsing
    // ========================================================================

    fn parse_statements(&mut self, top_level: bool) -> &'a [Statement<'a>] {
        let mut statements = Vec::new();
        loop {
            match self.current_token() {
                SyntaxKind::EndOfFileToken => break,
                SyntaxKind::CloseBraceToken if !top_level => break,
                SyntaxKind::CloseBraceToken => {
                    self.error(&messages::STATEMENT_EXPECTED, &[]);
                    self.next_token();
                    continue;
                }
                _ => {}
            }
            let saved_pos = self.scanner.token_start();
            let stmt = self.parse_statement();
            statements.push(stmt);

            // Error recovery: if the parser hasn't advanced, skip forward to
            // the next statement-starting token to avoid infinite loops.
            if self.scanner.token_start() == saved_pos {
                self.next_token();
                self.skip_to_next_statement();
            }
        }
        self.alloc_list(statements)
    }

    /// Error recovery: skip tokens until we find one that can start a new statement.
    fn skip_to_next_statement(&mut self) {
        while self.current_token() != SyntaxKind::EndOfFileToken {
            if can_start_statement(self.current_token()) || self.current_token() == SyntaxKind::CloseBraceToken {
                return;
            }
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> Statement<'a> {
        let pos = self.token_pos();
        let decorators = self.parse_decorator_list();
        let kind = self.current_token();

        match kind {
            SyntaxKind::ImportKeyword | SyntaxKind::UsingKeyword => {}
            SyntaxKind::NamespaceKeyword | SyntaxKind::SemicolonToken => {}
            _ => self.seen_declaration = true,
        }

        if !decorators.is_empty()
            && !matches!(
                kind,
                SyntaxKind::NamespaceKeyword
                    | SyntaxKind::ModelKeyword
                    | SyntaxKind::ScalarKeyword
                    | SyntaxKind::EnumKeyword
                    | SyntaxKind::UnionKeyword
                    | SyntaxKind::InterfaceKeyword
                    | SyntaxKind::OpKeyword
            )
        {
            let text = self.token_value().to_string();
            self.error(&messages::UNEXPECTED_TOKEN, &[&text]);
        }

        match kind {
            SyntaxKind::SemicolonToken => {
                self.next_token();
                let data = self.finish_node(SyntaxKind::EmptyStatement, pos);
                Statement::Empty(self.arena.alloc(data))
            }
            SyntaxKind::ImportKeyword => self.parse_import_statement(pos),
            SyntaxKind::UsingKeyword => self.parse_using_statement(pos),
            SyntaxKind::NamespaceKeyword => self.parse_namespace_statement(pos, decorators),
            SyntaxKind::ModelKeyword => self.parse_model_statement(pos, decorators),
            SyntaxKind::ScalarKeyword => self.parse_scalar_statement(pos, decorators),
            SyntaxKind::EnumKeyword => self.parse_enum_statement(pos, decorators),
            SyntaxKind::UnionKeyword => self.parse_union_statement(pos, decorators),
            SyntaxKind::InterfaceKeyword => self.parse_interface_statement(pos, decorators),
            SyntaxKind::OpKeyword => {
                self.next_token();
                let op = self.parse_operation(pos, decorators);
                self.parse_expected_semicolon();
                Statement::Operation(op)
            }
            SyntaxKind::AliasKeyword => self.parse_alias_statement(pos),
            SyntaxKind::ConstKeyword => self.parse_const_statement(pos),
            SyntaxKind::ExternKeyword | SyntaxKind::DecKeyword => self.parse_decorator_declaration(pos),
            SyntaxKind::AtAtToken => self.parse_augment_decorator(pos),
            _ => {
                self.error(&messages::STATEMENT_EXPECTED, &[]);
                let data = self.node(SyntaxKind::InvalidStatement, pos, self.token_end());
                Statement::Invalid(self.arena.alloc(data))
            }
        }
    }

    fn parse_import_statement(&mut self, pos: u32) -> Statement<'a> {
        if self.seen_declaration {
            self.error(&messages::IMPORT_FIRST, &[]);
        }
        self.next_token();
        let path = self.parse_string_literal();
        self.parse_expected_semicolon();
        let data = self.finish_node(SyntaxKind::ImportStatement, pos);
        Statement::Import(self.arena.alloc(ImportStatement { data, path }))
    }

    fn parse_using_statement(&mut self, pos: u32) -> Statement<'a> {
        self.next_token();
        let name = self.parse_name_path();
        self.parse_expected_semicolon();
        let data = self.finish_node(SyntaxKind::UsingStatement, pos);
        Statement::Using(self.arena.alloc(UsingStatement { data, name }))
    }

    fn parse_namespace_statement(
        &mut self,
        pos: u32,
        decorators: &'a [&'a DecoratorExpression<'a>],
    ) -> Statement<'a> {
        self.next_token();
        let mut path = vec![self.parse_identifier()];
        while self.optional_token(SyntaxKind::DotToken) {
            path.push(self.parse_identifier());
        }
        let path = self.alloc_list(path);

        let (statements, blockless) = if self.optional_token(SyntaxKind::SemicolonToken) {
            if self.in_blockless_namespace {
                self.error(&messages::MULTIPLE_BLOCKLESS_NAMESPACE, &[]);
            } else if self.seen_declaration {
                self.error(&messages::BLOCKLESS_NAMESPACE_FIRST, &[]);
            }
            self.in_blockless_namespace = true;
            (self.parse_statements(true), true)
        } else {
            self.expect_token(SyntaxKind::OpenBraceToken);
            let statements = self.parse_statements(false);
            self.expect_token(SyntaxKind::CloseBraceToken);
            (statements, false)
        };
        self.seen_declaration = true;

        let data = self.finish_node(SyntaxKind::NamespaceStatement, pos);
        Statement::Namespace(self.arena.alloc(NamespaceStatement {
            data,
            path,
            decorators,
            statements,
            blockless,
        }))
    }

    fn parse_model_statement(
        &mut self,
        pos: u32,
        decorators: &'a [&'a DecoratorExpression<'a>],
    ) -> Statement<'a> {
        self.next_token();
        let id = self.parse_identifier();
        let template_parameters = self.parse_template_parameters();
        let extends = if self.optional_token(SyntaxKind::ExtendsKeyword) {
            Some(self.parse_expression())
        } else {
            None
        };
        let is = if self.optional_token(SyntaxKind::IsKeyword) {
            Some(self.parse_expression())
        } else {
            None
        };

        let properties = if is.is_some() && self.optional_token(SyntaxKind::SemicolonToken) {
            &[][..]
        } else {
            self.expect_token(SyntaxKind::OpenBraceToken);
            let properties = self.parse_model_members(SyntaxKind::CloseBraceToken);
            self.expect_token(SyntaxKind::CloseBraceToken);
            properties
        };

        let data = self.finish_node(SyntaxKind::ModelStatement, pos);
        Statement::Model(self.arena.alloc(ModelStatement {
            data,
            id,
            template_parameters,
            decorators,
            extends,
            is,
            properties,
        }))
    }

    /// Properties and spreads up to (not including) `close`.
    fn parse_model_members(&mut self, close: SyntaxKind) -> &'a [ModelMember<'a>] {
        let mut members = Vec::new();
        while self.current_token() != close && self.current_token() != SyntaxKind::EndOfFileToken {
            let saved_pos = self.scanner.token_start();
            let pos = self.token_pos();
            if self.optional_token(SyntaxKind::DotDotDotToken) {
                let target = self.parse_type_reference();
                let data = self.finish_node(SyntaxKind::ModelSpreadProperty, pos);
                members.push(ModelMember::Spread(self.arena.alloc(ModelSpreadProperty { data, target })));
            } else {
                let decorators = self.parse_decorator_list();
                let id = self.parse_member_name();
                let optional = self.optional_token(SyntaxKind::QuestionToken);
                self.expect_token(SyntaxKind::ColonToken);
                let value = self.parse_expression();
                let default = if self.optional_token(SyntaxKind::EqualsToken) {
                    Some(self.parse_expression())
                } else {
                    None
                };
                let data = self.finish_node(SyntaxKind::ModelProperty, pos);
                members.push(ModelMember::Property(self.arena.alloc(ModelProperty {
                    data,
                    id,
                    value,
                    optional,
                    default,
                    decorators,
                })));
            }
            self.parse_member_separator();
            if self.scanner.token_start() == saved_pos {
                self.error(&messages::PROPERTY_EXPECTED, &[]);
                self.next_token();
            }
        }
        self.alloc_list(members)
    }

    fn parse_scalar_statement(
        &mut self,
        pos: u32,
        decorators: &'a [&'a DecoratorExpression<'a>],
    ) -> Statement<'a> {
        self.next_token();
        let id = self.parse_identifier();
        let template_parameters = self.parse_template_parameters();
        let extends = if self.optional_token(SyntaxKind::ExtendsKeyword) {
            Some(self.parse_type_reference())
        } else {
            None
        };
        if self.optional_token(SyntaxKind::OpenBraceToken) {
            self.expect_token(SyntaxKind::CloseBraceToken);
        } else {
            self.parse_expected_semicolon();
        }
        let data = self.finish_node(SyntaxKind::ScalarStatement, pos);
        Statement::Scalar(self.arena.alloc(ScalarStatement {
            data,
            id,
            template_parameters,
            decorators,
            extends,
        }))
    }

    fn parse_enum_statement(
        &mut self,
        pos: u32,
        decorators: &'a [&'a DecoratorExpression<'a>],
    ) -> Statement<'a> {
        self.next_token();
        let id = self.parse_identifier();
        self.expect_token(SyntaxKind::OpenBraceToken);
        let mut members = Vec::new();
        while !matches!(self.current_token(), SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken) {
            let saved_pos = self.scanner.token_start();
            let member_pos = self.token_pos();
            if self.optional_token(SyntaxKind::DotDotDotToken) {
                let target = self.parse_type_reference();
                let data = self.finish_node(SyntaxKind::EnumSpreadMember, member_pos);
                members.push(EnumMemberNode::Spread(self.arena.alloc(EnumSpreadMember { data, target })));
            } else {
                let decorators = self.parse_decorator_list();
                let id = self.parse_member_name();
                let value = if self.optional_token(SyntaxKind::ColonToken) {
                    Some(self.parse_expression())
                } else {
                    None
                };
                let data = self.finish_node(SyntaxKind::EnumMember, member_pos);
                members.push(EnumMemberNode::Member(self.arena.alloc(EnumMember {
                    data,
                    id,
                    value,
                    decorators,
                })));
            }
            self.parse_member_separator();
            if self.scanner.token_start() == saved_pos {
                self.error(&messages::PROPERTY_EXPECTED, &[]);
                self.next_token();
            }
        }
        self.expect_token(SyntaxKind::CloseBraceToken);
        let members = self.alloc_list(members);
        let data = self.finish_node(SyntaxKind::EnumStatement, pos);
        Statement::Enum(self.arena.alloc(EnumStatement {
            data,
            id,
            decorators,
            members,
        }))
    }

    fn parse_union_statement(
        &mut self,
        pos: u32,
        decorators: &'a [&'a DecoratorExpression<'a>],
    ) -> Statement<'a> {
        self.next_token();
        let id = self.parse_identifier();
        let template_parameters = self.parse_template_parameters();
        self.expect_token(SyntaxKind::OpenBraceToken);
        let mut variants = Vec::new();
        while !matches!(self.current_token(), SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken) {
            let saved_pos = self.scanner.token_start();
            let variant_pos = self.token_pos();
            let decorators = self.parse_decorator_list();
            let named = is_member_name(self.current_token())
                && self.scanner.look_ahead(|s| s.scan() == SyntaxKind::ColonToken);
            let id = if named {
                let id = self.parse_member_name();
                self.expect_token(SyntaxKind::ColonToken);
                Some(id)
            } else {
                None
            };
            let value = self.parse_expression();
            let data = self.finish_node(SyntaxKind::UnionVariant, variant_pos);
            variants.push(&*self.arena.alloc(UnionVariant {
                data,
                id,
                value,
                decorators,
            }));
            self.parse_member_separator();
            if self.scanner.token_start() == saved_pos {
                self.next_token();
            }
        }
        self.expect_token(SyntaxKind::CloseBraceToken);
        let variants = self.alloc_list(variants);
        let data = self.finish_node(SyntaxKind::UnionStatement, pos);
        Statement::Union(self.arena.alloc(UnionStatement {
            data,
            id,
            template_parameters,
            decorators,
            variants,
        }))
    }

    fn parse_interface_statement(
        &mut self,
        pos: u32,
        decorators: &'a [&'a DecoratorExpression<'a>],
    ) -> Statement<'a> {
        self.next_token();
        let id = self.parse_identifier();
        let template_parameters = self.parse_template_parameters();
        let mut extends = Vec::new();
        if self.optional_token(SyntaxKind::ExtendsKeyword) {
            extends.push(self.parse_type_reference());
            while self.optional_token(SyntaxKind::CommaToken) {
                extends.push(self.parse_type_reference());
            }
        }
        let extends = self.alloc_list(extends);

        self.expect_token(SyntaxKind::OpenBraceToken);
        let mut operations = Vec::new();
        while !matches!(self.current_token(), SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken) {
            let saved_pos = self.scanner.token_start();
            let op_pos = self.token_pos();
            let op_decorators = self.parse_decorator_list();
            self.optional_token(SyntaxKind::OpKeyword);
            operations.push(self.parse_operation(op_pos, op_decorators));
            self.parse_member_separator();
            if self.scanner.token_start() == saved_pos {
                self.next_token();
            }
        }
        self.expect_token(SyntaxKind::CloseBraceToken);
        let operations = self.alloc_list(operations);

        let data = self.finish_node(SyntaxKind::InterfaceStatement, pos);
        Statement::Interface(self.arena.alloc(InterfaceStatement {
            data,
            id,
            template_parameters,
            decorators,
            extends,
            operations,
        }))
    }

    /// Operation after the `op` keyword: name, template parameters and signature.
    fn parse_operation(
        &mut self,
        pos: u32,
        decorators: &'a [&'a DecoratorExpression<'a>],
    ) -> &'a OperationStatement<'a> {
        let id = self.parse_identifier();
        let template_parameters = self.parse_template_parameters();
        let signature = if self.optional_token(SyntaxKind::IsKeyword) {
            OperationSignature::Reference(self.parse_type_reference())
        } else {
            let params_pos = self.token_pos();
            self.expect_token(SyntaxKind::OpenParenToken);
            let properties = self.parse_model_members(SyntaxKind::CloseParenToken);
            self.expect_token(SyntaxKind::CloseParenToken);
            let data = self.finish_node(SyntaxKind::ModelExpression, params_pos);
            let parameters = &*self.arena.alloc(ModelExpression { data, properties });
            self.expect_token(SyntaxKind::ColonToken);
            let return_type = self.parse_expression();
            OperationSignature::Declaration { parameters, return_type }
        };
        let data = self.finish_node(SyntaxKind::OperationStatement, pos);
        self.arena.alloc(OperationStatement {
            data,
            id,
            template_parameters,
            decorators,
            signature,
        })
    }

    fn parse_alias_statement(&mut self, pos: u32) -> Statement<'a> {
        self.next_token();
        let id = self.parse_identifier();
        let template_parameters = self.parse_template_parameters();
        self.expect_token(SyntaxKind::EqualsToken);
        let value = self.parse_expression();
        self.parse_expected_semicolon();
        let data = self.finish_node(SyntaxKind::AliasStatement, pos);
        Statement::Alias(self.arena.alloc(AliasStatement {
            data,
            id,
            template_parameters,
            value,
        }))
    }

    fn parse_const_statement(&mut self, pos: u32) -> Statement<'a> {
        self.next_token();
        let id = self.parse_identifier();
        let type_annotation = if self.optional_token(SyntaxKind::ColonToken) {
            Some(self.parse_expression())
        } else {
            None
        };
        self.expect_token(SyntaxKind::EqualsToken);
        let value = self.parse_expression();
        self.parse_expected_semicolon();
        let data = self.finish_node(SyntaxKind::ConstStatement, pos);
        Statement::Const(self.arena.alloc(ConstStatement {
            data,
            id,
            type_annotation,
            value,
        }))
    }

    fn parse_decorator_declaration(&mut self, pos: u32) -> Statement<'a> {
        let mut modifiers = ModifierFlags::NONE;
        if self.optional_token(SyntaxKind::ExternKeyword) {
            modifiers |= ModifierFlags::EXTERN;
        }
        self.expect_token(SyntaxKind::DecKeyword);
        let id = self.parse_identifier();

        self.expect_token(SyntaxKind::OpenParenToken);
        let mut parameters = Vec::new();
        while !matches!(self.current_token(), SyntaxKind::CloseParenToken | SyntaxKind::EndOfFileToken) {
            let saved_pos = self.scanner.token_start();
            parameters.push(self.parse_function_parameter());
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
            if self.scanner.token_start() == saved_pos {
                break;
            }
        }
        self.expect_token(SyntaxKind::CloseParenToken);
        self.parse_expected_semicolon();

        let mut parameters = parameters.into_iter();
        let target = match parameters.next() {
            Some(target) => target,
            None => {
                self.error(&messages::IDENTIFIER_EXPECTED, &[]);
                let at = self.last_token_end;
                let missing = self.missing_identifier(at);
                let data = self.node(SyntaxKind::FunctionParameter, at, at);
                self.arena.alloc(FunctionParameter {
                    data,
                    id: missing,
                    type_annotation: None,
                    optional: false,
                    rest: false,
                })
            }
        };
        let parameters = self.alloc_list(parameters.collect());

        let data = self.finish_node(SyntaxKind::DecoratorDeclarationStatement, pos);
        Statement::DecoratorDeclaration(self.arena.alloc(DecoratorDeclarationStatement {
            data,
            modifiers,
            id,
            target,
            parameters,
        }))
    }

    fn parse_function_parameter(&mut self) -> &'a FunctionParameter<'a> {
        let pos = self.token_pos();
        let rest = self.optional_token(SyntaxKind::DotDotDotToken);
        let id = self.parse_member_name();
        let optional = self.optional_token(SyntaxKind::QuestionToken);
        let type_annotation = if self.optional_token(SyntaxKind::ColonToken) {
            Some(self.parse_expression())
        } else {
            None
        };
        let data = self.finish_node(SyntaxKind::FunctionParameter, pos);
        self.arena.alloc(FunctionParameter {
            data,
            id,
            type_annotation,
            optional,
            rest,
        })
    }

    fn parse_augment_decorator(&mut self, pos: u32) -> Statement<'a> {
        self.next_token();
        let decorator = self.parse_name_path();
        self.expect_token(SyntaxKind::OpenParenToken);
        let target = self.parse_type_reference();
        let mut arguments = Vec::new();
        while self.optional_token(SyntaxKind::CommaToken) {
            if self.current_token() == SyntaxKind::CloseParenToken {
                break;
            }
            arguments.push(self.parse_expression());
        }
        self.expect_token(SyntaxKind::CloseParenToken);
        self.parse_expected_semicolon();
        let arguments = self.alloc_list(arguments);
        let data = self.finish_node(SyntaxKind::AugmentDecoratorStatement, pos);
        Statement::AugmentDecorator(self.arena.alloc(AugmentDecoratorStatement {
            data,
            decorator,
            target,
            arguments,
        }))
    }

    // ========================================================================
    // Decorators and template parameters
    // ========================================================================

    fn parse_decorator_list(&mut self) -> &'a [&'a DecoratorExpression<'a>] {
        let mut decorators = Vec::new();
        while self.current_token() == SyntaxKind::AtToken {
            let pos = self.token_pos();
            self.next_token();
            let target = self.parse_name_path();
            let arguments = if self.current_token() == SyntaxKind::OpenParenToken {
                self.parse_argument_list()
            } else {
                &[]
            };
            let data = self.finish_node(SyntaxKind::DecoratorExpression, pos);
            decorators.push(&*self.arena.alloc(DecoratorExpression { data, target, arguments }));
        }
        self.alloc_list(decorators)
    }

    /// `( expr, expr, ... )`
    fn parse_argument_list(&mut self) -> &'a [Expression<'a>] {
        self.expect_token(SyntaxKind::OpenParenToken);
        let arguments = self.parse_expression_list(SyntaxKind::CloseParenToken);
        self.expect_token(SyntaxKind::CloseParenToken);
        arguments
    }

    /// Comma separated expressions up to (not including) `close`.
    fn parse_expression_list(&mut self, close: SyntaxKind) -> &'a [Expression<'a>] {
        let mut items = Vec::new();
        while self.current_token() != close && self.current_token() != SyntaxKind::EndOfFileToken {
            if !can_start_expression(self.current_token()) {
                self.error(&messages::EXPRESSION_EXPECTED, &[]);
                break;
            }
            items.push(self.parse_expression());
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.alloc_list(items)
    }

    fn parse_template_parameters(&mut self) -> &'a [&'a TemplateParameterDeclaration<'a>] {
        if !self.optional_token(SyntaxKind::LessThanToken) {
            return &[];
        }
        let mut parameters = Vec::new();
        while !matches!(self.current_token(), SyntaxKind::GreaterThanToken | SyntaxKind::EndOfFileToken) {
            let pos = self.token_pos();
            let saved_pos = self.scanner.token_start();
            let id = self.parse_identifier();
            let constraint = if self.optional_token(SyntaxKind::ExtendsKeyword) {
                Some(self.parse_expression())
            } else {
                None
            };
            let default = if self.optional_token(SyntaxKind::EqualsToken) {
                Some(self.parse_expression())
            } else {
                None
            };
            let data = self.finish_node(SyntaxKind::TemplateParameterDeclaration, pos);
            parameters.push(&*self.arena.alloc(TemplateParameterDeclaration {
                data,
                id,
                constraint,
                default,
            }));
            if !self.optional_token(SyntaxKind::CommaToken) || self.scanner.token_start() == saved_pos {
                break;
            }
        }
        self.expect_token(SyntaxKind::GreaterThanToken);
        self.alloc_list(parameters)
    }

    // ========================================================================
    // Names
    // ========================================================================

    fn make_identifier(&mut self, text: &str, pos: u32, end: u32) -> &'a Identifier<'a> {
        let data = self.node(SyntaxKind::Identifier, pos, end);
        let text_name = self.alloc_text(text);
        let text = self.interner.intern(text_name);
        self.arena.alloc(Identifier { data, text, text_name })
    }

    /// Placeholder for a missing name so later stages always see an identifier.
    fn missing_identifier(&mut self, pos: u32) -> &'a Identifier<'a> {
        self.make_identifier("", pos, pos)
    }

    fn parse_identifier(&mut self) -> &'a Identifier<'a> {
        if self.current_token() != SyntaxKind::Identifier {
            self.error(&messages::IDENTIFIER_EXPECTED, &[]);
            let pos = self.token_pos();
            return self.missing_identifier(pos);
        }
        let (pos, end) = (self.token_pos(), self.token_end());
        let text = self.token_value().to_string();
        self.next_token();
        self.make_identifier(&text, pos, end)
    }

    /// Property, member and parameter names: identifiers, keywords or strings.
    fn parse_member_name(&mut self) -> &'a Identifier<'a> {
        if !is_member_name(self.current_token()) {
            return self.parse_identifier();
        }
        let (pos, end) = (self.token_pos(), self.token_end());
        let text = self.token_value().to_string();
        self.next_token();
        self.make_identifier(&text, pos, end)
    }

    /// `A`, `A.B.C`, `A::b`
    fn parse_name_path(&mut self) -> NamePath<'a> {
        let pos = self.token_pos();
        let mut path = NamePath::Identifier(self.parse_identifier());
        loop {
            let meta = match self.current_token() {
                SyntaxKind::DotToken => false,
                SyntaxKind::ColonColonToken => true,
                _ => break,
            };
            self.next_token();
            let member = self.parse_member_name();
            let data = self.finish_node(SyntaxKind::MemberExpression, pos);
            path = NamePath::Member(self.arena.alloc(MemberExpression {
                data,
                base: path,
                member,
                meta,
            }));
        }
        path
    }

    /// A name path with optional template arguments: `Foo<string, T = int32>`.
    fn parse_type_reference(&mut self) -> &'a TypeReference<'a> {
        let pos = self.token_pos();
        let name = self.parse_name_path();
        let arguments = self.parse_template_arguments();
        let data = self.finish_node(SyntaxKind::TypeReference, pos);
        self.arena.alloc(TypeReference { data, name, arguments })
    }

    fn parse_template_arguments(&mut self) -> &'a [&'a TemplateArgument<'a>] {
        if !self.optional_token(SyntaxKind::LessThanToken) {
            return &[];
        }
        let mut arguments = Vec::new();
        while !matches!(self.current_token(), SyntaxKind::GreaterThanToken | SyntaxKind::EndOfFileToken) {
            let pos = self.token_pos();
            let named = self.current_token() == SyntaxKind::Identifier
                && self.scanner.look_ahead(|s| s.scan() == SyntaxKind::EqualsToken);
            let name = if named {
                let id = self.parse_identifier();
                self.next_token();
                Some(id)
            } else {
                None
            };
            if !can_start_expression(self.current_token()) {
                self.error(&messages::EXPRESSION_EXPECTED, &[]);
                break;
            }
            let argument = self.parse_expression();
            let data = self.finish_node(SyntaxKind::TemplateArgument, pos);
            arguments.push(&*self.arena.alloc(TemplateArgument { data, name, argument }));
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.expect_token(SyntaxKind::GreaterThanToken);
        self.alloc_list(arguments)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn parse_expression(&mut self) -> Expression<'a> {
        self.recursion_depth += 1;
        let expr = if self.recursion_depth > MAX_RECURSION_DEPTH {
            self.error(&messages::NESTING_TOO_DEEP, &[]);
            let pos = self.token_pos();
            self.invalid_expression(pos)
        } else {
            self.parse_binary_expression(OperatorPrecedence::Union)
        };
        self.recursion_depth -= 1;
        expr
    }

    /// Union and intersection chains. A leading operator is allowed:
    /// `| A | B`.
    fn parse_binary_expression(&mut self, precedence: OperatorPrecedence) -> Expression<'a> {
        if precedence >= OperatorPrecedence::Array {
            return self.parse_array_expression();
        }
        let pos = self.token_pos();
        let leading = get_binary_operator_precedence(self.current_token()) == precedence;
        if leading {
            self.next_token();
        }
        let first = self.parse_binary_expression(precedence.next());
        if !leading && get_binary_operator_precedence(self.current_token()) != precedence {
            return first;
        }

        let mut options = vec![first];
        while get_binary_operator_precedence(self.current_token()) == precedence {
            self.next_token();
            options.push(self.parse_binary_expression(precedence.next()));
        }
        let options = self.alloc_list(options);
        if precedence == OperatorPrecedence::Union {
            let data = self.finish_node(SyntaxKind::UnionExpression, pos);
            Expression::Union(self.arena.alloc(UnionExpression { data, options }))
        } else {
            let data = self.finish_node(SyntaxKind::IntersectionExpression, pos);
            Expression::Intersection(self.arena.alloc(IntersectionExpression { data, options }))
        }
    }

    /// Postfix `T[]`.
    fn parse_array_expression(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        let mut expr = self.parse_primary_expression();
        while self.current_token() == SyntaxKind::OpenBracketToken
            && self.scanner.look_ahead(|s| s.scan() == SyntaxKind::CloseBracketToken)
        {
            self.next_token();
            self.next_token();
            let data = self.finish_node(SyntaxKind::ArrayExpression, pos);
            expr = Expression::Array(self.arena.alloc(ArrayExpression { data, element: expr }));
        }
        expr
    }

    fn parse_primary_expression(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        match self.current_token() {
            SyntaxKind::Identifier => {
                let name = self.parse_name_path();
                if self.current_token() == SyntaxKind::OpenParenToken {
                    let arguments = self.parse_argument_list();
                    let data = self.finish_node(SyntaxKind::CallExpression, pos);
                    return Expression::Call(self.arena.alloc(CallExpression {
                        data,
                        target: name,
                        arguments,
                    }));
                }
                let arguments = self.parse_template_arguments();
                let data = self.finish_node(SyntaxKind::TypeReference, pos);
                Expression::Reference(self.arena.alloc(TypeReference { data, name, arguments }))
            }
            SyntaxKind::StringLiteral => Expression::StringLiteral(self.parse_string_literal()),
            SyntaxKind::StringTemplateHead => self.parse_string_template(),
            SyntaxKind::NumericLiteral => {
                let text = self.alloc_text(self.token_value());
                self.next_token();
                let data = self.finish_node(SyntaxKind::NumericLiteral, pos);
                Expression::NumericLiteral(self.arena.alloc(NumericLiteral { data, text }))
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                let value = self.current_token() == SyntaxKind::TrueKeyword;
                self.next_token();
                let data = self.finish_node(SyntaxKind::BooleanLiteral, pos);
                Expression::BooleanLiteral(self.arena.alloc(BooleanLiteral { data, value }))
            }
            SyntaxKind::VoidKeyword => self.parse_intrinsic(IntrinsicKeyword::Void),
            SyntaxKind::NeverKeyword => self.parse_intrinsic(IntrinsicKeyword::Never),
            SyntaxKind::UnknownKeyword => self.parse_intrinsic(IntrinsicKeyword::Unknown),
            SyntaxKind::NullKeyword => self.parse_intrinsic(IntrinsicKeyword::Null),
            SyntaxKind::ValueOfKeyword => {
                self.next_token();
                let target = self.parse_expression();
                let data = self.finish_node(SyntaxKind::ValueOfExpression, pos);
                Expression::ValueOf(self.arena.alloc(ValueOfExpression { data, target }))
            }
            SyntaxKind::OpenParenToken => {
                self.next_token();
                let inner = self.parse_expression();
                self.expect_token(SyntaxKind::CloseParenToken);
                inner
            }
            SyntaxKind::OpenBraceToken => {
                self.next_token();
                let properties = self.parse_model_members(SyntaxKind::CloseBraceToken);
                self.expect_token(SyntaxKind::CloseBraceToken);
                let data = self.finish_node(SyntaxKind::ModelExpression, pos);
                Expression::Model(self.arena.alloc(ModelExpression { data, properties }))
            }
            SyntaxKind::OpenBracketToken => {
                self.next_token();
                let values = self.parse_expression_list(SyntaxKind::CloseBracketToken);
                self.expect_token(SyntaxKind::CloseBracketToken);
                let data = self.finish_node(SyntaxKind::TupleExpression, pos);
                Expression::Tuple(self.arena.alloc(TupleExpression { data, values }))
            }
            SyntaxKind::HashBraceToken => self.parse_object_literal(),
            SyntaxKind::HashBracketToken => {
                self.next_token();
                let values = self.parse_expression_list(SyntaxKind::CloseBracketToken);
                self.expect_token(SyntaxKind::CloseBracketToken);
                let data = self.finish_node(SyntaxKind::ArrayLiteral, pos);
                Expression::ArrayLiteral(self.arena.alloc(ArrayLiteral { data, values }))
            }
            _ => {
                self.error(&messages::EXPRESSION_EXPECTED, &[]);
                self.invalid_expression(pos)
            }
        }
    }

    fn invalid_expression(&mut self, pos: u32) -> Expression<'a> {
        let data = self.node(SyntaxKind::InvalidExpression, pos, pos);
        Expression::Invalid(self.arena.alloc(data))
    }

    fn parse_intrinsic(&mut self, keyword: IntrinsicKeyword) -> Expression<'a> {
        let pos = self.token_pos();
        let kind = self.current_token();
        self.next_token();
        let data = self.finish_node(kind, pos);
        Expression::Intrinsic(self.arena.alloc(IntrinsicExpression { data, keyword }))
    }

    fn parse_string_literal(&mut self) -> &'a StringLiteral<'a> {
        let pos = self.token_pos();
        let value = if self.current_token() == SyntaxKind::StringLiteral {
            let value = self.alloc_text(self.token_value());
            self.next_token();
            value
        } else {
            self.error(&messages::TOKEN_EXPECTED, &["string"]);
            ""
        };
        let data = self.finish_node(SyntaxKind::StringLiteral, pos);
        self.arena.alloc(StringLiteral { data, value })
    }

    /// `"head ${expr} middle ${expr} tail"`; the current token is the head.
    fn parse_string_template(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        let triple = self.scanner.token_flags().contains(TokenFlags::TRIPLE_QUOTED);
        let head = self.alloc_text(self.token_value());
        self.next_token();

        let mut spans = Vec::new();
        loop {
            let span_pos = self.token_pos();
            let expression = self.parse_expression();
            if self.current_token() != SyntaxKind::CloseBraceToken {
                self.error(&messages::TOKEN_EXPECTED, &["}"]);
                let data = self.finish_node(SyntaxKind::StringTemplateSpan, span_pos);
                spans.push(&*self.arena.alloc(StringTemplateSpan { data, expression, literal: "" }));
                break;
            }
            let kind = self.scanner.rescan_template_token(triple);
            let literal = self.alloc_text(self.token_value());
            self.next_token();
            let data = self.finish_node(SyntaxKind::StringTemplateSpan, span_pos);
            spans.push(&*self.arena.alloc(StringTemplateSpan { data, expression, literal }));
            if kind != SyntaxKind::StringTemplateMiddle {
                break;
            }
        }
        let spans = self.alloc_list(spans);
        let data = self.finish_node(SyntaxKind::StringTemplateExpression, pos);
        Expression::StringTemplate(self.arena.alloc(StringTemplateExpression { data, head, spans }))
    }

    /// `#{ name: value, ...Other }`
    fn parse_object_literal(&mut self) -> Expression<'a> {
        let pos = self.token_pos();
        self.next_token();
        let mut properties = Vec::new();
        while !matches!(self.current_token(), SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken) {
            let saved_pos = self.scanner.token_start();
            let member_pos = self.token_pos();
            if self.optional_token(SyntaxKind::DotDotDotToken) {
                let target = self.parse_type_reference();
                let data = self.finish_node(SyntaxKind::ObjectLiteralSpreadProperty, member_pos);
                properties.push(ObjectLiteralMember::Spread(
                    self.arena.alloc(ObjectLiteralSpreadProperty { data, target }),
                ));
            } else {
                let id = self.parse_member_name();
                self.expect_token(SyntaxKind::ColonToken);
                let value = self.parse_expression();
                let data = self.finish_node(SyntaxKind::ObjectLiteralProperty, member_pos);
                properties.push(ObjectLiteralMember::Property(
                    self.arena.alloc(ObjectLiteralProperty { data, id, value }),
                ));
            }
            if !self.optional_token(SyntaxKind::CommaToken) || self.scanner.token_start() == saved_pos {
                break;
            }
        }
        self.expect_token(SyntaxKind::CloseBraceToken);
        let properties = self.alloc_list(properties);
        let data = self.finish_node(SyntaxKind::ObjectLiteral, pos);
        Expression::ObjectLiteral(self.arena.alloc(ObjectLiteral { data, properties }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_with<T>(source: &str, f: impl FnOnce(&SourceFile<'_>, &DiagnosticCollection) -> T) -> T {
        let arena = Bump::new();
        let interner = StringInterner::new();
        let mut parser = Parser::new(&arena, &interner, SourceFileId(0), "test.tsp", source);
        let file = parser.parse_source_file();
        let diagnostics = parser.take_diagnostics();
        f(file, &diagnostics)
    }

    #[test]
    fn test_node_ids_are_unique() {
        parse_with("model A { x: string; y: int32 }", |file, _| {
            let Statement::Model(model) = file.statements[0] else {
                panic!("expected model");
            };
            let ids: Vec<_> = model
                .properties
                .iter()
                .map(|p| p.data().id)
                .chain([model.data.id, model.id.data.id])
                .collect();
            let mut deduped = ids.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(ids.len(), deduped.len());
        });
    }

    #[test]
    fn test_node_range_covers_declaration() {
        parse_with("  alias X = string;", |file, _| {
            let range = file.statements[0].range();
            assert_eq!((range.pos, range.end), (2, 19));
        });
    }

    #[test]
    fn test_missing_semicolon_reports_token_expected() {
        parse_with("alias X = string", |_, diagnostics| {
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics.diagnostics()[0].message, "';' expected.");
        });
    }

    #[test]
    fn test_import_after_declaration() {
        parse_with("model A {} import \"./b.tsp\";", |_, diagnostics| {
            assert_eq!(diagnostics.diagnostics()[0].code, "import-first");
        });
    }

    #[test]
    fn test_deep_nesting_is_reported() {
        let source = format!("alias X = {}string{};", "(".repeat(300), ")".repeat(300));
        parse_with(&source, |_, diagnostics| {
            assert!(diagnostics.diagnostics().iter().any(|d| d.code == "nesting-too-deep"));
        });
    }
}
