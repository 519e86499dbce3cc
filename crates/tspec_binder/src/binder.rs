//! The binder implementation.
//!
//! Walks every source file of a compilation and builds the symbol table:
//! - one symbol per declaration, exported from its enclosing namespace
//! - namespace merging across blocks and files
//! - template parameters as locals of their declaration
//! - interface operations as members of their interface
//! - `using` statements, resolved once all files are bound
//! - augment decorators (`@@dec(...)`), collected in source order
//!
//! Lookup walks from the innermost declaration outwards: template
//! parameters, then each enclosing namespace with the `using`s in effect
//! for that namespace in the current file, then the implicit `TypeSpec`
//! and `TypeSpec.Reflection` namespaces.

use crate::scope::{ResolutionResult, Scope};
use crate::symbol::{Declaration, Symbol, SymbolFlags, SymbolId};
use rustc_hash::FxHashMap;
use tspec_ast::node::*;
use tspec_ast::types::{NodeId, SourceFileId};
use tspec_core::intern::{InternedString, StringInterner};
use tspec_core::text::TextRange;
use tspec_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage, DiagnosticTarget};

/// Name of the standard library namespace that is implicitly in scope.
pub const STD_NAMESPACE: &str = "TypeSpec";
/// Name of the reflection namespace nested in the standard library.
pub const REFLECTION_NAMESPACE: &str = "Reflection";

/// The global namespace symbol.
pub const GLOBAL_NAMESPACE: SymbolId = SymbolId(0);

/// The binder creates symbols and links declarations.
pub struct Binder<'a> {
    interner: &'a StringInterner,
    /// All symbols created during binding. Index 0 is the global namespace.
    symbols: Vec<Symbol<'a>>,
    files: FxHashMap<SourceFileId, &'a SourceFile<'a>>,
    /// Declaration node -> symbol.
    node_symbols: FxHashMap<NodeId, SymbolId>,
    /// Namespaces made visible by `using`, per file and enclosing namespace.
    usings: FxHashMap<(SourceFileId, SymbolId), Vec<SymbolId>>,
    pending_usings: Vec<(Scope, &'a UsingStatement<'a>)>,
    augments: Vec<(Scope, &'a AugmentDecoratorStatement<'a>)>,
    /// Diagnostics from binding.
    diagnostics: DiagnosticCollection,
}

impl<'a> Binder<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        let global = Symbol::new(GLOBAL_NAMESPACE, interner.intern(""), String::new(), SymbolFlags::NAMESPACE);
        Self {
            interner,
            symbols: vec![global],
            files: FxHashMap::default(),
            node_symbols: FxHashMap::default(),
            usings: FxHashMap::default(),
            pending_usings: Vec::new(),
            augments: Vec::new(),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// Take diagnostics from the binder.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    /// Get all symbols created by this binder.
    pub fn symbols(&self) -> &[Symbol<'a>] {
        &self.symbols
    }

    /// Get a symbol by ID. Ids are only handed out by this binder.
    pub fn symbol(&self, id: SymbolId) -> &Symbol<'a> {
        &self.symbols[id.index()]
    }

    pub fn get_symbol(&self, id: SymbolId) -> Option<&Symbol<'a>> {
        self.symbols.get(id.index())
    }

    /// The symbol declared by a declaration node.
    pub fn symbol_of(&self, node: NodeId) -> Option<SymbolId> {
        self.node_symbols.get(&node).copied()
    }

    pub fn file(&self, id: SourceFileId) -> Option<&'a SourceFile<'a>> {
        self.files.get(&id).copied()
    }

    /// Every bound file, ordered by file id.
    pub fn source_files(&self) -> Vec<&'a SourceFile<'a>> {
        let mut files: Vec<_> = self.files.values().copied().collect();
        files.sort_by_key(|f| f.id);
        files
    }

    /// Augment decorators of every bound file, in binding order.
    pub fn augments(&self) -> &[(Scope, &'a AugmentDecoratorStatement<'a>)] {
        &self.augments
    }

    pub fn global_namespace(&self) -> SymbolId {
        GLOBAL_NAMESPACE
    }

    pub fn std_namespace(&self) -> Option<SymbolId> {
        let name = self.interner.get(STD_NAMESPACE)?;
        self.lookup_export(GLOBAL_NAMESPACE, name)
            .filter(|id| self.symbol(*id).is_namespace())
    }

    pub fn reflection_namespace(&self) -> Option<SymbolId> {
        let std = self.std_namespace()?;
        let name = self.interner.get(REFLECTION_NAMESPACE)?;
        self.lookup_export(std, name).filter(|id| self.symbol(*id).is_namespace())
    }

    /// Key decorators are exported under, so `@doc` and a type `doc` coexist.
    pub fn decorator_key(&self, name: &str) -> InternedString {
        self.interner.intern(&format!("@{}", name))
    }

    /// `A.B.Foo` for a symbol nested in namespaces `A.B`.
    pub fn full_name(&self, id: SymbolId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(sym_id) = current {
            if sym_id == GLOBAL_NAMESPACE {
                break;
            }
            let symbol = self.symbol(sym_id);
            parts.push(symbol.name_text.as_str());
            current = symbol.parent;
        }
        parts.reverse();
        parts.join(".")
    }

    // ========================================================================
    // Source file binding
    // ========================================================================

    /// Bind a source file, creating symbols for all declarations.
    pub fn bind_source_file(&mut self, source_file: &'a SourceFile<'a>) {
        self.files.insert(source_file.id, source_file);
        let scope = Scope::new(source_file.id, GLOBAL_NAMESPACE);
        for statement in source_file.statements.iter() {
            self.bind_statement(scope, statement);
        }
    }

    /// Resolve `using` statements. Call after every file has been bound.
    pub fn finish(&mut self) {
        let pending = std::mem::take(&mut self.pending_usings);
        for (scope, using) in pending {
            let Some(namespace) = self.resolve_namespace_path(scope, using.name) else {
                continue;
            };
            if !self.symbol(namespace).is_namespace() {
                self.report(Some(scope.file), using.data.range, &messages::USING_INVALID_REF, &[]);
                continue;
            }
            let entry = self.usings.entry((scope.file, scope.symbol)).or_default();
            if !entry.contains(&namespace) {
                entry.push(namespace);
            }
        }
    }

    fn bind_statement(&mut self, scope: Scope, stmt: &Statement<'a>) {
        match *stmt {
            Statement::Using(n) => self.pending_usings.push((scope, n)),
            Statement::Namespace(n) => self.bind_namespace(scope, n),
            Statement::Model(n) => {
                self.declare(scope, n.id, SymbolFlags::MODEL, Declaration::Model(n));
            }
            Statement::Scalar(n) => {
                self.declare(scope, n.id, SymbolFlags::SCALAR, Declaration::Scalar(n));
            }
            Statement::Enum(n) => {
                self.declare(scope, n.id, SymbolFlags::ENUM, Declaration::Enum(n));
            }
            Statement::Union(n) => {
                self.declare(scope, n.id, SymbolFlags::UNION, Declaration::Union(n));
            }
            Statement::Interface(n) => self.bind_interface(scope, n),
            Statement::Operation(n) => {
                self.declare(scope, n.id, SymbolFlags::OPERATION, Declaration::Operation(n));
            }
            Statement::Alias(n) => {
                self.declare(scope, n.id, SymbolFlags::ALIAS, Declaration::Alias(n));
            }
            Statement::Const(n) => {
                self.declare(scope, n.id, SymbolFlags::CONST, Declaration::Const(n));
            }
            Statement::DecoratorDeclaration(n) => {
                self.declare(scope, n.id, SymbolFlags::DECORATOR, Declaration::Decorator(n));
            }
            Statement::AugmentDecorator(n) => self.augments.push((scope, n)),
            Statement::Import(_) | Statement::Empty(_) | Statement::Invalid(_) => {}
        }
    }

    fn bind_namespace(&mut self, scope: Scope, node: &'a NamespaceStatement<'a>) {
        let mut parent = scope.symbol;
        for (i, id) in node.path.iter().enumerate() {
            let declaration = (i + 1 == node.path.len()).then_some(Declaration::Namespace(node));
            parent = self.declare_namespace(scope.file, parent, id, declaration);
        }
        self.node_symbols.insert(node.data.id, parent);
        let inner = scope.with_symbol(parent);
        for statement in node.statements.iter() {
            self.bind_statement(inner, statement);
        }
    }

    fn declare_namespace(
        &mut self,
        file: SourceFileId,
        parent: SymbolId,
        id: &'a Identifier<'a>,
        declaration: Option<Declaration<'a>>,
    ) -> SymbolId {
        if let Some(existing) = self.symbol(parent).exports.get(&id.text) {
            if self.symbol(existing).is_namespace() {
                let symbol = &mut self.symbols[existing.index()];
                symbol.declarations.extend(declaration);
                return existing;
            }
            self.report_duplicate(file, id, existing);
            return self.create_symbol(id.text, id.text_name, SymbolFlags::NAMESPACE, parent, file, declaration);
        }
        let sym = self.create_symbol(id.text, id.text_name, SymbolFlags::NAMESPACE, parent, file, declaration);
        self.symbols[parent.index()].exports.set(id.text, sym);
        sym
    }

    fn bind_interface(&mut self, scope: Scope, node: &'a InterfaceStatement<'a>) {
        let Some(interface) = self.declare(scope, node.id, SymbolFlags::INTERFACE, Declaration::Interface(node)) else {
            return;
        };
        for op in node.operations.iter() {
            let op_sym = self.create_symbol(
                op.id.text,
                op.id.text_name,
                SymbolFlags::OPERATION | SymbolFlags::MEMBER,
                interface,
                scope.file,
                Some(Declaration::Operation(op)),
            );
            // Duplicate operations are reported when the interface is checked.
            if !self.symbol(interface).members.has(&op.id.text) {
                self.symbols[interface.index()].members.set(op.id.text, op_sym);
            }
            self.bind_template_parameters(scope.file, op_sym, Declaration::Operation(op));
        }
    }

    /// Declare a named declaration in the namespace of `scope`.
    fn declare(
        &mut self,
        scope: Scope,
        id: &'a Identifier<'a>,
        flags: SymbolFlags,
        declaration: Declaration<'a>,
    ) -> Option<SymbolId> {
        if id.text_name.is_empty() {
            return None;
        }
        let key = if flags.contains(SymbolFlags::DECORATOR) {
            self.decorator_key(id.text_name)
        } else {
            id.text
        };
        let namespace = scope.symbol;
        let existing = self.symbol(namespace).exports.get(&key);
        let sym = self.create_symbol(key, id.text_name, flags, namespace, scope.file, Some(declaration));
        match existing {
            Some(existing) => self.report_duplicate(scope.file, id, existing),
            None => self.symbols[namespace.index()].exports.set(key, sym),
        }
        self.bind_template_parameters(scope.file, sym, declaration);
        Some(sym)
    }

    fn bind_template_parameters(&mut self, file: SourceFileId, owner: SymbolId, declaration: Declaration<'a>) {
        for (index, param) in declaration.template_parameters().iter().enumerate() {
            if param.id.text_name.is_empty() {
                continue;
            }
            if let Some(existing) = self.symbol(owner).locals.get(&param.id.text) {
                self.report_duplicate(file, param.id, existing);
                continue;
            }
            let sym = self.create_symbol(
                param.id.text,
                param.id.text_name,
                SymbolFlags::TEMPLATE_PARAMETER,
                owner,
                file,
                Some(Declaration::TemplateParameter {
                    node: param,
                    index: index as u32,
                }),
            );
            self.symbols[owner.index()].locals.set(param.id.text, sym);
        }
    }

    fn create_symbol(
        &mut self,
        name: InternedString,
        name_text: &str,
        flags: SymbolFlags,
        parent: SymbolId,
        file: SourceFileId,
        declaration: Option<Declaration<'a>>,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let mut symbol = Symbol::new(id, name, name_text.to_string(), flags);
        symbol.parent = Some(parent);
        symbol.file = Some(file);
        if let Some(declaration) = declaration {
            self.node_symbols.insert(declaration.node_id(), id);
            symbol.declarations.push(declaration);
        }
        self.symbols.push(symbol);
        id
    }

    /// Report a duplicate on the new declaration, and once on the first one.
    fn report_duplicate(&mut self, file: SourceFileId, id: &Identifier<'_>, existing: SymbolId) {
        let name = id.text_name.to_string();
        let first = self.symbol(existing);
        if !first.flags.contains(SymbolFlags::DUPLICATE) {
            let first_file = first.file;
            let first_range = first
                .declaration()
                .and_then(|d| d.identifier())
                .map(|ident| ident.data.range);
            if let Some(range) = first_range {
                self.report(first_file, range, &messages::DUPLICATE_SYMBOL, &[&name]);
            }
            self.symbols[existing.index()].flags |= SymbolFlags::DUPLICATE;
        }
        self.report(Some(file), id.data.range, &messages::DUPLICATE_SYMBOL, &[&name]);
    }

    fn report(&mut self, file: Option<SourceFileId>, range: TextRange, msg: &DiagnosticMessage, args: &[&str]) {
        let diagnostic = match file.and_then(|f| self.files.get(&f)) {
            Some(source) => Diagnostic::with_target(DiagnosticTarget::new(source.file_name, range), msg, args),
            None => Diagnostic::new(msg, args),
        };
        self.diagnostics.add(diagnostic);
    }

    // ========================================================================
    // Symbol resolution
    // ========================================================================

    /// Resolve an identifier visible from `scope`.
    pub fn resolve(&self, scope: Scope, name: InternedString) -> ResolutionResult {
        let mut current = Some(scope.symbol);
        while let Some(id) = current {
            let symbol = self.symbol(id);
            if let Some(found) = symbol.locals.get(&name) {
                return ResolutionResult::Resolved(found);
            }
            if symbol.is_namespace() {
                if let Some(found) = symbol.exports.get(&name) {
                    return ResolutionResult::Resolved(found);
                }
                match self.resolve_in_usings(scope.file, id, name) {
                    ResolutionResult::Unresolved => {}
                    result => return result,
                }
            }
            current = symbol.parent;
        }

        for implicit in [self.std_namespace(), self.reflection_namespace()].into_iter().flatten() {
            if let Some(found) = self.lookup_export(implicit, name) {
                return ResolutionResult::Resolved(found);
            }
        }
        ResolutionResult::Unresolved
    }

    fn resolve_in_usings(&self, file: SourceFileId, namespace: SymbolId, name: InternedString) -> ResolutionResult {
        let Some(targets) = self.usings.get(&(file, namespace)) else {
            return ResolutionResult::Unresolved;
        };
        let mut candidates: Vec<SymbolId> = Vec::new();
        for target in targets {
            if let Some(found) = self.lookup_export(*target, name) {
                if !candidates.contains(&found) {
                    candidates.push(found);
                }
            }
        }
        match candidates.len() {
            0 => ResolutionResult::Unresolved,
            1 => ResolutionResult::Resolved(candidates[0]),
            _ => ResolutionResult::Ambiguous(candidates),
        }
    }

    /// A declaration exported from a namespace.
    pub fn lookup_export(&self, namespace: SymbolId, name: InternedString) -> Option<SymbolId> {
        self.get_symbol(namespace)?.exports.get(&name)
    }

    /// Resolve a dotted name whose segments are all namespaces, except
    /// possibly the last. Reports and returns `None` on failure.
    fn resolve_namespace_path(&mut self, scope: Scope, path: NamePath<'a>) -> Option<SymbolId> {
        match path {
            NamePath::Identifier(id) => match self.resolve(scope, id.text) {
                ResolutionResult::Resolved(sym) => Some(sym),
                ResolutionResult::Ambiguous(candidates) => {
                    let names: Vec<String> = candidates.iter().map(|c| self.full_name(*c)).collect();
                    let joined = names.join(", ");
                    self.report(
                        Some(scope.file),
                        id.data.range,
                        &messages::AMBIGUOUS_SYMBOL,
                        &[id.text_name, joined.as_str(), joined.as_str()],
                    );
                    None
                }
                ResolutionResult::Unresolved => {
                    self.report(Some(scope.file), id.data.range, &messages::INVALID_REF_NAMESPACE, &[id.text_name]);
                    None
                }
            },
            NamePath::Member(member) => {
                let base = self.resolve_namespace_path(scope, member.base)?;
                if !self.symbol(base).is_namespace() {
                    self.report(Some(scope.file), member.data.range, &messages::USING_INVALID_REF, &[]);
                    return None;
                }
                match self.lookup_export(base, member.member.text) {
                    Some(found) => Some(found),
                    None => {
                        let base_name = self.full_name(base);
                        self.report(
                            Some(scope.file),
                            member.member.data.range,
                            &messages::INVALID_REF_MEMBER,
                            &[base_name.as_str(), member.member.text_name],
                        );
                        None
                    }
                }
            }
        }
    }
}
