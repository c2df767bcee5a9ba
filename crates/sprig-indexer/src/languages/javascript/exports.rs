//! JS/TS export resolver
//!
//! Every top-level declaration is recorded, exported or not. `export`
//! statements widen the span to the whole statement; `export { a as b }`
//! clauses add aliases, and clauses naming something the file imports are
//! kept for re-export resolution.

use super::imports::required_specifier;
use crate::plugin::{ExportedSymbol, ImportBinding};
use crate::project::{node_span, ParsedFile};
use crate::syntax::{has_child_kind, named_children};
use sprig_core::{DeclarationRole, Partial, Span, SprigError, SymbolKind};
use tree_sitter::Node;

pub(super) const DEFAULT_EXPORT: &str = "default";

#[derive(Debug, Default)]
pub(super) struct ModuleExports {
    pub symbols: Vec<ExportedSymbol>,
    /// `export { local as exported }` without a source: `name` is the local
    /// name, `local()` the exported one.
    pub clauses: Vec<ImportBinding>,
}

pub(super) fn collect(file: &ParsedFile) -> Partial<ModuleExports> {
    let mut collector = Collector {
        file,
        exports: ModuleExports::default(),
        issues: Vec::new(),
    };

    for node in named_children(file.root()) {
        match node.kind() {
            "export_statement" => collector.export_statement(node),
            _ => collector.declaration(node, node_span(node), false),
        }
    }

    let ModuleExports { symbols, clauses } = &mut collector.exports;
    for clause in clauses.iter() {
        let exported = clause.local();
        if let Some(symbol) = symbols.iter_mut().find(|s| s.name == clause.name) {
            symbol.exported = true;
            if exported != symbol.name && !symbol.aliases.iter().any(|a| a == exported) {
                symbol.aliases.push(exported.to_string());
            }
        }
    }

    Partial::with_issues(collector.exports, collector.issues)
}

struct Collector<'f> {
    file: &'f ParsedFile,
    exports: ModuleExports,
    issues: Vec<SprigError>,
}

impl Collector<'_> {
    fn export_statement(&mut self, node: Node) {
        // `export ... from` is a re-export, collected with the imports
        if node.child_by_field_name("source").is_some() {
            return;
        }
        let span = node_span(node);
        let is_default = has_child_kind(node, DEFAULT_EXPORT);

        if let Some(declaration) = node.child_by_field_name("declaration") {
            let before = self.exports.symbols.len();
            self.declaration(declaration, span, true);
            if is_default {
                for symbol in &mut self.exports.symbols[before..] {
                    symbol.aliases.push(DEFAULT_EXPORT.to_string());
                }
            }
            return;
        }

        if let Some(value) = node.child_by_field_name("value") {
            match value.kind() {
                "identifier" => self.exports.clauses.push(ImportBinding::new(
                    self.file.text(value),
                    Some(DEFAULT_EXPORT.to_string()),
                )),
                kind => {
                    let kind = match kind {
                        "function_expression" | "function" | "arrow_function"
                        | "generator_function" => SymbolKind::Function,
                        "class" => SymbolKind::Class,
                        _ => SymbolKind::Variable,
                    };
                    self.exports
                        .symbols
                        .push(ExportedSymbol::new(DEFAULT_EXPORT, kind, span));
                }
            }
            return;
        }

        for clause in named_children(node).into_iter().filter(|n| n.kind() == "export_clause") {
            for specifier in named_children(clause)
                .into_iter()
                .filter(|n| n.kind() == "export_specifier")
            {
                let Some(name) = specifier.child_by_field_name("name") else {
                    continue;
                };
                let alias = specifier
                    .child_by_field_name("alias")
                    .map(|a| unquote(self.file.text(a)).to_string());
                self.exports
                    .clauses
                    .push(ImportBinding::new(unquote(self.file.text(name)), alias));
            }
        }
    }

    fn declaration(&mut self, node: Node, span: Span, exported: bool) {
        let kind = match node.kind() {
            "function_declaration" | "generator_function_declaration" => SymbolKind::Function,
            "function_signature" => {
                self.named(node, SymbolKind::Function, span, exported, DeclarationRole::Signature);
                return;
            }
            "class_declaration" | "abstract_class_declaration" => SymbolKind::Class,
            "interface_declaration" => SymbolKind::Interface,
            "type_alias_declaration" => SymbolKind::Typedef,
            "enum_declaration" => SymbolKind::Enum,
            "module" | "internal_module" => SymbolKind::Module,
            "lexical_declaration" | "variable_declaration" => {
                self.variables(node, span, exported);
                return;
            }
            "ambient_declaration" => {
                for child in named_children(node) {
                    self.declaration(child, span, exported);
                }
                return;
            }
            // `namespace A {}` parses as an expression statement
            "expression_statement" => {
                for child in named_children(node)
                    .into_iter()
                    .filter(|n| n.kind() == "internal_module")
                {
                    self.declaration(child, span, exported);
                }
                return;
            }
            _ => return,
        };
        self.named(node, kind, span, exported, DeclarationRole::Definition);
    }

    fn named(
        &mut self,
        node: Node,
        kind: SymbolKind,
        span: Span,
        exported: bool,
        role: DeclarationRole,
    ) {
        let Some(name) = node.child_by_field_name("name") else {
            self.missing_identifier(node);
            return;
        };
        let mut symbol =
            ExportedSymbol::new(unquote(self.file.text(name)), kind, span).with_role(role);
        symbol.exported = exported;
        self.exports.symbols.push(symbol);
    }

    fn variables(&mut self, node: Node, span: Span, exported: bool) {
        for declarator in named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "variable_declarator")
        {
            // `const x = require('m')` is an import, not a declaration
            let value = declarator.child_by_field_name("value");
            if value.is_some_and(|v| required_specifier(self.file, v).is_some()) {
                continue;
            }
            let Some(pattern) = declarator.child_by_field_name("name") else {
                self.missing_identifier(declarator);
                continue;
            };
            let mut names = Vec::new();
            pattern_names(self.file, pattern, &mut names);
            for name in names {
                let mut symbol = ExportedSymbol::new(name, SymbolKind::Variable, span);
                symbol.exported = exported;
                self.exports.symbols.push(symbol);
            }
        }
    }

    fn missing_identifier(&mut self, node: Node) {
        let reason = format!(
            "{} at line {} has no identifier",
            node.kind(),
            node.start_position().row + 1
        );
        tracing::warn!("{}: {}", self.file.id, reason);
        self.issues.push(SprigError::Resolution {
            file: self.file.id.clone(),
            reason,
        });
    }
}

/// Names bound by a declarator pattern such as `{ a, b: [c, ...d] }`.
fn pattern_names(file: &ParsedFile, pattern: Node, names: &mut Vec<String>) {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            names.push(file.text(pattern).to_string())
        }
        "pair_pattern" => {
            if let Some(value) = pattern.child_by_field_name("value") {
                pattern_names(file, value, names);
            }
        }
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = pattern.child_by_field_name("left") {
                pattern_names(file, left, names);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            for child in named_children(pattern) {
                pattern_names(file, child, names);
            }
        }
        _ => {}
    }
}

pub(super) fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
