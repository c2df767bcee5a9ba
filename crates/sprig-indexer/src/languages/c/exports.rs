//! C export resolver: top-level declarations, including those inside
//! preprocessor conditionals

use crate::plugin::ExportedSymbol;
use crate::project::{node_span, ParsedFile};
use crate::syntax::{field_children, named_children};
use sprig_core::{DeclarationRole, Partial, Span, SprigError, SymbolKind};
use tree_sitter::Node;

pub(super) fn collect(file: &ParsedFile) -> Partial<Vec<ExportedSymbol>> {
    let mut collector = Collector {
        file,
        symbols: Vec::new(),
        issues: Vec::new(),
    };
    collector.visit_items(file.root());
    Partial::with_issues(collector.symbols, collector.issues)
}

struct Collector<'f> {
    file: &'f ParsedFile,
    symbols: Vec<ExportedSymbol>,
    issues: Vec<SprigError>,
}

impl<'f> Collector<'f> {
    fn visit_items(&mut self, parent: Node) {
        for node in named_children(parent) {
            match node.kind() {
                "function_definition" => self.function_definition(node),
                "declaration" => self.declaration(node),
                "type_definition" => self.type_definition(node),
                "struct_specifier" | "enum_specifier" | "union_specifier" => {
                    // `struct X;` is a forward declaration
                    if node.child_by_field_name("body").is_some() {
                        self.tagged(node, with_trailing_semicolon(node));
                    }
                }
                "preproc_def" | "preproc_function_def" => self.macro_definition(node),
                "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif"
                | "preproc_elifdef" => self.visit_items(node),
                _ => {}
            }
        }
    }

    fn function_definition(&mut self, node: Node) {
        let Some(name) = node
            .child_by_field_name("declarator")
            .and_then(declarator_name)
        else {
            self.missing_identifier(node);
            return;
        };
        let name = self.file.text(name).to_string();
        self.symbols
            .push(ExportedSymbol::new(name, SymbolKind::Function, node_span(node)));
    }

    fn declaration(&mut self, node: Node) {
        let span = node_span(node);

        if let Some(ty) = node.child_by_field_name("type") {
            if is_tagged(ty) && ty.child_by_field_name("body").is_some() {
                self.tagged(ty, span);
            }
        }

        let is_extern = {
            let mut cursor = node.walk();
            let found = node
                .children(&mut cursor)
                .any(|c| c.kind() == "storage_class_specifier" && self.file.text(c) == "extern");
            found
        };

        for declarator in field_children(node, "declarator") {
            let Some(name) = declarator_name(declarator) else {
                self.missing_identifier(declarator);
                continue;
            };
            let name = self.file.text(name).to_string();

            let symbol = if is_function_declarator(declarator) {
                ExportedSymbol::new(name, SymbolKind::Function, span)
                    .with_role(DeclarationRole::Signature)
            } else if is_extern {
                ExportedSymbol::new(name, SymbolKind::Variable, span)
                    .with_role(DeclarationRole::Signature)
            } else {
                ExportedSymbol::new(name, SymbolKind::Variable, span)
            };
            self.symbols.push(symbol);
        }
    }

    fn type_definition(&mut self, node: Node) {
        let span = node_span(node);
        let ty = node.child_by_field_name("type");

        for declarator in field_children(node, "declarator") {
            let Some(name) = declarator_name(declarator) else {
                self.missing_identifier(declarator);
                continue;
            };
            let name = self.file.text(name).to_string();
            let mut symbol = ExportedSymbol::new(name.clone(), SymbolKind::Typedef, span);

            if let Some(ty) = ty.filter(|t| is_tagged(*t)) {
                if let Some(tag) = ty.child_by_field_name("name") {
                    let tag = self.file.text(tag);
                    if tag != name {
                        symbol.aliases.push(tag.to_string());
                    }
                }
                symbol.aliases.extend(self.enumerators(ty));
            }
            self.symbols.push(symbol);
        }
    }

    fn tagged(&mut self, node: Node, span: Span) {
        let Some(name) = node.child_by_field_name("name") else {
            self.missing_identifier(node);
            return;
        };
        let kind = match node.kind() {
            "enum_specifier" => SymbolKind::Enum,
            "union_specifier" => SymbolKind::Union,
            _ => SymbolKind::Struct,
        };
        let mut symbol = ExportedSymbol::new(self.file.text(name), kind, span);
        symbol.aliases = self.enumerators(node);
        self.symbols.push(symbol);
    }

    fn macro_definition(&mut self, node: Node) {
        let Some(name) = node.child_by_field_name("name") else {
            self.missing_identifier(node);
            return;
        };
        self.symbols.push(ExportedSymbol::new(
            self.file.text(name),
            SymbolKind::Macro,
            node_span(node),
        ));
    }

    fn enumerators(&self, node: Node) -> Vec<String> {
        if node.kind() != "enum_specifier" {
            return Vec::new();
        }
        let Some(body) = node.child_by_field_name("body") else {
            return Vec::new();
        };
        named_children(body)
            .into_iter()
            .filter(|n| n.kind() == "enumerator")
            .filter_map(|n| n.child_by_field_name("name"))
            .map(|n| self.file.text(n).to_string())
            .collect()
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

fn is_tagged(node: Node) -> bool {
    matches!(
        node.kind(),
        "struct_specifier" | "enum_specifier" | "union_specifier"
    )
}

/// Span of a specifier, extended over a directly following `;`.
fn with_trailing_semicolon(node: Node) -> Span {
    let mut span = node_span(node);
    if let Some(next) = node.next_sibling().filter(|n| n.kind() == ";") {
        span.end = next.end_byte();
        span.end_row = next.end_position().row;
    }
    span
}

/// Follow a declarator chain down to the declared identifier.
pub(super) fn declarator_name(node: Node) -> Option<Node> {
    match node.kind() {
        "identifier" | "type_identifier" => Some(node),
        "parenthesized_declarator" | "attributed_declarator" => {
            named_children(node).into_iter().find_map(declarator_name)
        }
        _ => node.child_by_field_name("declarator").and_then(declarator_name),
    }
}

fn is_function_declarator(node: Node) -> bool {
    match node.kind() {
        "function_declarator" => true,
        "parenthesized_declarator" | "attributed_declarator" => {
            named_children(node).into_iter().any(is_function_declarator)
        }
        _ => node
            .child_by_field_name("declarator")
            .is_some_and(is_function_declarator),
    }
}

