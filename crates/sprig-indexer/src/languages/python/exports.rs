//! Python export resolver: top-level classes, functions and assignment
//! targets, plus the module's `__all__` list

use crate::plugin::ExportedSymbol;
use crate::project::{node_span, ParsedFile};
use crate::syntax::named_children;
use sprig_core::{Partial, Span, SprigError, SymbolKind};
use tree_sitter::Node;

const PUBLIC_LIST: &str = "__all__";

pub(super) fn collect(file: &ParsedFile) -> Partial<Vec<ExportedSymbol>> {
    let mut symbols = Vec::new();
    let mut issues = Vec::new();

    for node in named_children(file.root()) {
        match node.kind() {
            "function_definition" | "class_definition" => {
                definition(file, node, node_span(node), &mut symbols, &mut issues)
            }
            // the decorated span covers the decorators
            "decorated_definition" => match node.child_by_field_name("definition") {
                Some(inner) => definition(file, inner, node_span(node), &mut symbols, &mut issues),
                None => issues.push(missing_identifier(file, node)),
            },
            "expression_statement" => {
                let span = node_span(node);
                let assignments = named_children(node)
                    .into_iter()
                    .filter(|n| n.kind() == "assignment");
                for assignment in assignments {
                    for name in assigned_names(file, assignment) {
                        if name != PUBLIC_LIST {
                            symbols.push(ExportedSymbol::new(name, SymbolKind::Variable, span));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Partial::with_issues(symbols, issues)
}

fn definition(
    file: &ParsedFile,
    node: Node,
    span: Span,
    symbols: &mut Vec<ExportedSymbol>,
    issues: &mut Vec<SprigError>,
) {
    let kind = match node.kind() {
        "class_definition" => SymbolKind::Class,
        _ => SymbolKind::Function,
    };
    match node.child_by_field_name("name") {
        Some(name) => symbols.push(ExportedSymbol::new(file.text(name), kind, span)),
        None => issues.push(missing_identifier(file, node)),
    }
}

/// Names bound by an assignment, following chains like `a = b = 1`.
fn assigned_names(file: &ParsedFile, assignment: Node) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = Some(assignment);

    while let Some(node) = current {
        if let Some(left) = node.child_by_field_name("left") {
            pattern_names(file, left, &mut names);
        }
        current = node
            .child_by_field_name("right")
            .filter(|right| right.kind() == "assignment");
    }
    names
}

fn pattern_names(file: &ParsedFile, pattern: Node, names: &mut Vec<String>) {
    match pattern.kind() {
        "identifier" => names.push(file.text(pattern).to_string()),
        "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern" => {
            for child in named_children(pattern) {
                pattern_names(file, child, names);
            }
        }
        // attribute and subscript targets bind nothing new
        _ => {}
    }
}

/// The literal `__all__` list, if the module assigns one.
pub(super) fn public_names(file: &ParsedFile) -> Option<Vec<String>> {
    let mut public = None;

    for statement in named_children(file.root()) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        for assignment in named_children(statement) {
            if assignment.kind() != "assignment" {
                continue;
            }
            let is_public_list = assignment
                .child_by_field_name("left")
                .is_some_and(|left| file.text(left) == PUBLIC_LIST);
            let value = assignment
                .child_by_field_name("right")
                .filter(|right| matches!(right.kind(), "list" | "tuple"));
            if let (true, Some(value)) = (is_public_list, value) {
                public = Some(
                    named_children(value)
                        .into_iter()
                        .filter(|item| item.kind() == "string")
                        .map(|item| string_value(file, item))
                        .collect(),
                );
            }
        }
    }
    public
}

fn string_value(file: &ParsedFile, node: Node) -> String {
    named_children(node)
        .into_iter()
        .filter(|part| part.kind() == "string_content")
        .map(|part| file.text(part))
        .collect()
}

fn missing_identifier(file: &ParsedFile, node: Node) -> SprigError {
    let reason = format!(
        "{} at line {} has no identifier",
        node.kind(),
        node.start_position().row + 1
    );
    tracing::warn!("{}: {}", file.id, reason);
    SprigError::Resolution {
        file: file.id.clone(),
        reason,
    }
}
