//! Python import collection

use crate::plugin::{ImportBinding, ImportStatement};
use crate::project::{node_span, ParsedFile};
use crate::syntax::{field_children, named_children, visit_all};
use tree_sitter::Node;

pub(super) fn collect(file: &ParsedFile) -> Vec<ImportStatement> {
    let mut imports = Vec::new();

    visit_all(file.root(), &mut |node| match node.kind() {
        "import_statement" => {
            imports.extend(import_statement(file, node));
            false
        }
        "import_from_statement" | "future_import_statement" => {
            imports.push(from_statement(file, node));
            false
        }
        _ => true,
    });

    imports
}

/// `import a.b, c as d`: one normal import per dotted name.
fn import_statement(file: &ParsedFile, node: Node) -> Vec<ImportStatement> {
    let span = node_span(node);
    field_children(node, "name")
        .into_iter()
        .filter_map(|name| match name.kind() {
            "aliased_import" => {
                let module = name.child_by_field_name("name")?;
                let alias = name.child_by_field_name("alias")?;
                Some(ImportStatement::normal(compact(file, module), span).aliased(file.text(alias)))
            }
            _ => Some(ImportStatement::normal(compact(file, name), span)),
        })
        .collect()
}

/// `from m import x as y`, `from . import x`, `from m import *`.
fn from_statement(file: &ParsedFile, node: Node) -> ImportStatement {
    let span = node_span(node);
    let specifier = match node.kind() {
        "future_import_statement" => "__future__".to_string(),
        _ => node
            .child_by_field_name("module_name")
            .map(|m| compact(file, m))
            .unwrap_or_default(),
    };

    if named_children(node).iter().any(|c| c.kind() == "wildcard_import") {
        return ImportStatement::selective(specifier, span, Vec::new()).wildcard();
    }

    let bindings = field_children(node, "name")
        .into_iter()
        .filter_map(|name| match name.kind() {
            "aliased_import" => {
                let item = name.child_by_field_name("name")?;
                let alias = name.child_by_field_name("alias")?;
                Some(ImportBinding::new(
                    compact(file, item),
                    Some(file.text(alias).to_string()),
                ))
            }
            _ => Some(ImportBinding::new(compact(file, name), None)),
        })
        .collect();

    ImportStatement::selective(specifier, span, bindings)
}

/// Node text with whitespace removed (`from . mod import` spacing varies).
fn compact(file: &ParsedFile, node: Node) -> String {
    file.text(node).chars().filter(|c| !c.is_whitespace()).collect()
}
