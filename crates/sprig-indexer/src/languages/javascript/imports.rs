//! JS/TS import collection: ES imports, re-exports, `require` and dynamic `import()`

use super::exports::{unquote, DEFAULT_EXPORT};
use crate::plugin::{ImportBinding, ImportStatement};
use crate::project::{node_span, ParsedFile};
use crate::syntax::{has_child_kind, named_children, visit_all};
use tree_sitter::Node;

pub(super) fn collect(file: &ParsedFile) -> Vec<ImportStatement> {
    let mut imports = Vec::new();

    visit_all(file.root(), &mut |node| match node.kind() {
        "import_statement" => {
            imports.extend(import_statement(file, node));
            false
        }
        "export_statement" => {
            if let Some(reexport) = reexport(file, node) {
                imports.push(reexport);
                return false;
            }
            true
        }
        "variable_declarator" => {
            match node.child_by_field_name("value").and_then(|v| required_specifier(file, v)) {
                Some(specifier) => {
                    imports.push(required(file, node, specifier));
                    false
                }
                None => true,
            }
        }
        "call_expression" => {
            if let Some(specifier) = required_specifier(file, node) {
                imports.push(ImportStatement::normal(specifier, node_span(node)));
            }
            true
        }
        _ => true,
    });

    imports
}

fn source_of(file: &ParsedFile, node: Node) -> Option<String> {
    node.child_by_field_name("source")
        .map(|s| unquote(file.text(s)).to_string())
}

/// `import d, { a as b } from 's'`, `import * as ns from 's'`, `import 's'`.
fn import_statement(file: &ParsedFile, node: Node) -> Vec<ImportStatement> {
    let Some(specifier) = source_of(file, node) else {
        return Vec::new();
    };
    let span = node_span(node);
    let mut bindings = Vec::new();
    let mut namespace = None;

    for clause in named_children(node).into_iter().filter(|n| n.kind() == "import_clause") {
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => bindings.push(ImportBinding::new(
                    DEFAULT_EXPORT,
                    Some(file.text(part).to_string()),
                )),
                "named_imports" => {
                    for item in named_children(part)
                        .into_iter()
                        .filter(|n| n.kind() == "import_specifier")
                    {
                        let Some(name) = item.child_by_field_name("name") else {
                            continue;
                        };
                        let alias = item
                            .child_by_field_name("alias")
                            .map(|a| file.text(a).to_string());
                        bindings.push(ImportBinding::new(unquote(file.text(name)), alias));
                    }
                }
                "namespace_import" => {
                    namespace = named_children(part)
                        .into_iter()
                        .find(|n| n.kind() == "identifier")
                        .map(|n| file.text(n).to_string());
                }
                _ => {}
            }
        }
    }

    let mut statements = Vec::new();
    if !bindings.is_empty() {
        statements.push(ImportStatement::selective(specifier.clone(), span, bindings));
    }
    if let Some(namespace) = namespace {
        statements.push(ImportStatement::normal(specifier.clone(), span).aliased(namespace));
    }
    if statements.is_empty() {
        statements.push(ImportStatement::normal(specifier, span));
    }
    statements
}

/// `export * from 's'`, `export * as ns from 's'`, `export { a as b } from 's'`.
fn reexport(file: &ParsedFile, node: Node) -> Option<ImportStatement> {
    let specifier = source_of(file, node)?;
    let span = node_span(node);

    let mut statement = if let Some(namespace) = named_children(node)
        .into_iter()
        .find(|n| n.kind() == "namespace_export")
    {
        let alias = named_children(namespace)
            .into_iter()
            .next()
            .map(|n| unquote(file.text(n)).to_string())
            .unwrap_or_default();
        ImportStatement::normal(specifier, span).aliased(alias)
    } else if let Some(clause) = named_children(node)
        .into_iter()
        .find(|n| n.kind() == "export_clause")
    {
        let bindings = named_children(clause)
            .into_iter()
            .filter(|n| n.kind() == "export_specifier")
            .filter_map(|item| {
                let name = item.child_by_field_name("name")?;
                let alias = item
                    .child_by_field_name("alias")
                    .map(|a| unquote(file.text(a)).to_string());
                Some(ImportBinding::new(unquote(file.text(name)), alias))
            })
            .collect();
        ImportStatement::selective(specifier, span, bindings)
    } else if has_child_kind(node, "*") {
        ImportStatement::selective(specifier, span, Vec::new()).wildcard()
    } else {
        return None;
    };

    statement.reexport = true;
    Some(statement)
}

/// `const x = require('s')` binds the module; `const { a, b: c } = require('s')` binds items.
fn required(file: &ParsedFile, declarator: Node, specifier: String) -> ImportStatement {
    let span = node_span(declarator);
    let Some(pattern) = declarator.child_by_field_name("name") else {
        return ImportStatement::normal(specifier, span);
    };

    match pattern.kind() {
        "identifier" => ImportStatement::normal(specifier, span).aliased(file.text(pattern)),
        "object_pattern" => {
            let bindings = named_children(pattern)
                .into_iter()
                .filter_map(|property| match property.kind() {
                    "shorthand_property_identifier_pattern" => {
                        Some(ImportBinding::new(file.text(property), None))
                    }
                    "pair_pattern" => {
                        let key = property.child_by_field_name("key")?;
                        let value = property.child_by_field_name("value")?;
                        Some(ImportBinding::new(
                            unquote(file.text(key)),
                            Some(file.text(value).to_string()),
                        ))
                    }
                    _ => None,
                })
                .collect();
            ImportStatement::selective(specifier, span, bindings)
        }
        _ => ImportStatement::normal(specifier, span),
    }
}

/// The specifier of `require('s')` or `import('s')`, if `node` is such a call.
pub(super) fn required_specifier(file: &ParsedFile, node: Node) -> Option<String> {
    if node.kind() != "call_expression" {
        return None;
    }
    let function = node.child_by_field_name("function")?;
    let is_loader = match function.kind() {
        "import" => true,
        "identifier" => file.text(function) == "require",
        _ => false,
    };
    if !is_loader {
        return None;
    }
    let argument = named_children(node.child_by_field_name("arguments")?)
        .into_iter()
        .next()
        .filter(|a| a.kind() == "string")?;
    Some(unquote(file.text(argument)).to_string())
}
