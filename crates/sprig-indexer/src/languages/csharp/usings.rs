//! `using` directive collection

use super::types::dotted;
use crate::plugin::{ImportBinding, ImportStatement};
use crate::project::{node_span, ParsedFile};
use crate::syntax::{has_child_kind, named_children, visit_all};

const NAME_KINDS: &[&str] = &[
    "identifier",
    "qualified_name",
    "generic_name",
    "alias_qualified_name",
];

pub(super) fn collect(file: &ParsedFile) -> Vec<ImportStatement> {
    let mut usings = Vec::new();

    visit_all(file.root(), &mut |node| match node.kind() {
        "using_directive" => {
            if let Some(using) = directive(file, node) {
                usings.push(using);
            }
            false
        }
        "compilation_unit" | "namespace_declaration" | "file_scoped_namespace_declaration"
        | "declaration_list" => true,
        _ => false,
    });

    usings
}

fn directive(file: &ParsedFile, node: tree_sitter::Node) -> Option<ImportStatement> {
    let alias = node.child_by_field_name("name");
    let alias_id = alias.map(|a| a.id());
    let target = named_children(node)
        .into_iter()
        .find(|child| NAME_KINDS.contains(&child.kind()) && Some(child.id()) != alias_id)?;
    let target = dotted(file, target);
    let span = node_span(node);

    let mut using = match alias {
        // `using X = A.B.C;` binds C from A.B as X
        Some(alias) => {
            let (specifier, name) = target
                .rsplit_once('.')
                .map_or((String::new(), target.clone()), |(q, n)| (q.to_string(), n.to_string()));
            ImportStatement::selective(
                specifier,
                span,
                vec![ImportBinding::new(name, Some(file.text(alias).to_string()))],
            )
        }
        None => ImportStatement::normal(target, span).wildcard(),
    };
    using.is_static = has_child_kind(node, "static");
    using.is_global = has_child_kind(node, "global");
    Some(using)
}

/// Full dotted target of an alias using.
pub(super) fn alias_target(using: &ImportStatement) -> Option<(&str, String)> {
    let binding = using.bindings.first()?;
    let local = binding.alias.as_deref()?;
    let full = if using.specifier.is_empty() {
        binding.name.clone()
    } else {
        format!("{}.{}", using.specifier, binding.name)
    };
    Some((local, full))
}
