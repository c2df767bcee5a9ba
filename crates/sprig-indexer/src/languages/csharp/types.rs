//! C# type declarations under (possibly nested) namespaces

use crate::plugin::ExportedSymbol;
use crate::project::{node_span, ParsedFile};
use crate::syntax::named_children;
use sprig_core::{Partial, Span, SprigError, SymbolKind};
use tree_sitter::Node;

/// A namespace-level type with the member names other files may reach.
#[derive(Debug, Clone)]
pub(super) struct TypeDecl {
    pub namespace: String,
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
    pub members: Vec<String>,
    /// Static methods whose first parameter carries `this`.
    pub extension_methods: Vec<String>,
}

impl TypeDecl {
    pub fn id(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn to_export(&self) -> ExportedSymbol {
        ExportedSymbol::new(self.id(), self.kind, self.span).with_name(self.name.clone())
    }
}

/// `namespace.name`, or `name` in the global namespace.
pub(super) fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Dotted name text with any interior whitespace removed.
pub(super) fn dotted(file: &ParsedFile, node: Node) -> String {
    file.text(node).split_whitespace().collect()
}

pub(super) fn collect(file: &ParsedFile) -> Partial<Vec<TypeDecl>> {
    let mut types = Vec::new();
    let mut issues = Vec::new();
    visit(file, file.root(), "", &mut types, &mut issues);
    Partial::with_issues(types, issues)
}

fn visit(
    file: &ParsedFile,
    node: Node,
    namespace: &str,
    types: &mut Vec<TypeDecl>,
    issues: &mut Vec<SprigError>,
) {
    // A file-scoped namespace applies to every declaration after it.
    let mut current = namespace.to_string();

    for child in named_children(node) {
        match child.kind() {
            "namespace_declaration" => {
                let inner = child
                    .child_by_field_name("name")
                    .map(|n| qualify(namespace, &dotted(file, n)))
                    .unwrap_or_else(|| namespace.to_string());
                if let Some(body) = child.child_by_field_name("body") {
                    visit(file, body, &inner, types, issues);
                }
            }
            "file_scoped_namespace_declaration" => {
                if let Some(name) = child.child_by_field_name("name") {
                    current = qualify(namespace, &dotted(file, name));
                }
                visit(file, child, &current, types, issues);
            }
            kind => {
                if let Some(symbol_kind) = type_kind(kind) {
                    match declare(file, child, &current, symbol_kind) {
                        Some(decl) => types.push(decl),
                        None => {
                            let reason = format!(
                                "{} at line {} has no identifier",
                                kind,
                                child.start_position().row + 1
                            );
                            tracing::warn!("{}: {}", file.id, reason);
                            issues.push(SprigError::Resolution {
                                file: file.id.clone(),
                                reason,
                            });
                        }
                    }
                }
            }
        }
    }
}

fn type_kind(kind: &str) -> Option<SymbolKind> {
    match kind {
        "class_declaration" => Some(SymbolKind::Class),
        "struct_declaration" => Some(SymbolKind::Struct),
        "interface_declaration" => Some(SymbolKind::Interface),
        "enum_declaration" => Some(SymbolKind::Enum),
        "record_declaration" | "record_struct_declaration" => Some(SymbolKind::Record),
        "delegate_declaration" => Some(SymbolKind::Delegate),
        _ => None,
    }
}

fn declare(file: &ParsedFile, node: Node, namespace: &str, kind: SymbolKind) -> Option<TypeDecl> {
    let name = node.child_by_field_name("name")?;
    let mut decl = TypeDecl {
        namespace: namespace.to_string(),
        name: file.text(name).to_string(),
        kind,
        span: node_span(node),
        members: Vec::new(),
        extension_methods: Vec::new(),
    };

    let Some(body) = node.child_by_field_name("body") else {
        return Some(decl);
    };
    for member in named_children(body) {
        match member.kind() {
            "method_declaration" => {
                if let Some(name) = member.child_by_field_name("name") {
                    let name = file.text(name).to_string();
                    if is_extension(file, member) {
                        decl.extension_methods.push(name.clone());
                    }
                    decl.members.push(name);
                }
            }
            "property_declaration" | "event_declaration" | "enum_member_declaration" => {
                if let Some(name) = member.child_by_field_name("name") {
                    decl.members.push(file.text(name).to_string());
                }
            }
            "field_declaration" | "event_field_declaration" => {
                for declaration in named_children(member)
                    .into_iter()
                    .filter(|n| n.kind() == "variable_declaration")
                {
                    for declarator in named_children(declaration)
                        .into_iter()
                        .filter(|n| n.kind() == "variable_declarator")
                    {
                        let name = declarator.child_by_field_name("name").or_else(|| {
                            named_children(declarator)
                                .into_iter()
                                .find(|n| n.kind() == "identifier")
                        });
                        if let Some(name) = name {
                            decl.members.push(file.text(name).to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Some(decl)
}

fn is_extension(file: &ParsedFile, method: Node) -> bool {
    method
        .child_by_field_name("parameters")
        .and_then(|params| {
            named_children(params)
                .into_iter()
                .find(|p| p.kind() == "parameter")
        })
        .is_some_and(|first| file.text(first).trim_start().starts_with("this "))
}

