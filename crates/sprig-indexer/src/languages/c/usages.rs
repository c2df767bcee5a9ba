//! C usage resolver
//!
//! Every identifier inside a symbol's span is a candidate reference, and
//! macro bodies are tokenized with a regex. This over-approximates: a local
//! variable sharing a global's name produces an edge. That is accepted in
//! exchange for never missing a real use.

use super::CPlugin;
use crate::plugin::{ExportedSymbol, ImportStatement, SymbolUsage};
use crate::project::ParsedFile;
use crate::syntax::visit_within;
use regex::Regex;
use sprig_core::{DeclarationRole, FileId, SymbolKind};
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

static IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").ok());

pub(super) fn resolve(
    plugin: &CPlugin,
    file: &ParsedFile,
    exports: &[ExportedSymbol],
    imports: &[ImportStatement],
) -> Vec<SymbolUsage> {
    let mut usages = Vec::new();

    for include in imports {
        usages.extend(
            plugin
                .resolve_include(&include.specifier, file)
                .file_scope_usages(),
        );
    }

    let closure = plugin.include_closure(file);
    let visible: Vec<(&FileId, Arc<Vec<ExportedSymbol>>)> = closure
        .internal
        .iter()
        .map(|id| (id, plugin.exports_of(id)))
        .collect();
    let registry = plugin.registry();

    for symbol in exports {
        let from = Some(symbol.id.as_str());

        for name in candidates(file, symbol) {
            let included = visible.iter().find_map(|(id, symbols)| {
                symbols
                    .iter()
                    .find(|s| s.answers_to(&name))
                    .map(|s| (*id, s))
            });

            if let Some((target_file, target)) = included {
                usages.push(SymbolUsage::internal(from, target_file.clone(), &name, &target.id));
                if is_signature(target) {
                    if let Some(def) = registry.definition_of(&target.id, target_file) {
                        if def != &file.id {
                            let usage = SymbolUsage::internal(from, def.clone(), &name, &target.id);
                            usages.push(usage);
                        }
                    }
                }
            } else if let Some(own) = exports
                .iter()
                .find(|s| s.id != symbol.id && s.answers_to(&name))
            {
                usages.push(SymbolUsage::internal(from, file.id.clone(), &name, &own.id));
            }
        }

        // Definitions and their header signatures depend on each other.
        if symbol.kind != SymbolKind::Function {
            continue;
        }
        match symbol.role {
            DeclarationRole::Definition => {
                for (id, symbols) in &visible {
                    if symbols.iter().any(|s| s.id == symbol.id && is_signature(s)) {
                        let usage =
                            SymbolUsage::internal(from, (*id).clone(), &symbol.id, &symbol.id);
                        usages.push(usage);
                    }
                }
            }
            DeclarationRole::Signature => {
                if let Some(def) = registry.definition_of(&symbol.id, &file.id) {
                    usages.push(SymbolUsage::internal(from, def.clone(), &symbol.id, &symbol.id));
                }
            }
        }
    }

    usages
}

fn is_signature(symbol: &ExportedSymbol) -> bool {
    symbol.kind == SymbolKind::Function && symbol.role == DeclarationRole::Signature
}

/// Distinct names referenced inside the symbol's span, its own name excluded.
fn candidates(file: &ParsedFile, symbol: &ExportedSymbol) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    visit_within(file.root(), &symbol.span, &mut |node| {
        match node.kind() {
            "identifier" | "type_identifier" => {
                names.insert(file.text(node).to_string());
            }
            "preproc_arg" => {
                if let Some(re) = IDENTIFIER.as_ref() {
                    names.extend(re.find_iter(file.text(node)).map(|m| m.as_str().to_string()));
                }
            }
            _ => {}
        }
        true
    });
    names.remove(&symbol.name);
    names
}
