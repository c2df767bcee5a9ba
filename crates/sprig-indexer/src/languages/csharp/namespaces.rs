//! Project-wide namespace tree and extension-method index

use super::types::qualify;
use super::CSharpPlugin;
use sprig_core::FileId;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub(super) struct TypeEntry {
    /// Every file declaring a part of the type; more than one for `partial` types.
    pub files: BTreeSet<FileId>,
    pub members: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub(super) struct Extension {
    pub method: String,
    /// Id of the static class declaring it.
    pub class: String,
}

/// What a dotted name refers to in the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Target {
    Namespace(BTreeSet<FileId>),
    Type(String),
}

#[derive(Debug, Default)]
pub(super) struct NamespaceIndex {
    types: BTreeMap<String, TypeEntry>,
    /// Every declared namespace and its prefixes, with the files declaring
    /// types directly in it.
    namespaces: BTreeMap<String, BTreeSet<FileId>>,
    /// Extension methods by declaring namespace, `""` for the global one.
    extensions: BTreeMap<String, Vec<Extension>>,
    /// Namespaces imported by `global using` anywhere in the project.
    pub global_usings: Vec<String>,
}

impl NamespaceIndex {
    pub(super) fn build(plugin: &CSharpPlugin) -> Self {
        let mut index = NamespaceIndex::default();

        for file in plugin.files() {
            for decl in plugin.types_of(&file.id).iter() {
                let id = decl.id();
                let entry = index.types.entry(id.clone()).or_default();
                entry.files.insert(file.id.clone());
                entry.members.extend(decl.members.iter().cloned());

                let mut prefix = decl.namespace.as_str();
                index
                    .namespaces
                    .entry(prefix.to_string())
                    .or_default()
                    .insert(file.id.clone());
                while let Some((parent, _)) = prefix.rsplit_once('.') {
                    index.namespaces.entry(parent.to_string()).or_default();
                    prefix = parent;
                }

                for method in &decl.extension_methods {
                    index
                        .extensions
                        .entry(decl.namespace.clone())
                        .or_default()
                        .push(Extension {
                            method: method.clone(),
                            class: id.clone(),
                        });
                }
            }

            for using in plugin.usings_of(&file.id).iter().filter(|u| u.is_global) {
                if !index.global_usings.contains(&using.specifier) {
                    index.global_usings.push(using.specifier.clone());
                }
            }
        }

        tracing::debug!(
            "C# index: {} types in {} namespaces, {} global usings",
            index.types.len(),
            index.namespaces.len(),
            index.global_usings.len()
        );
        index
    }

    pub(super) fn type_entry(&self, id: &str) -> Option<&TypeEntry> {
        self.types.get(id)
    }

    /// Match a dotted name as a namespace, then a fully qualified type, then
    /// `Qualifier.Member` where the qualifier is a type.
    pub(super) fn resolve(&self, name: &str) -> Option<Target> {
        if let Some(files) = self.namespaces.get(name).filter(|_| !name.is_empty()) {
            return Some(Target::Namespace(files.clone()));
        }
        if self.types.contains_key(name) {
            return Some(Target::Type(name.to_string()));
        }
        let (qualifier, _) = name.rsplit_once('.')?;
        self.types
            .contains_key(qualifier)
            .then(|| Target::Type(qualifier.to_string()))
    }

    /// Type `name` as seen from `namespace`: the namespace itself, then each
    /// parent up to the global namespace.
    pub(super) fn lookup_from(&self, namespace: &str, name: &str) -> Option<String> {
        let mut scope = Some(namespace);
        while let Some(current) = scope {
            let id = qualify(current, name);
            if self.types.contains_key(&id) {
                return Some(id);
            }
            scope = match current.rsplit_once('.') {
                Some((parent, _)) => Some(parent),
                None if !current.is_empty() => Some(""),
                None => None,
            };
        }
        None
    }

    /// Extension methods named `method` declared in any of `namespaces`.
    /// The global namespace is always visible.
    pub(super) fn extensions_named<'i>(
        &'i self,
        method: &'i str,
        namespaces: &'i [String],
    ) -> impl Iterator<Item = &'i Extension> {
        self.extensions
            .iter()
            .filter(move |(ns, _)| ns.is_empty() || namespaces.contains(ns))
            .flat_map(|(_, list)| list.iter())
            .filter(move |ext| ext.method == method)
    }
}
