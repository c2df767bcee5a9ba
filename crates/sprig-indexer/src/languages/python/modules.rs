//! Python module tree built from project paths
//!
//! Directories are namespace modules, `__init__.py` makes its directory a
//! package, and every other `.py` file is a module.

use sprig_core::FileId;
use std::collections::BTreeMap;

const PACKAGE_FILE: &str = "__init__.py";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ModuleKind {
    Namespace,
    Package,
    Module,
}

#[derive(Debug)]
pub(super) struct Module {
    /// Dotted path from the project root.
    pub full_name: String,
    pub kind: ModuleKind,
    /// Backing file, absent for namespace directories.
    pub file: Option<FileId>,
    children: BTreeMap<String, usize>,
    parent: Option<usize>,
}

pub(super) type ModuleRef = usize;

/// Arena of modules; index 0 is the root namespace.
#[derive(Debug)]
pub(super) struct ModuleTree {
    modules: Vec<Module>,
    by_file: BTreeMap<FileId, ModuleRef>,
}

impl ModuleTree {
    pub(super) fn build<'f>(files: impl IntoIterator<Item = &'f str>) -> Self {
        let mut tree = ModuleTree {
            modules: vec![Module {
                full_name: String::new(),
                kind: ModuleKind::Namespace,
                file: None,
                children: BTreeMap::new(),
                parent: None,
            }],
            by_file: BTreeMap::new(),
        };

        for id in files {
            let (dir, name) = id.rsplit_once('/').unwrap_or(("", id));
            let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
            let kind = if name == PACKAGE_FILE {
                ModuleKind::Package
            } else {
                parts.push(name.strip_suffix(".py").unwrap_or(name));
                ModuleKind::Module
            };

            let mut current = 0;
            for part in parts {
                current = tree.child_or_insert(current, part);
            }
            let module = &mut tree.modules[current];
            module.kind = kind;
            module.file = Some(id.to_string());
            tree.by_file.insert(id.to_string(), current);
        }

        tree
    }

    fn child_or_insert(&mut self, parent: ModuleRef, name: &str) -> ModuleRef {
        if let Some(&child) = self.modules[parent].children.get(name) {
            return child;
        }
        let full_name = match self.modules[parent].full_name.as_str() {
            "" => name.to_string(),
            prefix => format!("{prefix}.{name}"),
        };
        let index = self.modules.len();
        self.modules.push(Module {
            full_name,
            kind: ModuleKind::Namespace,
            file: None,
            children: BTreeMap::new(),
            parent: Some(parent),
        });
        self.modules[parent].children.insert(name.to_string(), index);
        index
    }

    pub(super) fn get(&self, module: ModuleRef) -> &Module {
        &self.modules[module]
    }

    pub(super) fn child(&self, module: ModuleRef, name: &str) -> Option<ModuleRef> {
        self.modules[module].children.get(name).copied()
    }

    pub(super) fn module_of_file(&self, id: &str) -> Option<ModuleRef> {
        self.by_file.get(id).copied()
    }

    /// The package a file's imports are relative to: the package itself for
    /// `__init__.py`, the containing module otherwise.
    fn package_of(&self, id: &str) -> Option<ModuleRef> {
        let module = self.module_of_file(id)?;
        match self.modules[module].kind {
            ModuleKind::Package => Some(module),
            _ => Some(self.modules[module].parent.unwrap_or(0)),
        }
    }

    fn descend(&self, from: ModuleRef, dotted: &str) -> Option<ModuleRef> {
        dotted
            .split('.')
            .filter(|part| !part.is_empty())
            .try_fold(from, |module, part| self.child(module, part))
    }

    /// Resolve an import specifier written in file `from`. Relative
    /// specifiers climb one package per extra leading dot; absolute ones are
    /// tried from the importing package up through its ancestors.
    pub(super) fn resolve(&self, from: &str, specifier: &str) -> Option<ModuleRef> {
        if specifier.is_empty() {
            return None;
        }
        let mut base = self.package_of(from)?;

        let level = specifier.chars().take_while(|&c| c == '.').count();
        if level > 0 {
            for _ in 1..level {
                base = self.modules[base].parent?;
            }
            return self.descend(base, &specifier[level..]);
        }

        let mut ancestor = Some(base);
        while let Some(current) = ancestor {
            if let Some(found) = self.descend(current, specifier) {
                return Some(found);
            }
            ancestor = self.modules[current].parent;
        }
        None
    }
}
