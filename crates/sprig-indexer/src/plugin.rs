//! The contract every language plugin implements

use crate::project::ParsedFile;
use sprig_core::{
    CommentSyntax, DeclarationRole, DependencyInfo, ExternalOrigin, FileId, Partial, Span,
    SymbolId, SymbolKind,
};
use std::collections::BTreeSet;

/// A top-level declaration found by an export resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedSymbol {
    /// Qualified id, unique within the file once same-id entries are merged.
    pub id: SymbolId,
    /// Unqualified name as written at the declaration.
    pub name: String,
    pub kind: SymbolKind,
    pub role: DeclarationRole,
    pub span: Span,
    /// Whether other files may import it. Unexported symbols still take
    /// part in same-file edges.
    pub exported: bool,
    /// Extra names that resolve to this symbol: export aliases, C struct
    /// tags behind a typedef, enumerators.
    pub aliases: Vec<String>,
}

impl ExportedSymbol {
    pub fn new(id: impl Into<SymbolId>, kind: SymbolKind, span: Span) -> Self {
        let id = id.into();
        ExportedSymbol {
            name: id.clone(),
            id,
            kind,
            role: DeclarationRole::Definition,
            span,
            exported: true,
            aliases: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_role(mut self, role: DeclarationRole) -> Self {
        self.role = role;
        self
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// Binds a whole module or namespace.
    Normal,
    /// Binds named items.
    Selective,
}

/// One imported item: `name` in the target, bound locally as `alias` if set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportBinding {
    pub fn new(name: impl Into<String>, alias: Option<String>) -> Self {
        ImportBinding {
            name: name.into(),
            alias,
        }
    }

    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// An import statement with its specifier kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub kind: ImportKind,
    pub specifier: String,
    pub span: Span,
    pub bindings: Vec<ImportBinding>,
    /// Binds every export of the target without naming them.
    pub wildcard: bool,
    /// Local name bound to the module itself (`import x as y`, `import * as ns`).
    pub alias: Option<String>,
    /// C# `using static`.
    pub is_static: bool,
    /// C# `global using`.
    pub is_global: bool,
    /// JS `export ... from`.
    pub reexport: bool,
}

impl ImportStatement {
    pub fn normal(specifier: impl Into<String>, span: Span) -> Self {
        ImportStatement {
            kind: ImportKind::Normal,
            specifier: specifier.into(),
            span,
            bindings: Vec::new(),
            wildcard: false,
            alias: None,
            is_static: false,
            is_global: false,
            reexport: false,
        }
    }

    pub fn selective(
        specifier: impl Into<String>,
        span: Span,
        bindings: Vec<ImportBinding>,
    ) -> Self {
        ImportStatement {
            kind: ImportKind::Selective,
            bindings,
            ..Self::normal(specifier, span)
        }
    }

    pub fn wildcard(mut self) -> Self {
        self.wildcard = true;
        self
    }

    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// An external module a specifier resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalModule {
    pub id: String,
    pub origin: Option<ExternalOrigin>,
}

/// Where a specifier points. Zero matching files means external; an
/// internal resolution may still have an empty file set (namespace packages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResolution {
    pub files: BTreeSet<FileId>,
    pub external: Option<ExternalModule>,
}

impl ModuleResolution {
    pub fn internal(files: impl IntoIterator<Item = FileId>) -> Self {
        ModuleResolution {
            files: files.into_iter().collect(),
            external: None,
        }
    }

    pub fn external(id: impl Into<String>, origin: Option<ExternalOrigin>) -> Self {
        ModuleResolution {
            files: BTreeSet::new(),
            external: Some(ExternalModule {
                id: id.into(),
                origin,
            }),
        }
    }

    pub fn is_external(&self) -> bool {
        self.external.is_some()
    }

    /// File-scope dependencies on every resolved file (or the external module).
    pub fn file_scope_usages(&self) -> Vec<SymbolUsage> {
        match &self.external {
            Some(module) => vec![SymbolUsage::file_scope(DependencyInfo::external(
                module.id.clone(),
                module.origin,
            ))],
            None => self
                .files
                .iter()
                .map(|file| SymbolUsage::file_scope(DependencyInfo::internal(file.clone())))
                .collect(),
        }
    }
}

/// One resolved use. `from` is `None` for file-scope usages, which only
/// count towards the file summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolUsage {
    pub from: Option<SymbolId>,
    pub dependency: DependencyInfo,
}

impl SymbolUsage {
    pub fn file_scope(dependency: DependencyInfo) -> Self {
        SymbolUsage {
            from: None,
            dependency,
        }
    }

    /// `from` uses `symbol` of `file`, referred to locally as `local`.
    pub fn internal(
        from: Option<&str>,
        file: impl Into<FileId>,
        local: impl Into<String>,
        symbol: impl Into<SymbolId>,
    ) -> Self {
        SymbolUsage {
            from: from.map(str::to_string),
            dependency: DependencyInfo::internal(file).with_symbol(local, symbol),
        }
    }

    /// `from` uses `file` as a whole (a module, not one of its symbols).
    pub fn module(from: Option<&str>, file: impl Into<FileId>) -> Self {
        SymbolUsage {
            from: from.map(str::to_string),
            dependency: DependencyInfo::internal(file),
        }
    }

    pub fn external(
        from: Option<&str>,
        module: &ExternalModule,
        item: Option<(&str, &str)>,
    ) -> Self {
        let mut dependency = DependencyInfo::external(module.id.clone(), module.origin);
        if let Some((local, name)) = item {
            dependency = dependency.with_symbol(local, name);
        }
        SymbolUsage {
            from: from.map(str::to_string),
            dependency,
        }
    }
}

/// Per-language export, import, module and usage resolution.
///
/// A plugin borrows the project for one run and memoizes inside itself;
/// nothing it caches outlives the plugin.
pub trait LanguagePlugin: Send + Sync {
    /// Top-level declarations of `file`. Declarations whose identifier
    /// cannot be located are reported as issues; the rest are returned.
    fn resolve_exports(&self, file: &ParsedFile) -> Partial<Vec<ExportedSymbol>>;

    /// Import statements of `file`, specifiers unresolved.
    fn resolve_imports(&self, file: &ParsedFile) -> Vec<ImportStatement>;

    /// Map a specifier written in `from` to project files or an external module.
    fn resolve_specifier(&self, specifier: &str, from: &ParsedFile) -> ModuleResolution;

    /// Resolved uses made by each exported symbol of `file`, plus file-scope uses.
    fn resolve_usages(
        &self,
        file: &ParsedFile,
        exports: &[ExportedSymbol],
        imports: &[ImportStatement],
    ) -> Vec<SymbolUsage>;

    /// Node kinds counted as control flow.
    fn complexity_kinds(&self) -> &'static [&'static str];

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::C_STYLE
    }
}
