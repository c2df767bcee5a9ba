//! Python language plugin

mod exports;
mod imports;
mod modules;
mod stdlib;
mod usages;

use crate::plugin::{
    ExportedSymbol, ExternalModule, ImportStatement, LanguagePlugin, ModuleResolution, SymbolUsage,
};
use crate::project::{ParsedFile, Project};
use modules::ModuleTree;
use sprig_core::{CommentSyntax, ExternalOrigin, FileId, Language, Partial, RunCache};
use std::sync::{Arc, OnceLock};
use usages::Target;

const COMPLEXITY_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "while_statement",
    "for_statement",
    "with_statement",
    "try_statement",
    "except_clause",
    "conditional_expression",
    "boolean_operator",
    "if_clause",
];

pub struct PythonPlugin<'a> {
    project: &'a Project,
    exports: RunCache<FileId, Vec<ExportedSymbol>>,
    public_names: RunCache<FileId, Option<Vec<String>>>,
    imports: RunCache<FileId, Vec<ImportStatement>>,
    tree: OnceLock<ModuleTree>,
}

impl<'a> PythonPlugin<'a> {
    pub fn new(project: &'a Project) -> Self {
        PythonPlugin {
            project,
            exports: RunCache::new(),
            public_names: RunCache::new(),
            imports: RunCache::new(),
            tree: OnceLock::new(),
        }
    }

    fn tree(&self) -> &ModuleTree {
        self.tree.get_or_init(|| {
            let tree = ModuleTree::build(
                self.project
                    .files_in(&[Language::Python])
                    .map(|f| f.id.as_str()),
            );
            tracing::debug!("Python module tree built");
            tree
        })
    }

    fn exports_of(&self, id: &str) -> Arc<Vec<ExportedSymbol>> {
        self.exports.get_or_insert_with(&id.to_string(), || {
            self.project
                .file(id)
                .map(|f| exports::collect(f).value)
                .unwrap_or_default()
        })
    }

    fn public_names_of(&self, id: &str) -> Arc<Option<Vec<String>>> {
        self.public_names.get_or_insert_with(&id.to_string(), || {
            self.project.file(id).and_then(exports::public_names)
        })
    }

    fn imports_of(&self, id: &str) -> Arc<Vec<ImportStatement>> {
        self.imports.get_or_insert_with(&id.to_string(), || {
            self.project.file(id).map(imports::collect).unwrap_or_default()
        })
    }

    fn external_module(&self, specifier: &str) -> ExternalModule {
        let origin = if specifier.starts_with('.') {
            None
        } else if stdlib::is_stdlib(usages::head_of(specifier), self.project.python_version) {
            Some(ExternalOrigin::Stdlib)
        } else {
            Some(ExternalOrigin::ThirdParty)
        };
        ExternalModule {
            id: specifier.to_string(),
            origin,
        }
    }

    fn target_of(&self, from: &str, specifier: &str) -> Target {
        match self.tree().resolve(from, specifier) {
            Some(module) => Target::Internal(module),
            None => Target::External(self.external_module(specifier)),
        }
    }

    fn resolve_module(&self, from: &str, specifier: &str) -> ModuleResolution {
        match self.target_of(from, specifier) {
            // namespace directories resolve with no files
            Target::Internal(module) => {
                ModuleResolution::internal(self.tree().get(module).file.clone())
            }
            Target::External(module) => ModuleResolution::external(module.id, module.origin),
        }
    }
}

impl LanguagePlugin for PythonPlugin<'_> {
    fn resolve_exports(&self, file: &ParsedFile) -> Partial<Vec<ExportedSymbol>> {
        exports::collect(file)
    }

    fn resolve_imports(&self, file: &ParsedFile) -> Vec<ImportStatement> {
        self.imports_of(&file.id).as_ref().clone()
    }

    fn resolve_specifier(&self, specifier: &str, from: &ParsedFile) -> ModuleResolution {
        self.resolve_module(&from.id, specifier)
    }

    fn resolve_usages(
        &self,
        file: &ParsedFile,
        exports: &[ExportedSymbol],
        imports: &[ImportStatement],
    ) -> Vec<SymbolUsage> {
        usages::resolve(self, file, exports, imports)
    }

    fn complexity_kinds(&self) -> &'static [&'static str] {
        COMPLEXITY_KINDS
    }

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::HASH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ImportKind;
    use crate::tests::project_of;
    use sprig_core::SymbolKind;

    fn usages_of(project: &Project, id: &str) -> Vec<SymbolUsage> {
        let plugin = PythonPlugin::new(project);
        let file = project.file(id).unwrap();
        let exports = plugin.resolve_exports(file).value;
        let imports = plugin.resolve_imports(file);
        plugin.resolve_usages(file, &exports, &imports)
    }

    #[test]
    fn test_exports_and_public_list() {
        let project = project_of(&[(
            "shapes.py",
            r#"
import os

__all__ = ["Square", "area"]

@dataclass
class Square:
    side: int

def area(s):
    return s.side * s.side

a, (b, c) = 1, (2, 3)
limit: int = 10
x = y = 0
"#,
        )]);
        let plugin = PythonPlugin::new(&project);
        let file = project.file("shapes.py").unwrap();
        let exports = plugin.resolve_exports(file);

        assert!(exports.is_clean());
        let ids: Vec<_> = exports.value.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["Square", "area", "a", "b", "c", "limit", "x", "y"]);
        assert_eq!(exports.value[0].kind, SymbolKind::Class);
        let span = exports.value[0].span;
        assert!(file.source[span.start..span.end].starts_with("@dataclass"));

        assert_eq!(
            plugin.public_names_of("shapes.py").as_ref().clone(),
            Some(vec!["Square".to_string(), "area".to_string()])
        );
    }

    #[test]
    fn test_import_forms() {
        let project = project_of(&[(
            "main.py",
            "import os.path, numpy as np\nfrom ..pkg import mod as m, other\nfrom helpers import *\n",
        )]);
        let plugin = PythonPlugin::new(&project);
        let imports = plugin.resolve_imports(project.file("main.py").unwrap());

        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].specifier, "os.path");
        assert_eq!(imports[1].alias.as_deref(), Some("np"));
        assert_eq!(imports[2].kind, ImportKind::Selective);
        assert_eq!(imports[2].specifier, "..pkg");
        assert_eq!(imports[2].bindings[0].local(), "m");
        assert_eq!(imports[2].bindings[1].name, "other");
        assert!(imports[3].wildcard);
    }

    #[test]
    fn test_aliased_item_resolves_to_declaring_file() {
        let project = project_of(&[
            ("pkg/__init__.py", ""),
            ("pkg/mod.py", "def f():\n    return 1\n"),
            ("main.py", "from pkg.mod import f as g\n\ndef run():\n    return g()\n"),
        ]);
        let usages = usages_of(&project, "main.py");

        let edge = usages
            .iter()
            .find(|u| u.from.as_deref() == Some("run"))
            .unwrap();
        assert_eq!(edge.dependency.id, "pkg/mod.py");
        assert_eq!(edge.dependency.symbols.get("g").map(String::as_str), Some("f"));
    }

    #[test]
    fn test_reexports_are_followed() {
        let project = project_of(&[
            ("pkg/__init__.py", "from .core import Engine\n"),
            ("pkg/core.py", "class Engine:\n    pass\n"),
            ("app.py", "import pkg\n\ndef start():\n    return pkg.Engine()\n"),
        ]);
        let usages = usages_of(&project, "app.py");

        let edge = usages
            .iter()
            .find(|u| u.from.as_deref() == Some("start"))
            .unwrap();
        assert_eq!(edge.dependency.id, "pkg/core.py");
        assert_eq!(
            edge.dependency.symbols.get("pkg.Engine").map(String::as_str),
            Some("Engine")
        );
    }

    #[test]
    fn test_wildcard_respects_public_list() {
        let project = project_of(&[
            ("lib.py", "__all__ = [\"shown\"]\n\ndef shown(): pass\n\ndef hidden(): pass\n"),
            ("main.py", "from lib import *\n\ndef go():\n    shown()\n    hidden()\n"),
        ]);
        let usages = usages_of(&project, "main.py");

        let targets: Vec<_> = usages
            .iter()
            .filter(|u| u.from.as_deref() == Some("go"))
            .flat_map(|u| u.dependency.symbols.values().cloned())
            .collect();
        assert_eq!(targets, vec!["shown".to_string()]);
    }

    #[test]
    fn test_external_modules_carry_origin_and_items() {
        let project = project_of(&[(
            "main.py",
            "import os\nimport numpy as np\n\ndef run():\n    return np.array(os.sep)\n",
        )]);
        let usages = usages_of(&project, "main.py");

        let os = usages
            .iter()
            .find(|u| u.dependency.id == "os" && u.from.is_none())
            .unwrap();
        assert!(os.dependency.is_external);
        assert_eq!(os.dependency.origin, Some(ExternalOrigin::Stdlib));

        let numpy = usages
            .iter()
            .find(|u| u.dependency.id == "numpy" && u.from.as_deref() == Some("run"))
            .unwrap();
        assert_eq!(numpy.dependency.origin, Some(ExternalOrigin::ThirdParty));
        assert_eq!(
            numpy.dependency.symbols.get("np.array").map(String::as_str),
            Some("array")
        );
    }

    #[test]
    fn test_import_cycle_terminates() {
        let project = project_of(&[
            ("a.py", "from b import thing\n"),
            ("b.py", "from a import thing\n"),
            ("main.py", "from a import thing\n\ndef use():\n    thing()\n"),
        ]);
        let usages = usages_of(&project, "main.py");
        assert!(usages.iter().all(|u| u.from.is_none()));
    }
}
