//! C# language plugin

mod namespaces;
mod types;
mod usages;
mod usings;

use crate::plugin::{ExportedSymbol, ImportStatement, LanguagePlugin, ModuleResolution, SymbolUsage};
use crate::project::{ParsedFile, Project};
use namespaces::{NamespaceIndex, Target};
use sprig_core::{FileId, Language, Partial, RunCache};
use std::sync::{Arc, OnceLock};
use types::TypeDecl;

const COMPLEXITY_KINDS: &[&str] = &[
    "if_statement",
    "while_statement",
    "for_statement",
    "foreach_statement",
    "do_statement",
    "switch_section",
    "conditional_expression",
    "try_statement",
    "catch_clause",
    "finally_clause",
];

pub struct CSharpPlugin<'a> {
    project: &'a Project,
    types: RunCache<FileId, Vec<TypeDecl>>,
    usings: RunCache<FileId, Vec<ImportStatement>>,
    index: OnceLock<NamespaceIndex>,
}

impl<'a> CSharpPlugin<'a> {
    pub fn new(project: &'a Project) -> Self {
        CSharpPlugin {
            project,
            types: RunCache::new(),
            usings: RunCache::new(),
            index: OnceLock::new(),
        }
    }

    fn files(&self) -> impl Iterator<Item = &'a ParsedFile> {
        self.project.files_in(&[Language::CSharp])
    }

    fn types_of(&self, id: &str) -> Arc<Vec<TypeDecl>> {
        self.types.get_or_insert_with(&id.to_string(), || {
            self.project
                .file(id)
                .map(|f| types::collect(f).value)
                .unwrap_or_default()
        })
    }

    fn usings_of(&self, id: &str) -> Arc<Vec<ImportStatement>> {
        self.usings.get_or_insert_with(&id.to_string(), || {
            self.project.file(id).map(usings::collect).unwrap_or_default()
        })
    }

    fn index(&self) -> &NamespaceIndex {
        self.index.get_or_init(|| NamespaceIndex::build(self))
    }

    /// Resolve a dotted namespace or type name against the project.
    fn resolve_name(&self, name: &str) -> ModuleResolution {
        match self.index().resolve(name) {
            Some(Target::Namespace(files)) => ModuleResolution::internal(files),
            Some(Target::Type(id)) => match self.index().type_entry(&id) {
                Some(entry) => ModuleResolution::internal(entry.files.iter().cloned()),
                None => ModuleResolution::external(name, None),
            },
            None => ModuleResolution::external(name, None),
        }
    }
}

impl LanguagePlugin for CSharpPlugin<'_> {
    fn resolve_exports(&self, file: &ParsedFile) -> Partial<Vec<ExportedSymbol>> {
        let types = types::collect(file);
        Partial::with_issues(
            types.value.iter().map(TypeDecl::to_export).collect(),
            types.issues,
        )
    }

    fn resolve_imports(&self, file: &ParsedFile) -> Vec<ImportStatement> {
        self.usings_of(&file.id).as_ref().clone()
    }

    fn resolve_specifier(&self, specifier: &str, _from: &ParsedFile) -> ModuleResolution {
        self.resolve_name(specifier)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ImportKind;
    use crate::tests::project_of;
    use sprig_core::SymbolKind;

    #[test]
    fn test_nested_and_file_scoped_namespaces() {
        let project = project_of(&[
            (
                "Models.cs",
                r#"
namespace Shop
{
    namespace Models
    {
        public class Order { }
        public record Line(int Qty);
    }
    public interface IRepo { }
}
public delegate void Handler();
"#,
            ),
            (
                "Scoped.cs",
                "namespace Shop.Billing;\n\npublic class Invoice { }\npublic enum State { Open, Paid }\n",
            ),
        ]);
        let plugin = CSharpPlugin::new(&project);

        let models = plugin.resolve_exports(project.file("Models.cs").unwrap());
        let ids: Vec<_> = models.value.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["Shop.Models.Order", "Shop.Models.Line", "Shop.IRepo", "Handler"]);
        assert_eq!(models.value[1].kind, SymbolKind::Record);
        assert_eq!(models.value[0].name, "Order");

        let scoped = plugin.resolve_exports(project.file("Scoped.cs").unwrap());
        let ids: Vec<_> = scoped.value.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["Shop.Billing.Invoice", "Shop.Billing.State"]);
    }

    #[test]
    fn test_using_forms() {
        let project = project_of(&[(
            "Program.cs",
            "global using System.Text;\nusing System;\nusing static System.Math;\nusing Json = Newtonsoft.Json.JsonConvert;\n\nclass Program { }\n",
        )]);
        let plugin = CSharpPlugin::new(&project);
        let usings = plugin.resolve_imports(project.file("Program.cs").unwrap());

        assert_eq!(usings.len(), 4);
        assert!(usings[0].is_global);
        assert_eq!(usings[0].specifier, "System.Text");
        assert_eq!(usings[1].kind, ImportKind::Normal);
        assert!(usings[1].wildcard);
        assert!(usings[2].is_static);
        assert_eq!(usings[2].specifier, "System.Math");
        assert_eq!(usings[3].kind, ImportKind::Selective);
        assert_eq!(usings[3].specifier, "Newtonsoft.Json");
        assert_eq!(usings[3].bindings[0].name, "JsonConvert");
        assert_eq!(usings[3].bindings[0].local(), "Json");
    }

    #[test]
    fn test_namespace_spanning_files() {
        let project = project_of(&[
            ("A.cs", "namespace Shared { class A { } }\n"),
            ("B.cs", "namespace Shared { partial class B { } }\n"),
            ("C.cs", "namespace Other { class C { } }\n"),
        ]);
        let plugin = CSharpPlugin::new(&project);
        let from = project.file("C.cs").unwrap();

        let shared = plugin.resolve_specifier("Shared", from);
        assert_eq!(shared.files.len(), 2);
        assert!(!shared.is_external());

        let class = plugin.resolve_specifier("Other.C", from);
        assert!(class.files.contains("C.cs"));

        assert!(plugin.resolve_specifier("System.IO", from).is_external());
    }
}
