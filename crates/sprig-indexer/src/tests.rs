//! Cross-plugin scenarios run through the coordinator

use crate::coordinator::{analyze, Coordinator};
use crate::parser_pool::ParserPool;
use crate::project::{Project, SourceFile};
use sprig_core::{ExternalOrigin, Manifest, PythonVersion};
use std::path::Path;

/// Parse `files` (id, source) into a project. Panics on parse failures.
pub fn project_of(files: &[(&str, &str)]) -> Project {
    let sources = files
        .iter()
        .map(|(id, source)| SourceFile::detect(*id, *source).unwrap())
        .collect();
    let coordinator = Coordinator::with_pool(ParserPool::new(2));
    let (project, diagnostics) =
        coordinator.parse(Path::new("."), sources, PythonVersion::default());
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    project
}

fn manifest_of(files: &[(&str, &str)]) -> Manifest {
    analyze(&project_of(files)).unwrap().manifest
}

#[test]
fn test_c_header_and_implementation() {
    let manifest = manifest_of(&[
        (
            "burgers.h",
            "#ifndef BURGERS_H\n#define BURGERS_H\ntypedef struct { int id; } Burger;\nBurger *create_burger(int id);\n#endif\n",
        ),
        (
            "burgers.c",
            "#include \"burgers.h\"\n#include <stdlib.h>\n\nBurger *create_burger(int id) {\n    Burger *b = malloc(sizeof(Burger));\n    b->id = id;\n    return b;\n}\n",
        ),
        (
            "main.c",
            "#include <stdio.h>\n#include \"burgers.h\"\n\nint main(void) {\n    Burger *b = create_burger(1);\n    printf(\"%d\\n\", b->id);\n    return 0;\n}\n",
        ),
    ]);

    let main_file = manifest.file("main.c").unwrap();
    assert!(main_file.dependencies.contains_key("burgers.h"));
    assert!(main_file.dependencies.contains_key("burgers.c"));
    assert!(main_file.dependencies["<stdio.h>"].is_external);

    let main = manifest.symbol("main.c", "main").unwrap();
    assert!(main.dependencies["burgers.h"].symbols.contains_key("create_burger"));
    assert!(main.dependencies["burgers.h"].symbols.contains_key("Burger"));
    assert!(main.dependencies["burgers.c"].symbols.contains_key("create_burger"));

    let definition = manifest.symbol("burgers.c", "create_burger").unwrap();
    assert!(definition.dependents["main.c"].symbols.contains_key("main"));
}

#[test]
fn test_csharp_same_name_in_two_namespaces() {
    let manifest = manifest_of(&[
        (
            "Food.cs",
            r#"
using System;

namespace Food.Burgers
{
    public class Bun { }
    public class Burger { public Bun Top; }
}

namespace Food.Hotdogs
{
    public class Bun { }
    public class Hotdog { public Bun Wrap; }
}
"#,
        ),
        (
            "Extensions.cs",
            r#"
namespace Food.Extras
{
    public class Cheese { }
    public static class CheeseExtensions
    {
        public static void Melt(this Cheese cheese) { }
    }
}
"#,
        ),
        (
            "Program.cs",
            r#"
using Food.Extras;

class Program
{
    static void Main()
    {
        var slice = new Cheese();
        slice.Melt();
    }
}
"#,
        ),
    ]);

    let burger = manifest.symbol("Food.cs", "Food.Burgers.Burger").unwrap();
    let targets: Vec<_> = burger.internal_targets().collect();
    assert_eq!(targets, vec![("Food.cs", "Food.Burgers.Bun")]);

    let hotdog = manifest.symbol("Food.cs", "Food.Hotdogs.Hotdog").unwrap();
    let targets: Vec<_> = hotdog.internal_targets().collect();
    assert_eq!(targets, vec![("Food.cs", "Food.Hotdogs.Bun")]);

    let program = manifest.symbol("Program.cs", "Program").unwrap();
    let targets: Vec<_> = program.internal_targets().map(|(_, s)| s).collect();
    assert!(targets.contains(&"Food.Extras.Cheese"));
    assert!(targets.contains(&"Food.Extras.CheeseExtensions"));

    let food = manifest.file("Food.cs").unwrap();
    assert!(food.dependencies["System"].is_external);
}

#[test]
fn test_csharp_partial_class_links_every_part() {
    let manifest = manifest_of(&[
        ("A.cs", "namespace N { public partial class B { public void F() { } } }\n"),
        ("B.cs", "namespace N { public partial class B { public void G() { } } }\n"),
        (
            "P.cs",
            "namespace N { class P { void Run() { var b = new B(); b.G(); } } }\n",
        ),
    ]);

    let p = manifest.symbol("P.cs", "N.P").unwrap();
    let targets: Vec<_> = p.internal_targets().collect();
    assert_eq!(targets, vec![("A.cs", "N.B"), ("B.cs", "N.B")]);

    let first = manifest.symbol("A.cs", "N.B").unwrap();
    assert!(first.dependencies["B.cs"].symbols.contains_key("B"));
    let second = manifest.symbol("B.cs", "N.B").unwrap();
    assert!(second.dependents["A.cs"].symbols.contains_key("N.B"));
}

#[test]
fn test_python_aliases_and_stdlib() {
    let manifest = manifest_of(&[
        ("pkg/__init__.py", ""),
        ("pkg/mod.py", "def f():\n    return 1\n"),
        (
            "main.py",
            "import os\nfrom pkg.mod import f as g\n\ndef run():\n    return g(), os.getcwd()\n",
        ),
    ]);

    let run = manifest.symbol("main.py", "run").unwrap();
    assert_eq!(
        run.dependencies["pkg/mod.py"].symbols.get("g").map(String::as_str),
        Some("f")
    );
    assert_eq!(run.dependencies["os"].origin, Some(ExternalOrigin::Stdlib));

    let f = manifest.symbol("pkg/mod.py", "f").unwrap();
    assert!(f.dependents["main.py"].symbols.contains_key("run"));
}

#[test]
fn test_javascript_default_and_named_imports() {
    let manifest = manifest_of(&[
        ("lib.js", "export default function make() {}\nexport const a = 1;\n"),
        (
            "app.js",
            "import make, { a } from './lib';\nimport chunk from 'lodash/chunk';\n\nexport function run() {\n    return chunk([make(), a]);\n}\n",
        ),
    ]);

    let run = manifest.symbol("app.js", "run").unwrap();
    let lib = &run.dependencies["lib.js"];
    assert_eq!(lib.symbols.get("make").map(String::as_str), Some("make"));
    assert_eq!(lib.symbols.get("a").map(String::as_str), Some("a"));

    let lodash = &run.dependencies["lodash"];
    assert!(lodash.is_external);
    assert_eq!(lodash.symbols.get("chunk").map(String::as_str), Some("default"));
}

#[test]
fn test_mixed_project_is_deterministic() {
    let files = [
        ("a.py", "from b import x\n\ndef y():\n    return x\n"),
        ("b.py", "x = 1\n"),
        ("index.ts", "import { z } from './z';\nexport const w = z;\n"),
        ("z.ts", "export const z = 2;\n"),
    ];
    let first = manifest_of(&files).to_json_pretty().unwrap();
    let second = manifest_of(&files).to_json_pretty().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_metrics_follow_merged_spans() {
    let manifest = manifest_of(&[(
        "util.c",
        "int twice(int x);\n\nint twice(int x) {\n    if (x > 0) {\n        return x * 2;\n    }\n    return 0;\n}\n",
    )]);

    let twice = manifest.symbol("util.c", "twice").unwrap();
    assert_eq!(twice.spans.len(), 2);
    // the definition is primary
    assert_eq!(twice.spans[0].start_row, 2);
    assert_eq!(twice.metrics.cyclomatic_complexity, 1);
    assert_eq!(manifest.file("util.c").unwrap().metrics.cyclomatic_complexity, 1);
}
