//! Size and complexity measures for files and symbols
//!
//! Raw counts come from the span itself. Code counts strip blank lines,
//! comment-only lines and block-comment interiors using a small lexical
//! state machine; the stripping is not string-literal aware.

use serde::{Deserialize, Serialize};

use crate::model::Span;

/// Metrics attached to every file and symbol in the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub lines_count: usize,
    pub code_lines_count: usize,
    pub character_count: usize,
    pub code_character_count: usize,
    /// Count of control-flow nodes. Zero for straight-line code.
    pub cyclomatic_complexity: usize,
    pub dependency_count: usize,
    pub dependent_count: usize,
}

/// Sums size and complexity; used for symbols declared over several spans.
impl std::ops::AddAssign for Metrics {
    fn add_assign(&mut self, other: Metrics) {
        self.lines_count += other.lines_count;
        self.code_lines_count += other.code_lines_count;
        self.character_count += other.character_count;
        self.code_character_count += other.code_character_count;
        self.cyclomatic_complexity += other.cyclomatic_complexity;
        self.dependency_count += other.dependency_count;
        self.dependent_count += other.dependent_count;
    }
}

/// Comment delimiters of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: Option<(&'static str, &'static str)>,
}

impl CommentSyntax {
    /// `//` and `/* */` (C, C#, JavaScript, TypeScript).
    pub const C_STYLE: CommentSyntax = CommentSyntax {
        line: &["//"],
        block: Some(("/*", "*/")),
    };

    /// `#` only (Python).
    pub const HASH: CommentSyntax = CommentSyntax {
        line: &["#"],
        block: None,
    };
}

/// Code line and character counts after comment stripping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeCounts {
    pub lines: usize,
    pub characters: usize,
}

/// Measure a span of `source`. `complexity` is supplied by the caller,
/// which owns the syntax tree.
pub fn measure(source: &str, span: &Span, syntax: &CommentSyntax, complexity: usize) -> Metrics {
    let text = source.get(span.start..span.end).unwrap_or_default();
    let code = count_code(text, syntax);

    Metrics {
        lines_count: span.line_count(),
        code_lines_count: code.lines,
        character_count: span.len(),
        code_character_count: code.characters,
        cyclomatic_complexity: complexity,
        dependency_count: 0,
        dependent_count: 0,
    }
}

/// Count code lines and code characters in `text`.
pub fn count_code(text: &str, syntax: &CommentSyntax) -> CodeCounts {
    let mut counts = CodeCounts::default();
    let mut in_block = false;

    for line in text.lines() {
        let code = strip_comments(line, syntax, &mut in_block);
        let collapsed = code.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            counts.lines += 1;
            counts.characters += collapsed.chars().count();
        }
    }

    counts
}

/// Return the non-comment part of one line, carrying block state across lines.
fn strip_comments(line: &str, syntax: &CommentSyntax, in_block: &mut bool) -> String {
    let mut code = String::new();
    let mut rest = line;

    while !rest.is_empty() {
        if *in_block {
            let Some((_, close)) = syntax.block else {
                *in_block = false;
                continue;
            };
            match rest.find(close) {
                Some(at) => {
                    rest = &rest[at + close.len()..];
                    *in_block = false;
                }
                None => break,
            }
            continue;
        }

        let block_at = syntax
            .block
            .and_then(|(open, _)| rest.find(open).map(|at| (at, open.len())));
        let line_at = syntax.line.iter().filter_map(|marker| rest.find(marker)).min();

        match (block_at, line_at) {
            (Some((at, open_len)), line_at) if line_at.map_or(true, |l| at < l) => {
                code.push_str(&rest[..at]);
                code.push(' ');
                rest = &rest[at + open_len..];
                *in_block = true;
            }
            (_, Some(at)) => {
                code.push_str(&rest[..at]);
                break;
            }
            _ => {
                code.push_str(rest);
                break;
            }
        }
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_comment_lines_excluded() {
        let text = "int a = 1;\n\n// note\n   \nint b = 2; // trailing\n";
        let counts = count_code(text, &CommentSyntax::C_STYLE);
        assert_eq!(counts.lines, 2);
        assert_eq!(counts.characters, "int a = 1;".len() + "int b = 2;".len());
    }

    #[test]
    fn test_block_comment_interior_excluded() {
        let text = "/* start\n still comment\n end */ int x;\nint y; /* inline */ int z;\n";
        let counts = count_code(text, &CommentSyntax::C_STYLE);
        assert_eq!(counts.lines, 2);
        assert_eq!(counts.characters, "int x;".len() + "int y; int z;".len());
    }

    #[test]
    fn test_whitespace_collapsed() {
        let counts = count_code("x    =\t\t1", &CommentSyntax::HASH);
        assert_eq!(counts.characters, "x = 1".len());
    }

    #[test]
    fn test_hash_comments() {
        let text = "# header\ndef f():\n    return 1  # one\n";
        let counts = count_code(text, &CommentSyntax::HASH);
        assert_eq!(counts.lines, 2);
    }

    #[test]
    fn test_measure_span() {
        let source = "x = 1\n\ndef f():\n    # body\n    return x\n";
        let span = Span::new(7, source.len() - 1, 2, 4);
        let metrics = measure(source, &span, &CommentSyntax::HASH, 0);

        insta::assert_json_snapshot!(metrics, @r#"
        {
          "linesCount": 3,
          "codeLinesCount": 2,
          "characterCount": 32,
          "codeCharacterCount": 16,
          "cyclomaticComplexity": 0,
          "dependencyCount": 0,
          "dependentCount": 0
        }
        "#);
    }
}
