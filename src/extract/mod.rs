//! Lexical function extraction.
//!
//! Headers are found line by line with per-language patterns
//! ([`headers`]); the body ends either by indentation (Python) or by brace
//! balance (everything else). This is a best-effort scanner, not a parser:
//! braces inside strings or comments are counted, and a definition nested in
//! an already consumed body is never reported.

use serde::{Deserialize, Serialize};

use crate::language::{classify, LanguageTag};

pub mod headers;
pub mod params;

pub use params::tokenize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRecord {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Header line through the last retained body line, joined with `\n`.
    pub code: String,
    /// 1-based line of the header.
    pub line_start: usize,
    /// 1-based line of the last retained body line.
    pub line_end: usize,
    pub language: LanguageTag,
}

impl FunctionRecord {
    /// `name(p1, p2)` as shown in listings.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Classify `file_name` and extract the functions of `source`.
pub fn extract_file(source: &str, file_name: &str) -> Vec<FunctionRecord> {
    extract(source, classify(file_name))
}

/// Extract function records in the order their headers appear.
/// [`LanguageTag::Unknown`] falls back to the Python rules.
pub fn extract(source: &str, language: LanguageTag) -> Vec<FunctionRecord> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut functions = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let Some(header) = headers::match_header(lines[i], language) else {
            i += 1;
            continue;
        };

        let consumed = if language.uses_braces() {
            brace_span(&lines, i)
        } else {
            indent_span(&lines, i, header.indent)
        };

        functions.push(FunctionRecord {
            name: header.name.to_string(),
            parameters: tokenize(header.params.trim(), language),
            code: lines[i..i + consumed.retained].join("\n"),
            line_start: i + 1,
            line_end: i + consumed.retained,
            language,
        });

        i += consumed.scanned;
    }

    functions
}

/// Find the first record named `name`.
pub fn find<'a>(records: &'a [FunctionRecord], name: &str) -> Option<&'a FunctionRecord> {
    records.iter().find(|r| r.name == name)
}

/// How far one body reached, counted from the header line.
struct Span {
    /// Lines kept in the record.
    retained: usize,
    /// Lines the scan cursor skips; exceeds `retained` when trailing blank
    /// lines were trimmed.
    scanned: usize,
}

/// Lines that are blank or indented deeper than the header belong to the
/// body; trailing blank lines are dropped from the record.
fn indent_span(lines: &[&str], start: usize, base_indent: usize) -> Span {
    let mut end = start + 1;
    while end < lines.len() {
        let line = lines[end];
        if line.trim().is_empty() || indent_width(line) > base_indent {
            end += 1;
        } else {
            break;
        }
    }

    let mut retained = end - start;
    while retained > 1 && lines[start + retained - 1].trim().is_empty() {
        retained -= 1;
    }

    Span { retained, scanned: end - start }
}

/// The counter starts at one when the header opens a brace. A lone `{` on
/// the next line opens the body Allman-style. The line that returns the
/// counter to zero is the last one consumed.
fn brace_span(lines: &[&str], start: usize) -> Span {
    let mut depth: i64 = if lines[start].contains('{') { 1 } else { 0 };
    let mut end = start + 1;

    if depth == 0 && end < lines.len() && lines[end].trim() == "{" {
        depth = 1;
        end += 1;
    }

    while end < lines.len() && depth > 0 {
        let line = lines[end];
        depth += count(line, '{');
        depth -= count(line, '}');
        end += 1;
    }

    Span { retained: end - start, scanned: end - start }
}

fn count(line: &str, needle: char) -> i64 {
    line.chars().filter(|&c| c == needle).count() as i64
}

fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[FunctionRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn python_trailing_blank_lines_are_trimmed() {
        let src = "def a(x):\n    y = x\n\n    return y\n\n\ndef b():\n    pass\n";
        let fns = extract(src, LanguageTag::Python);
        assert_eq!(names(&fns), ["a", "b"]);
        assert_eq!(fns[0].code, "def a(x):\n    y = x\n\n    return y");
        assert_eq!((fns[0].line_start, fns[0].line_end), (1, 4));
        assert_eq!((fns[1].line_start, fns[1].line_end), (7, 8));
    }

    #[test]
    fn python_methods_are_found_but_nested_defs_are_not() {
        let src = "class K:\n    def outer(self):\n        def inner():\n            return 1\n        return inner()\n\n    def other(self, n):\n        return n\n";
        let fns = extract(src, LanguageTag::Python);
        assert_eq!(names(&fns), ["outer", "other"]);
        assert!(fns[0].parameters.is_empty());
        assert_eq!(fns[1].parameters[0].name, "n");
        assert_eq!((fns[1].line_start, fns[1].line_end), (7, 8));
    }

    #[test]
    fn header_only_python_function_at_end_of_file() {
        let fns = extract("x = 1\ndef stub(): ...", LanguageTag::Python);
        assert_eq!(fns.len(), 1);
        assert_eq!(fns[0].code, "def stub(): ...");
        assert_eq!((fns[0].line_start, fns[0].line_end), (2, 2));
    }

    #[test]
    fn unknown_language_falls_back_to_python_rules() {
        let fns = extract_file("def f(a):\n    return a\n", "script.rb");
        assert_eq!(names(&fns), ["f"]);
        assert_eq!(fns[0].language, LanguageTag::Unknown);
    }

    #[test]
    fn brace_span_covers_nested_blocks() {
        let src = "int clamp(int v)\n{\n    if (v < 0) {\n        return 0;\n    }\n    return v;\n}\nint zero() {\n    return 0;\n}";
        let fns = extract(src, LanguageTag::C);
        assert_eq!(names(&fns), ["clamp", "zero"]);
        assert_eq!((fns[0].line_start, fns[0].line_end), (1, 7));
        assert!(fns[0].code.ends_with("    return v;\n}"));
        assert_eq!((fns[1].line_start, fns[1].line_end), (8, 10));
    }

    #[test]
    fn header_without_body_is_a_single_line_record() {
        let fns = extract("int proto(int a)\nint x = 1;", LanguageTag::C);
        assert_eq!(fns.len(), 1);
        assert_eq!((fns[0].line_start, fns[0].line_end), (1, 1));
    }

    #[test]
    fn unterminated_body_runs_to_end_of_source() {
        let fns = extract("func open() {\n\tfor {\n", LanguageTag::Go);
        assert_eq!(fns.len(), 1);
        assert_eq!(fns[0].line_end, 3);
    }

    #[test]
    fn carriage_returns_are_preserved_in_code() {
        let src = "function f(a) {\r\n  return a;\r\n}\r\n";
        let fns = extract(src, LanguageTag::JavaScript);
        assert_eq!(fns[0].code, "function f(a) {\r\n  return a;\r\n}\r");
    }

    #[test]
    fn signature_lists_parameter_names() {
        let fns = extract("def add(a: int, b: int = 2):\n    return a + b", LanguageTag::Python);
        assert_eq!(fns[0].signature(), "add(a, b)");
    }

    #[test]
    fn records_serialize_with_camel_case_keys() {
        let fns = extract("def f(x=1):\n    return x", LanguageTag::Python);
        let json = serde_json::to_value(&fns[0]).expect("serialize");
        assert_eq!(json["lineStart"], 1);
        assert_eq!(json["lineEnd"], 2);
        assert_eq!(json["language"], "python");
        assert_eq!(json["parameters"][0]["type"], "any");
        assert_eq!(json["parameters"][0]["defaultValue"], "1");
    }
}
