//! Per-language function header patterns.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::language::LanguageTag;

/// A recognised function header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header<'a> {
    pub name: &'a str,
    pub params: &'a str,
    /// Leading whitespace width; only meaningful for indentation-scoped
    /// languages.
    pub indent: usize,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid header pattern {pattern}: {e}"))
}

static PYTHON: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(\s*)def\s+(\w+)\s*\(([^)]*)\)\s*(?:->.*)?:"));

static JAVA: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^\s*(public|private|protected)?\s*(static)?\s*(\w+)\s+(\w+)\s*\(([^)]*)\)\s*\{?\s*$")
});

static GO: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*func\s+(?:\(\w+\s+\*?\w+\)\s+)?(\w+)\s*\(([^)]*)\)"));

static C_FAMILY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^\s*(?:static\s+)?(?:inline\s+)?(\w+(?:\s*\*)*)\s+(\w+)\s*\(([^)]*)\)\s*\{?\s*$")
});

/// Named declarations, arrow bindings, method shorthand. Tried in order and
/// only the first match is considered.
static SCRIPT: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile(r"^\s*(?:export\s+)?(?:async\s+)?function\s+(\w+)\s*\(([^)]*)\)"),
        compile(r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?\(([^)]*)\)\s*=>"),
        compile(r"^\s*(?:public|private|protected)?\s*(?:async\s+)?(\w+)\s*\(([^)]*)\)\s*(?::\s*\w+)?\s*\{"),
    ]
});

const JAVA_KEYWORDS: &[&str] = &["if", "for", "while"];
const C_KEYWORDS: &[&str] = &["if", "for", "while", "switch"];
const SCRIPT_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch"];

/// Match `line` against the language's header pattern. Control keywords
/// caught by the looser patterns are rejected.
pub fn match_header(line: &str, language: LanguageTag) -> Option<Header<'_>> {
    match language {
        LanguageTag::Java => {
            let caps = JAVA.captures(line)?;
            header(&caps, 4, 5, JAVA_KEYWORDS)
        }
        LanguageTag::Go => {
            let caps = GO.captures(line)?;
            header(&caps, 1, 2, &[])
        }
        LanguageTag::C | LanguageTag::Cpp => {
            let caps = C_FAMILY.captures(line)?;
            header(&caps, 2, 3, C_KEYWORDS)
        }
        LanguageTag::JavaScript | LanguageTag::TypeScript => {
            let caps = SCRIPT.iter().find_map(|re| re.captures(line))?;
            header(&caps, 1, 2, SCRIPT_KEYWORDS)
        }
        LanguageTag::Python | LanguageTag::Unknown => {
            let caps = PYTHON.captures(line)?;
            let mut found = header(&caps, 2, 3, &[])?;
            found.indent = caps.get(1).map_or(0, |m| m.as_str().chars().count());
            Some(found)
        }
    }
}

fn header<'a>(
    caps: &Captures<'a>,
    name_group: usize,
    params_group: usize,
    rejected: &[&str],
) -> Option<Header<'a>> {
    let name = caps.get(name_group)?.as_str();
    if rejected.contains(&name) {
        return None;
    }
    Some(Header {
        name,
        params: caps.get(params_group).map_or("", |m| m.as_str()),
        indent: 0,
    })
}
