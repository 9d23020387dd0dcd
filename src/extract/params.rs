//! Parameter-list tokenizer.
//!
//! Splits naively on every comma, so a comma inside a generic or a nested
//! bracket produces two broken tokens. Tokens that do not fit the language's
//! shape are dropped; tokenizing never fails.

use std::sync::LazyLock;

use regex::Regex;

use super::Parameter;
use crate::language::LanguageTag;

/// Type recorded when a declaration carries no annotation.
pub const ANY_TYPE: &str = "any";

static PYTHON_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)(?:\s*:\s*([^=]+?))?(?:\s*=\s*(.+))?$").expect("python param pattern")
});

pub fn tokenize(raw: &str, language: LanguageTag) -> Vec<Parameter> {
    let tokens: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    match language {
        LanguageTag::Java => tokens.iter().filter_map(|t| typed_last(t, "Object")).collect(),
        LanguageTag::C | LanguageTag::Cpp => {
            tokens.iter().filter_map(|t| typed_last(t, "int")).collect()
        }
        LanguageTag::Go => tokens.iter().filter_map(|t| go_param(t)).collect(),
        LanguageTag::JavaScript | LanguageTag::TypeScript => {
            tokens.iter().filter_map(|t| script_param(t)).collect()
        }
        LanguageTag::Python | LanguageTag::Unknown => python_params(&tokens),
    }
}

fn python_params(tokens: &[&str]) -> Vec<Parameter> {
    let skip = usize::from(tokens.first() == Some(&"self"));
    tokens[skip..]
        .iter()
        .filter_map(|t| {
            let caps = PYTHON_PARAM.captures(t)?;
            Some(Parameter {
                name: caps[1].to_string(),
                ty: caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_else(|| ANY_TYPE.to_string()),
                default_value: caps.get(3).map(|m| m.as_str().trim().to_string()),
            })
        })
        .collect()
}

/// `type name` declarations (Java, C, C++): the last word names the
/// parameter, the text before it is the type, spacing kept as written.
fn typed_last(token: &str, default_ty: &str) -> Option<Parameter> {
    let token = token.trim();
    let (ty, last) = match token.rfind(char::is_whitespace) {
        Some(idx) => (token[..idx].trim_end(), token[idx..].trim_start()),
        None => ("", token),
    };
    let name = strip_decorations(last);
    if name.is_empty() {
        return None;
    }
    let ty = if ty.is_empty() { default_ty } else { ty };
    Some(Parameter { name: name.to_string(), ty: ty.to_string(), default_value: None })
}

/// Pointer stars and reference marks before the name, array brackets after it.
fn strip_decorations(word: &str) -> &str {
    let name = word.trim_start_matches(['*', '&']);
    match name.find('[') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Go declares `name type`; a bare name shares the type of a later sibling,
/// which is not tracked here.
fn go_param(token: &str) -> Option<Parameter> {
    let mut words = token.split_whitespace();
    let name = words.next()?;
    let ty = words.collect::<Vec<_>>().join(" ");
    Some(Parameter {
        name: name.to_string(),
        ty: if ty.is_empty() { "interface{}".to_string() } else { ty },
        default_value: None,
    })
}

fn script_param(token: &str) -> Option<Parameter> {
    let (decl, default_value) = match token.split_once('=') {
        Some((decl, default)) => (decl.trim(), Some(default.trim().to_string())),
        None => (token, None),
    };
    let (name, ty) = match decl.split_once(':') {
        Some((name, ty)) => (name, ty.trim()),
        None => (decl, ANY_TYPE),
    };
    let name = name.trim().trim_end_matches('?').trim();
    if name.is_empty() {
        return None;
    }
    Some(Parameter {
        name: name.to_string(),
        ty: if ty.is_empty() { ANY_TYPE.to_string() } else { ty.to_string() },
        default_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(params: &[Parameter]) -> Vec<&str> {
        params.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn python_annotations_and_defaults() {
        let params = tokenize("self, a: int, b = 3, c: str = 'x'", LanguageTag::Python);
        assert_eq!(names(&params), ["a", "b", "c"]);
        assert_eq!(params[0].ty, "int");
        assert_eq!(params[0].default_value, None);
        assert_eq!(params[1].ty, ANY_TYPE);
        assert_eq!(params[1].default_value.as_deref(), Some("3"));
        assert_eq!(params[2].ty, "str");
        assert_eq!(params[2].default_value.as_deref(), Some("'x'"));
    }

    #[test]
    fn python_skips_star_args() {
        let params = tokenize("x, *args, **kwargs", LanguageTag::Python);
        assert_eq!(names(&params), ["x"]);
    }

    #[test]
    fn python_only_drops_leading_self() {
        let params = tokenize("cls, self", LanguageTag::Python);
        assert_eq!(names(&params), ["cls", "self"]);
    }

    #[test]
    fn empty_list_yields_nothing() {
        for lang in LanguageTag::ALL {
            assert!(tokenize("   ", lang).is_empty());
            assert!(tokenize(" , ,", lang).is_empty());
        }
    }

    #[test]
    fn java_type_precedes_name() {
        let params = tokenize("final int count, String[] items, Map<K,V> m", LanguageTag::Java);
        // The generic's comma splits the last declaration in two.
        assert_eq!(names(&params), ["count", "items", "Map<K", "m"]);
        assert_eq!(params[0].ty, "final int");
        assert_eq!(params[1].ty, "String[]");
        assert_eq!(params[2].ty, "Object");
        assert_eq!(params[3].ty, "V>");
    }

    #[test]
    fn c_strips_pointer_and_array_decorations_from_names() {
        let params = tokenize("const char *name, int values[], double", LanguageTag::C);
        assert_eq!(names(&params), ["name", "values", "double"]);
        assert_eq!(params[0].ty, "const char");
        assert_eq!(params[1].ty, "int");
        assert_eq!(params[2].ty, "int");
    }

    #[test]
    fn type_spacing_is_kept_verbatim() {
        let params = tokenize("unsigned   long  count, const\tchar *s", LanguageTag::C);
        assert_eq!(names(&params), ["count", "s"]);
        assert_eq!(params[0].ty, "unsigned   long");
        assert_eq!(params[1].ty, "const\tchar");
    }

    #[test]
    fn cpp_reference_parameters() {
        let params = tokenize("std::vector<int> &v, int n", LanguageTag::Cpp);
        assert_eq!(names(&params), ["v", "n"]);
        assert_eq!(params[0].ty, "std::vector<int>");
    }

    #[test]
    fn go_name_precedes_type() {
        let params = tokenize("a int, b, c string, xs ...int", LanguageTag::Go);
        assert_eq!(names(&params), ["a", "b", "c", "xs"]);
        assert_eq!(params[0].ty, "int");
        assert_eq!(params[1].ty, "interface{}");
        assert_eq!(params[3].ty, "...int");
    }

    #[test]
    fn typescript_optional_and_typed() {
        let params = tokenize("a: number, b?: string, c", LanguageTag::TypeScript);
        assert_eq!(names(&params), ["a", "b", "c"]);
        assert_eq!(params[0].ty, "number");
        assert_eq!(params[1].ty, "string");
        assert_eq!(params[2].ty, ANY_TYPE);
    }

    #[test]
    fn javascript_defaults_are_captured() {
        let params = tokenize("x = 1, y: number = 2", LanguageTag::JavaScript);
        assert_eq!(names(&params), ["x", "y"]);
        assert_eq!(params[0].default_value.as_deref(), Some("1"));
        assert_eq!(params[1].ty, "number");
        assert_eq!(params[1].default_value.as_deref(), Some("2"));
    }
}
