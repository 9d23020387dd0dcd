//! Argument-literal heuristic shared by every driver language.

/// Spellings of null and boolean literals passed through untouched.
const BARE_LITERALS: &[&str] = &["null", "None", "nil", "true", "false"];

/// Turn raw argument strings into source literals.
///
/// Numbers, already-quoted strings, bracketed collections and the
/// null/boolean spellings pass through; anything else is wrapped in double
/// quotes. Embedded quotes are not escaped.
pub fn format_args(raw: &[String]) -> Vec<String> {
    raw.iter().map(|arg| format_arg(arg)).collect()
}

pub fn format_arg(arg: &str) -> String {
    if arg.is_empty()
        || is_numeric(arg)
        || arg.starts_with(['"', '\'', '[', '{'])
        || BARE_LITERALS.contains(&arg)
    {
        return arg.to_string();
    }
    format!("\"{}\"", arg)
}

/// Decimal integers and floats, with optional sign and exponent. Hex
/// spellings and `Infinity` are not numbers here and get quoted.
fn is_numeric(arg: &str) -> bool {
    let s = arg.trim();
    if s.is_empty() {
        return false;
    }
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') && s.parse::<f64>().is_ok()
}
