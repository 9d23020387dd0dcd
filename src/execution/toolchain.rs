//! External toolchain programs used to build and run drivers.

use crate::config::Config;

/// A program plus any leading arguments it always receives, e.g.
/// `npx tsx` for a TypeScript runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub program: String,
    pub args: Vec<String>,
}

impl Tool {
    /// Split a configured command line on whitespace. An empty value falls
    /// back to the single program `default`.
    pub fn parse(value: &str, default: &str) -> Self {
        let mut words = value.split_whitespace();
        match words.next() {
            Some(program) => Self {
                program: program.to_string(),
                args: words.map(str::to_string).collect(),
            },
            None => Self { program: default.to_string(), args: Vec::new() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub python: Tool,
    pub node: Tool,
    pub ts_runtime: Tool,
    pub javac: Tool,
    pub java: Tool,
    pub go: Tool,
    pub cc: Tool,
    pub cxx: Tool,
}

impl Toolchain {
    pub fn from_config(cfg: &Config) -> Self {
        let tool = |key: &str, default: &str| {
            Tool::parse(&cfg.get(key).unwrap_or_default(), default)
        };
        let defaults = Self::default();
        Self {
            python: tool("SENTINEL_PYTHON", &defaults.python.program),
            node: tool("SENTINEL_NODE", "node"),
            ts_runtime: tool("SENTINEL_TS_RUNTIME", "node"),
            javac: tool("SENTINEL_JAVAC", "javac"),
            java: tool("SENTINEL_JAVA", "java"),
            go: tool("SENTINEL_GO", "go"),
            cc: tool("SENTINEL_CC", "gcc"),
            cxx: tool("SENTINEL_CXX", "g++"),
        }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        let python = if cfg!(windows) { "python" } else { "python3" };
        let t = |p: &str| Tool::parse(p, p);
        Self {
            python: t(python),
            node: t("node"),
            ts_runtime: t("node"),
            javac: t("javac"),
            java: t("java"),
            go: t("go"),
            cc: t("gcc"),
            cxx: t("g++"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_program_with_leading_args() {
        let tool = Tool::parse("  npx   tsx ", "node");
        assert_eq!(tool.program, "npx");
        assert_eq!(tool.args, ["tsx"]);
    }

    #[test]
    fn blank_value_uses_default() {
        assert_eq!(Tool::parse("   ", "gcc"), Tool { program: "gcc".into(), args: vec![] });
    }

    #[test]
    fn config_values_select_programs() {
        let mut cfg = Config::from_file(std::path::Path::new("/nope")).expect("config");
        cfg.set("SENTINEL_CXX", "clang++ -stdlib=libc++");
        let tc = Toolchain::from_config(&cfg);
        assert_eq!(tc.cxx.program, "clang++");
        assert_eq!(tc.cxx.args, ["-stdlib=libc++"]);
        assert_eq!(tc.go.program, "go");
    }
}
