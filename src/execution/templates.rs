//! Driver program generation.
//!
//! A driver loads the user's source, calls one function with positional
//! argument literals and prints a single JSON line
//! `{"success": bool, "result"|"error": string}`. Generation is plain text
//! substitution of `{{key}}` placeholders; nothing touches the disk here.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use thiserror::Error;

use super::toolchain::{Tool, Toolchain};
use crate::{language::LanguageTag, process::Invocation};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Could not find class for method: {0}")]
    ClassNotFound(String),

    #[error("Execution not yet supported for {0}")]
    Unsupported(LanguageTag),

    #[error("Invalid source path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Everything a driver needs to know about one execution.
#[derive(Debug, Clone)]
pub struct DriverContext<'a> {
    pub language: LanguageTag,
    pub function_name: &'a str,
    /// Already formatted argument literals.
    pub args: &'a [String],
    /// Absolute path of the user's source file.
    pub source_path: &'a Path,
    pub source_text: &'a str,
    /// Unique per invocation; part of every scratch file name.
    pub scratch_id: &'a str,
    /// Where interpreted drivers are written.
    pub scratch_dir: &'a Path,
    pub toolchain: &'a Toolchain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Files to write and commands to run for one driver.
#[derive(Debug, Clone)]
pub struct DriverSpec {
    pub files: Vec<ScratchFile>,
    /// Directories created before the build and removed afterwards.
    pub dirs: Vec<PathBuf>,
    /// Build outputs removed afterwards.
    pub outputs: Vec<PathBuf>,
    pub compile: Option<Invocation>,
    pub run: Invocation,
}

impl DriverSpec {
    /// Every path this driver may leave on disk.
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .map(|f| f.path.as_path())
            .chain(self.outputs.iter().map(PathBuf::as_path))
            .chain(self.dirs.iter().map(PathBuf::as_path))
    }
}

pub fn generate(ctx: &DriverContext<'_>) -> Result<DriverSpec, DriverError> {
    let source = SourceLocation::of(ctx.source_path)?;
    match ctx.language {
        LanguageTag::Python => python(ctx, &source),
        LanguageTag::Java => Ok(java(ctx, &source)),
        LanguageTag::Go => Ok(go(ctx, &source)),
        LanguageTag::C => Ok(c(ctx, &source)),
        LanguageTag::Cpp => Ok(cpp(ctx, &source)),
        LanguageTag::JavaScript | LanguageTag::TypeScript => Ok(script(ctx, &source)),
        LanguageTag::Unknown => Err(DriverError::Unsupported(ctx.language)),
    }
}

struct SourceLocation {
    dir: PathBuf,
    file_name: String,
    stem: String,
}

impl SourceLocation {
    fn of(path: &Path) -> Result<Self, DriverError> {
        let invalid = || DriverError::InvalidPath(path.to_path_buf());
        let file_name = path.file_name().and_then(|s| s.to_str()).ok_or_else(invalid)?;
        let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self { dir, file_name: file_name.to_string(), stem: stem.to_string() })
    }
}

/// Replace `{{key}}` placeholders in order.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}

fn invocation(tool: &Tool, cwd: &Path) -> Invocation {
    Invocation::new(&tool.program, cwd).args(tool.args.iter().cloned())
}

fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// ── Python ──────────────────────────────────────────────────

const PYTHON_FUNCTION: &str = r#"import sys, json
sys.dont_write_bytecode = True
sys.path.insert(0, r'{{dir}}')
try:
    from {{module}} import {{name}}
    result = {{name}}({{args}})
    print(json.dumps({"success": True, "result": repr(result)}))
except Exception as e:
    print(json.dumps({"success": False, "error": f"{type(e).__name__}: {e}"}))
"#;

const PYTHON_METHOD: &str = r#"import sys, json
sys.dont_write_bytecode = True
sys.path.insert(0, r'{{dir}}')
try:
    from {{module}} import {{class}}
    obj = {{class}}()
    result = obj.{{name}}({{args}})
    print(json.dumps({"success": True, "result": repr(result)}))
except Exception as e:
    print(json.dumps({"success": False, "error": f"{type(e).__name__}: {e}"}))
"#;

/// Textual instance-method check: any `def name(self` in the file counts,
/// whatever class it sits in.
fn is_instance_method(source: &str, name: &str) -> bool {
    source.contains(&format!("def {}(self", name))
}

/// The first `class` header in the file that is followed, anywhere later,
/// by `def name(`. Picks the wrong class when an earlier class lacks the
/// method but a later one has it.
fn enclosing_class<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!(r"(?s)class\s+(\w+)[^:]*:.*?def\s+{}\s*\(", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(source).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn python(ctx: &DriverContext<'_>, src: &SourceLocation) -> Result<DriverSpec, DriverError> {
    let dir = forward_slashes(&src.dir);
    let args = ctx.args.join(", ");
    let (dir, args) = (dir.as_str(), args.as_str());
    let contents = if is_instance_method(ctx.source_text, ctx.function_name) {
        let class = enclosing_class(ctx.source_text, ctx.function_name)
            .ok_or_else(|| DriverError::ClassNotFound(ctx.function_name.to_string()))?;
        render(
            PYTHON_METHOD,
            &[
                ("dir", dir),
                ("module", src.stem.as_str()),
                ("class", class),
                ("name", ctx.function_name),
                ("args", args),
            ],
        )
    } else {
        render(
            PYTHON_FUNCTION,
            &[("dir", dir), ("module", src.stem.as_str()), ("name", ctx.function_name), ("args", args)],
        )
    };

    let driver = ctx.scratch_dir.join(format!("sentinel_exec_{}.py", ctx.scratch_id));
    let run = invocation(&ctx.toolchain.python, ctx.scratch_dir)
        .arg(driver.to_string_lossy().into_owned());
    Ok(DriverSpec {
        files: vec![ScratchFile { path: driver, contents }],
        dirs: Vec::new(),
        outputs: Vec::new(),
        compile: None,
        run,
    })
}

// ── Java ────────────────────────────────────────────────────

const JAVA_RUNNER: &str = r#"public class {{runner}} {
    public static void main(String[] args) {
        try {
            Object result = {{class}}.{{name}}({{args}});
            System.out.println("{\"success\": true, \"result\": " + quote(String.valueOf(result)) + "}");
        } catch (Throwable e) {
            System.out.println("{\"success\": false, \"error\": " + quote(e.getClass().getSimpleName() + ": " + e.getMessage()) + "}");
        }
    }

    private static String quote(String s) {
        StringBuilder sb = new StringBuilder("\"");
        for (char c : s.toCharArray()) {
            switch (c) {
                case '"': sb.append("\\\""); break;
                case '\\': sb.append("\\\\"); break;
                case '\n': sb.append("\\n"); break;
                case '\r': sb.append("\\r"); break;
                case '\t': sb.append("\\t"); break;
                default:
                    if (c < 0x20) sb.append(String.format("\\u%04x", (int) c));
                    else sb.append(c);
            }
        }
        return sb.append('"').toString();
    }
}
"#;

/// The runner calls `FileStem.name(...)` statically; compiled classes go to
/// a per-invocation directory so nothing lands next to the user's sources.
fn java(ctx: &DriverContext<'_>, src: &SourceLocation) -> DriverSpec {
    let runner = format!("SentinelRunner_{}", ctx.scratch_id);
    let runner_file = src.dir.join(format!("{}.java", runner));
    let classes = src.dir.join(format!("sentinel_classes_{}", ctx.scratch_id));
    let classes_arg = classes.to_string_lossy().into_owned();

    let args = ctx.args.join(", ");
    let contents = render(
        JAVA_RUNNER,
        &[
            ("runner", runner.as_str()),
            ("class", src.stem.as_str()),
            ("name", ctx.function_name),
            ("args", args.as_str()),
        ],
    );

    let compile = invocation(&ctx.toolchain.javac, &src.dir).args([
        "-d".to_string(),
        classes_arg.clone(),
        src.file_name.clone(),
        format!("{}.java", runner),
    ]);
    let run = invocation(&ctx.toolchain.java, &src.dir).args(["-cp".to_string(), classes_arg, runner]);

    DriverSpec {
        files: vec![ScratchFile { path: runner_file, contents }],
        dirs: vec![classes],
        outputs: Vec::new(),
        compile: Some(compile),
        run,
    }
}

// ── Go ──────────────────────────────────────────────────────

const GO_RUNNER: &str = r#"package main

import (
	"encoding/json"
	"fmt"
)

func main() {
	defer func() {
		if r := recover(); r != nil {
			sentinelEmit(map[string]interface{}{"success": false, "error": fmt.Sprintf("%v", r)})
		}
	}()

	result := {{name}}({{args}})
	sentinelEmit(map[string]interface{}{"success": true, "result": fmt.Sprintf("%v", result)})
}

func sentinelEmit(payload map[string]interface{}) {
	out, _ := json.Marshal(payload)
	fmt.Println(string(out))
}
"#;

/// `go run` builds and runs both files as one `main` package.
fn go(ctx: &DriverContext<'_>, src: &SourceLocation) -> DriverSpec {
    let driver_name = format!("sentinel_runner_{}.go", ctx.scratch_id);
    let args = ctx.args.join(", ");
    let contents = render(GO_RUNNER, &[("name", ctx.function_name), ("args", args.as_str())]);
    let run = invocation(&ctx.toolchain.go, &src.dir).args([
        "run".to_string(),
        src.file_name.clone(),
        driver_name.clone(),
    ]);
    DriverSpec {
        files: vec![ScratchFile { path: src.dir.join(driver_name), contents }],
        dirs: Vec::new(),
        outputs: Vec::new(),
        compile: None,
        run,
    }
}

// ── C / C++ ─────────────────────────────────────────────────

const C_RUNNER: &str = r#"#include <stdio.h>
#include <stdlib.h>
#include <string.h>

{{declaration}}
#include "{{file}}"

static void sentinel_emit(int ok, const char *text)
{
    const char *p;
    printf("{\"success\": %s, \"%s\": \"", ok ? "true" : "false", ok ? "result" : "error");
    for (p = text; *p; p++) {
        switch (*p) {
        case '"': fputs("\\\"", stdout); break;
        case '\\': fputs("\\\\", stdout); break;
        case '\n': fputs("\\n", stdout); break;
        case '\r': fputs("\\r", stdout); break;
        case '\t': fputs("\\t", stdout); break;
        default:
            if ((unsigned char)*p < 0x20)
                printf("\\u%04x", (unsigned char)*p);
            else
                putchar(*p);
        }
    }
    puts("\"}");
}

#define SENTINEL_FORMAT(x) _Generic((x), \
    char *: "%s", const char *: "%s", \
    float: "%g", double: "%g", long double: "%Lg", \
    char: "%c", unsigned int: "%u", \
    long: "%ld", unsigned long: "%lu", \
    long long: "%lld", unsigned long long: "%llu", \
    default: "%d")

int main(void)
{
    char sentinel_buf[4096];
    __typeof__({{name}}({{args}})) sentinel_result = {{name}}({{args}});
    snprintf(sentinel_buf, sizeof sentinel_buf, SENTINEL_FORMAT(sentinel_result), sentinel_result);
    sentinel_emit(1, sentinel_buf);
    return 0;
}
"#;

const CPP_RUNNER: &str = r#"#include <cstdio>
#include <exception>
#include <iostream>
#include <sstream>
#include <string>

#include "{{file}}"

static std::string sentinel_quote(const std::string &s)
{
    std::string out = "\"";
    for (char c : s) {
        switch (c) {
        case '"': out += "\\\""; break;
        case '\\': out += "\\\\"; break;
        case '\n': out += "\\n"; break;
        case '\r': out += "\\r"; break;
        case '\t': out += "\\t"; break;
        default:
            if (static_cast<unsigned char>(c) < 0x20) {
                char buf[8];
                std::snprintf(buf, sizeof buf, "\\u%04x", static_cast<unsigned char>(c));
                out += buf;
            } else {
                out += c;
            }
        }
    }
    return out + "\"";
}

int main()
{
    try {
        auto sentinel_result = {{name}}({{args}});
        std::ostringstream oss;
        oss << sentinel_result;
        std::cout << "{\"success\": true, \"result\": " << sentinel_quote(oss.str()) << "}" << std::endl;
    } catch (const std::exception &e) {
        std::cout << "{\"success\": false, \"error\": " << sentinel_quote(e.what()) << "}" << std::endl;
    } catch (...) {
        std::cout << "{\"success\": false, \"error\": \"Unknown error\"}" << std::endl;
    }
    return 0;
}
"#;

/// `int add(int a, int b);` when the definition is found and is not
/// `static` (a non-static declaration would conflict with it).
fn c_forward_declaration(source: &str, name: &str) -> Option<String> {
    let name = regex::escape(name);
    let is_static = Regex::new(&format!(r"(?m)^\s*static\b[^\n]*\b{}\s*\(", name)).ok()?;
    if is_static.is_match(source) {
        return None;
    }
    let signature = Regex::new(&format!(r"(?m)^\s*(\w+\*?\s+{}\s*\([^)]*\))", name)).ok()?;
    let caps = signature.captures(source)?;
    Some(format!("{};", &caps[1]))
}

struct NativeBuild {
    driver: PathBuf,
    exe: PathBuf,
}

fn native_build(ctx: &DriverContext<'_>, src: &SourceLocation, ext: &str) -> NativeBuild {
    let base = format!("sentinel_runner_{}", ctx.scratch_id);
    NativeBuild {
        driver: src.dir.join(format!("{}.{}", base, ext)),
        exe: src.dir.join(format!("{}{}", base, std::env::consts::EXE_SUFFIX)),
    }
}

fn native_spec(
    tool: &Tool,
    std_flag: Option<&str>,
    src: &SourceLocation,
    build: NativeBuild,
    contents: String,
) -> DriverSpec {
    let exe_arg = build.exe.to_string_lossy().into_owned();
    let driver_arg = build.driver.to_string_lossy().into_owned();
    let compile = invocation(tool, &src.dir)
        .args(std_flag.map(str::to_string))
        .args(["-o".to_string(), exe_arg.clone(), driver_arg]);
    let run = Invocation::new(exe_arg, &src.dir);
    DriverSpec {
        files: vec![ScratchFile { path: build.driver, contents }],
        dirs: Vec::new(),
        outputs: vec![build.exe],
        compile: Some(compile),
        run,
    }
}

fn c(ctx: &DriverContext<'_>, src: &SourceLocation) -> DriverSpec {
    let declaration = c_forward_declaration(ctx.source_text, ctx.function_name).unwrap_or_default();
    let args = ctx.args.join(", ");
    let contents = render(
        C_RUNNER,
        &[
            ("declaration", declaration.as_str()),
            ("file", src.file_name.as_str()),
            ("name", ctx.function_name),
            ("args", args.as_str()),
        ],
    );
    let build = native_build(ctx, src, "c");
    native_spec(&ctx.toolchain.cc, None, src, build, contents)
}

fn cpp(ctx: &DriverContext<'_>, src: &SourceLocation) -> DriverSpec {
    let args = ctx.args.join(", ");
    let contents = render(
        CPP_RUNNER,
        &[("file", src.file_name.as_str()), ("name", ctx.function_name), ("args", args.as_str())],
    );
    let build = native_build(ctx, src, "cpp");
    native_spec(&ctx.toolchain.cxx, Some("-std=c++17"), src, build, contents)
}

// ── JavaScript / TypeScript ─────────────────────────────────

const SCRIPT_RUNNER: &str = r#"const sentinelEmit = (payload) => console.log(JSON.stringify(payload));

(async () => {
    try {
        const mod = require({{path}});
        const fn = mod[{{name_literal}}]
            || (mod.default && mod.default[{{name_literal}}])
            || (typeof mod.default === 'function' && mod.default.name === {{name_literal}} ? mod.default : undefined)
            || (typeof mod === 'function' && mod.name === {{name_literal}} ? mod : undefined);
        if (typeof fn !== 'function') throw new Error('Function not found: ' + {{name_literal}});
        const result = await fn({{args}});
        sentinelEmit({ success: true, result: String(result) });
    } catch (e) {
        const kind = e && e.name ? e.name : 'Error';
        const message = e && e.message !== undefined ? e.message : String(e);
        sentinelEmit({ success: false, error: kind + ': ' + message });
    }
})();
"#;

static JS_STRING_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["\\\n\r]"#).expect("js escape pattern"));

fn js_string(value: &str) -> String {
    let escaped = JS_STRING_UNSAFE.replace_all(value, |caps: &regex::Captures<'_>| match &caps[0] {
        "\n" => "\\n".to_string(),
        "\r" => "\\r".to_string(),
        other => format!("\\{}", other),
    });
    format!("\"{}\"", escaped)
}

fn script(ctx: &DriverContext<'_>, src: &SourceLocation) -> DriverSpec {
    let path = js_string(&forward_slashes(ctx.source_path));
    let name = js_string(ctx.function_name);
    let args = ctx.args.join(", ");
    let contents = render(
        SCRIPT_RUNNER,
        &[("path", path.as_str()), ("name_literal", name.as_str()), ("args", args.as_str())],
    );
    let tool = match ctx.language {
        LanguageTag::TypeScript => &ctx.toolchain.ts_runtime,
        _ => &ctx.toolchain.node,
    };
    let driver = ctx.scratch_dir.join(format!("sentinel_exec_{}.js", ctx.scratch_id));
    let run = invocation(tool, &src.dir).arg(driver.to_string_lossy().into_owned());
    DriverSpec {
        files: vec![ScratchFile { path: driver, contents }],
        dirs: Vec::new(),
        outputs: Vec::new(),
        compile: None,
        run,
    }
}
