//! Execution dispatcher: generate a driver, build and run it, relay its
//! normalized result line, and always remove the scratch artifacts.

use std::{
    fmt,
    path::PathBuf,
    time::Duration,
};

use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::{
    config::{Config, DEFAULT_COMPILE_TIMEOUT, DEFAULT_SCRIPT_TIMEOUT},
    language::{classify, LanguageTag},
    process::{self, Invocation},
};

pub mod args;
pub mod scratch;
pub mod templates;
pub mod toolchain;

pub use args::format_args;
pub use scratch::{next_scratch_id, ScratchSet};
pub use templates::{generate, DriverContext, DriverError, DriverSpec};
pub use toolchain::{Tool, Toolchain};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub function_name: String,
    pub argument_strings: Vec<String>,
    pub file_path: PathBuf,
    pub language: LanguageTag,
}

impl ExecutionRequest {
    /// A request whose language is classified from `file_path`.
    pub fn new(
        function_name: impl Into<String>,
        argument_strings: Vec<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        let file_path = file_path.into();
        let language = classify(&file_path.to_string_lossy());
        Self { function_name: function_name.into(), argument_strings, file_path, language }
    }

    pub fn with_language(mut self, language: LanguageTag) -> Self {
        self.language = language;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success { result: String },
    Failure { error: String },
}

impl ExecutionResult {
    pub fn success(result: impl Into<String>) -> Self {
        Self::Success { result: result.into() }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The result text on success, the error text on failure.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { result } => result,
            Self::Failure { error } => error,
        }
    }
}

/// Same shape as the line every driver prints.
impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ExecutionResult", 2)?;
        match self {
            Self::Success { result } => {
                s.serialize_field("success", &true)?;
                s.serialize_field("result", result)?;
            }
            Self::Failure { error } => {
                s.serialize_field("success", &false)?;
                s.serialize_field("error", error)?;
            }
        }
        s.end()
    }
}

/// `{"success": bool, "result"?: any, "error"?: any}` as printed by drivers.
#[derive(Debug, Deserialize)]
struct DriverLine {
    success: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

fn value_text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl From<DriverLine> for ExecutionResult {
    fn from(line: DriverLine) -> Self {
        if line.success {
            Self::success(value_text(line.result).unwrap_or_default())
        } else {
            Self::failure(value_text(line.error).unwrap_or_else(|| "Unknown error".to_string()))
        }
    }
}

/// Interpret a driver's standard output. The last line holding a valid
/// result record wins; other lines (the function's own prints) are ignored.
pub fn parse_output(stdout: &str) -> ExecutionResult {
    let parsed = stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|l| l.starts_with('{'))
        .find_map(|l| serde_json::from_str::<DriverLine>(l).ok());
    if let Some(line) = parsed {
        return line.into();
    }

    let raw = stdout.trim();
    if raw.is_empty() {
        ExecutionResult::failure("Failed to parse output")
    } else {
        ExecutionResult::failure(raw)
    }
}

/// Dispatcher stages, in order. `Compiling` only occurs for languages with a
/// separate build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingInput,
    GeneratingDriver,
    Compiling,
    Running,
    ParsingResult,
    CleaningUp,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Runs one function per call. Holds only configuration, so one dispatcher
/// can serve any number of concurrent executions.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    toolchain: Toolchain,
    scratch_dir: PathBuf,
    script_timeout: Duration,
    compile_timeout: Duration,
}

impl Dispatcher {
    pub fn new(toolchain: Toolchain, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            scratch_dir: scratch_dir.into(),
            script_timeout: Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT),
            compile_timeout: Duration::from_secs(DEFAULT_COMPILE_TIMEOUT),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(Toolchain::from_config(cfg), cfg.scratch_dir())
            .with_timeouts(cfg.script_timeout(), cfg.compile_timeout())
    }

    pub fn with_timeouts(mut self, script: Duration, compile: Duration) -> Self {
        self.script_timeout = script;
        self.compile_timeout = compile;
        self
    }

    /// Compiled languages get the longer bound, covering build and run
    /// together.
    pub fn deadline_for(&self, language: LanguageTag) -> Duration {
        if language.is_compiled() {
            self.compile_timeout
        } else {
            self.script_timeout
        }
    }

    pub async fn execute(&self, req: &ExecutionRequest) -> ExecutionResult {
        info!(function = %req.function_name, language = %req.language, path = %req.file_path.display(), "execute");

        debug!(stage = %Stage::ValidatingInput);
        let (source_path, source_text) = match validate(req).await {
            Ok(found) => found,
            Err(result) => return result,
        };

        debug!(stage = %Stage::GeneratingDriver);
        let args = format_args(&req.argument_strings);
        let scratch_id = next_scratch_id();
        let ctx = DriverContext {
            language: req.language,
            function_name: &req.function_name,
            args: &args,
            source_path: &source_path,
            source_text: &source_text,
            scratch_id: &scratch_id,
            scratch_dir: &self.scratch_dir,
            toolchain: &self.toolchain,
        };
        let spec = match generate(&ctx) {
            Ok(spec) => spec,
            Err(e) => {
                warn!(error = %e, "driver generation failed");
                return ExecutionResult::failure(e.to_string());
            }
        };

        let mut scratch = ScratchSet::new();
        let result = self.build_and_run(&spec, &mut scratch, req.language).await;

        debug!(stage = %Stage::CleaningUp, artifacts = scratch.paths().count());
        scratch.cleanup().await;

        if let ExecutionResult::Failure { error } = &result {
            warn!(function = %req.function_name, %error, "execution failed");
        }
        result
    }

    async fn build_and_run(
        &self,
        spec: &DriverSpec,
        scratch: &mut ScratchSet,
        language: LanguageTag,
    ) -> ExecutionResult {
        if let Err(e) = scratch.materialize(spec).await {
            return ExecutionResult::failure(format!("Failed to write driver: {}", e));
        }

        let mut steps: Vec<&Invocation> = Vec::with_capacity(2);
        if let Some(compile) = &spec.compile {
            debug!(stage = %Stage::Compiling, command = %compile.display());
            steps.push(compile);
        }
        debug!(stage = %Stage::Running, command = %spec.run.display());
        steps.push(&spec.run);

        let stdout = match process::run_sequence(&steps, self.deadline_for(language)).await {
            Ok(stdout) => stdout,
            Err(e) => return ExecutionResult::failure(e.to_string()),
        };

        debug!(stage = %Stage::ParsingResult, bytes = stdout.len());
        parse_output(&stdout)
    }
}

/// The absolute source path and its text, or the Failure to report.
async fn validate(req: &ExecutionRequest) -> Result<(PathBuf, String), ExecutionResult> {
    let not_found = || ExecutionResult::failure(format!("File not found: {}", req.file_path.display()));

    if req.file_path.as_os_str().is_empty() {
        return Err(not_found());
    }
    let path = std::path::absolute(&req.file_path).map_err(|_| not_found())?;
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(not_found());
    }
    let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
        ExecutionResult::failure(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok((path, text))
}
