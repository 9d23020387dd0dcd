//! Language tags derived from file extensions.

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Python,
    Java,
    Go,
    C,
    Cpp,
    JavaScript,
    TypeScript,
    Unknown,
}

impl LanguageTag {
    pub const ALL: [LanguageTag; 8] = [
        Self::Python,
        Self::Java,
        Self::Go,
        Self::C,
        Self::Cpp,
        Self::JavaScript,
        Self::TypeScript,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::Go => "go",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a driver program can be generated for this language.
    pub fn is_executable(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Languages whose execution includes a build step and therefore runs
    /// under the longer compile deadline.
    pub fn is_compiled(self) -> bool {
        matches!(self, Self::Java | Self::Go | Self::C | Self::Cpp)
    }

    /// Brace-delimited languages end a function body by brace balance;
    /// everything else uses indentation.
    pub fn uses_braces(self) -> bool {
        matches!(
            self,
            Self::Java | Self::Go | Self::C | Self::Cpp | Self::JavaScript | Self::TypeScript
        )
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let tag = match lower.as_str() {
            "python" | "py" => Self::Python,
            "java" => Self::Java,
            "go" | "golang" => Self::Go,
            "c" => Self::C,
            "cpp" | "c++" => Self::Cpp,
            "javascript" | "js" => Self::JavaScript,
            "typescript" | "ts" => Self::TypeScript,
            "unknown" => Self::Unknown,
            other => return Err(format!("unsupported language: {}", other)),
        };
        Ok(tag)
    }
}

/// Map a file name (or path) to its language by lowercased extension.
/// Unmapped or missing extensions yield [`LanguageTag::Unknown`].
pub fn classify(file_name: &str) -> LanguageTag {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "py" => LanguageTag::Python,
        "java" => LanguageTag::Java,
        "go" => LanguageTag::Go,
        "c" | "h" => LanguageTag::C,
        "cpp" | "cc" | "cxx" | "hpp" => LanguageTag::Cpp,
        "js" | "jsx" => LanguageTag::JavaScript,
        "ts" | "tsx" => LanguageTag::TypeScript,
        _ => LanguageTag::Unknown,
    }
}
