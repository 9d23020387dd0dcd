//! Extract function definitions from source files in several languages and
//! run one of them in isolation through its native toolchain.

pub mod config;
pub mod execution;
pub mod extract;
pub mod language;
pub mod printer;
pub mod process;

pub use execution::{Dispatcher, ExecutionRequest, ExecutionResult};
pub use extract::{extract, extract_file, FunctionRecord, Parameter};
pub use language::{classify, LanguageTag};
