use std::path::PathBuf;

use clap::{Parser, Subcommand};

use sentinel::language::LanguageTag;

#[derive(Parser, Debug, Clone)]
#[command(name = "sentinel", about = "Extract and run individual functions from source files", version)]
pub struct Cli {
    /// Log every dispatcher stage to stderr.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the functions defined in a source file.
    List {
        /// Source file, or `-` to read from stdin.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Override the language detected from the file extension.
        #[arg(long = "lang", value_name = "LANG")]
        language: Option<LanguageTag>,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run one function with the given arguments.
    Run {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "FUNCTION")]
        function: String,

        /// Argument literals, passed to the function in order.
        ///
        /// Numbers, quoted strings, lists and literals such as `true` or
        /// `None` are used as written; anything else is quoted.
        #[arg(value_name = "ARGS", allow_hyphen_values = true)]
        args: Vec<String>,

        #[arg(long = "lang", value_name = "LANG")]
        language: Option<LanguageTag>,

        /// Print the result as a JSON line.
        #[arg(long)]
        json: bool,
    },

    /// Print the language detected for a file name.
    Classify {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
