//! Printers: function listings and execution results, coloured or JSON.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::{execution::ExecutionResult, extract::FunctionRecord};

pub struct TextPrinter {
    pub color: bool,
}

impl TextPrinter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn print_records(&self, out: &mut impl Write, records: &[FunctionRecord]) -> io::Result<()> {
        for r in records {
            let lines = format!("{}-{}", r.line_start, r.line_end);
            if self.color {
                writeln!(out, "{:>9}  {}", lines.dimmed(), r.signature().cyan())?;
            } else {
                writeln!(out, "{:>9}  {}", lines, r.signature())?;
            }
        }
        Ok(())
    }

    pub fn print_result(&self, out: &mut impl Write, result: &ExecutionResult) -> io::Result<()> {
        match (result, self.color) {
            (ExecutionResult::Success { result }, true) => writeln!(out, "{}", result.green()),
            (ExecutionResult::Success { result }, false) => writeln!(out, "{}", result),
            (ExecutionResult::Failure { error }, true) => writeln!(out, "{} {}", "error:".red().bold(), error),
            (ExecutionResult::Failure { error }, false) => writeln!(out, "error: {}", error),
        }
    }
}

pub struct JsonPrinter;

impl JsonPrinter {
    pub fn print_records(out: &mut impl Write, records: &[FunctionRecord]) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, records)?;
        writeln!(out)
    }

    /// One line, the same shape drivers emit.
    pub fn print_result(out: &mut impl Write, result: &ExecutionResult) -> io::Result<()> {
        serde_json::to_writer(&mut *out, result)?;
        writeln!(out)
    }
}
