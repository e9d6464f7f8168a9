// This file is part of dotql, a JSON query tool.
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
// dotql is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// dotql is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with dotql.  If not, see <http://www.gnu.org/licenses/>.

#![allow(dead_code)]

mod diagnostics;
mod eval;
mod json;
mod lang;
mod util;

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use eval::error::Error;
use eval::Evaluator;
use json::ser::Options as SerializeOptions;
use lang::parser::parse;

/// The name of the tool, used only in `--help` output (clap derives the
/// rest from `Cargo.toml`).
pub const PROGRAM_NAME: &str = "dotql";

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Evaluate a small jq-like query against JSON read from stdin.
#[derive(Parser)]
#[command(name = PROGRAM_NAME, version, about)]
struct Args {
    /// Query expression. Empty or omitted means the identity query.
    #[arg(default_value = "")]
    query: String,

    /// Force compact (single-line) output, regardless of whether stdout is a TTY.
    #[arg(long)]
    compact: bool,

    /// Control ANSI color in the output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

/// An error tagged with which source text (the query, or stdin input)
/// it should be rendered against.
struct Diagnostic {
    error: Error,
    source_is_query: bool,
}

fn main() -> ExitCode {
    #[cfg(debug_assertions)]
    env_logger::init();

    let args = Args::parse();

    let input = match read_stdin() {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{PROGRAM_NAME}: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    match run(&args, &input) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        },
        Err(diag) => {
            let stderr_is_tty = io::stderr().is_terminal();
            let color = match args.color {
                ColorMode::Always => true,
                ColorMode::Never => false,
                ColorMode::Auto => stderr_is_tty,
            };
            let source = if diag.source_is_query { args.query.as_str() } else { input.as_str() };
            eprintln!("{}", diagnostics::render(source, &diag.error, color));
            ExitCode::FAILURE
        },
    }
}

/// Reads stdin to EOF, wrapping the I/O error with `anyhow` context —
/// the one error stage that doesn't carry a source `Range`.
fn read_stdin() -> anyhow::Result<String> {
    use anyhow::Context;
    let mut input = String::new();
    io::stdin().read_to_string(&mut input).context("error reading stdin")?;
    Ok(input)
}

fn run(args: &Args, input: &str) -> Result<String, Diagnostic> {
    log::trace!("deserializing stdin ({} bytes)", input.len());
    let value = json::parse::deserialize(input)
        .map_err(|error| Diagnostic { error, source_is_query: false })?;

    let query = args.query.trim();
    let result = if query.is_empty() {
        log::trace!("empty query, passing input through unchanged");
        value
    } else {
        log::trace!("parsing query {:?}", query);
        let ast = parse(query).map_err(|error| Diagnostic { error, source_is_query: true })?;

        log::trace!("evaluating");
        Evaluator::new(value)
            .eval_to_json(&ast)
            .map_err(|e| Diagnostic { error: Error::Eval(e), source_is_query: true })?
    };

    let stdout_is_tty = io::stdout().is_terminal();
    let indent = !args.compact && stdout_is_tty;
    let color = match args.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stdout_is_tty,
    };

    let options = if indent { SerializeOptions::indented() } else { SerializeOptions::compact() };
    Ok(json::ser::serialize(&result, options.colored(color)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(query: &str) -> Args {
        Args { query: query.to_string(), compact: true, color: ColorMode::Never }
    }

    #[test]
    fn empty_query_is_identity() {
        let out = run(&args(""), r#"{"a":1}"#).unwrap();
        assert_eq!( out, r#"{"a": 1}"# );
    }

    #[test]
    fn whitespace_only_query_is_identity() {
        let out = run(&args("   "), "[1, 2]").unwrap();
        assert_eq!( out, "[1, 2]" );
    }

    #[test]
    fn non_empty_query_still_evaluates() {
        let out = run(&args(".a"), r#"{"a":1}"#).unwrap();
        assert_eq!( out, "1" );
    }
}
