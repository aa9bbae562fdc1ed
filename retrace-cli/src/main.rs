//! `retrace`: print lines matching a backtracking regular expression
//!
//! Matching recurses roughly once per character consumed by a repeat, so
//! searches run on a dedicated thread with a [`SEARCH_STACK_SIZE`] stack.
//! Lines far longer than a default thread stack allows are fine, but there is
//! still a limit: a line of millions of characters walked by one repeat
//! exhausts the stack and aborts the process.

mod search;

use clap::Parser;
use colored::Colorize;
use retrace_core::Pattern;
use search::Output;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

/// Stack reserved for the search thread
const SEARCH_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Exit status when some line matched
const STATUS_MATCH: u8 = 0;
/// Exit status when no line matched
const STATUS_NO_MATCH: u8 = 1;
/// Exit status when an error was reported
const STATUS_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "retrace")]
#[command(about = "Retrace - print lines matching a backtracking regular expression")]
#[command(version)]
struct Cli {
    /// Interpret PATTERN as an extended regular expression (always on)
    #[arg(short = 'E', long = "extended-regexp")]
    extended: bool,

    /// Search directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Highlight the matched text
    #[arg(long)]
    color: bool,

    /// Print the parsed pattern and its match graph instead of searching
    #[arg(long)]
    explain: bool,

    /// The pattern to search for
    pattern: String,

    /// Files or directories to search; standard input when omitted
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let code = on_search_thread(move || {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        status(run(&cli, &mut out))
    })
    .unwrap_or(STATUS_ERROR);

    ExitCode::from(code)
}

fn report(message: impl std::fmt::Display) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Map the outcome of [`run`] to the process exit status
fn status(result: Result<bool, ()>) -> u8 {
    match result {
        Ok(true) => STATUS_MATCH,
        Ok(false) => STATUS_NO_MATCH,
        Err(()) => STATUS_ERROR,
    }
}

/// Run `task` on a thread with a [`SEARCH_STACK_SIZE`] stack and wait for it
fn on_search_thread<T, F>(task: F) -> Result<T, ()>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("search".to_string())
        .stack_size(SEARCH_STACK_SIZE)
        .spawn(task)
        .map_err(|e| report(format_args!("cannot start search thread: {e}")))?;

    handle
        .join()
        .map_err(|_| report("search thread panicked"))
}

/// Returns whether any line matched; `Err` when an error was reported
fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<bool, ()> {
    if !cli.extended {
        log::debug!("-E not given; patterns are always read as extended syntax");
    }

    let pattern = match Pattern::compile(&cli.pattern) {
        Ok(pattern) => pattern,
        Err(e) => {
            report(format_args!("{:?}: {e}", cli.pattern));
            return Err(());
        }
    };

    if cli.explain {
        return explain(&pattern, out)
            .map(|()| true)
            .map_err(report);
    }

    if cli.files.is_empty() {
        let stdin = io::stdin();
        return search::search_reader(
            &pattern,
            stdin.lock(),
            "(standard input)",
            Output {
                with_filename: false,
                color: cli.color,
            },
            out,
        )
        .map_err(|e| report(format_args!("(standard input): {e}")));
    }

    let output = Output {
        with_filename: cli.files.len() > 1 || cli.recursive,
        color: cli.color,
    };

    let (files, errors) = search::collect_files(&cli.files, cli.recursive);
    let mut failed = !errors.is_empty();
    for (path, e) in errors {
        report(format_args!("{}: {e}", path.display()));
    }

    let mut matched = false;
    for path in &files {
        match search::search_file(&pattern, path, output, out) {
            Ok(found) => matched |= found,
            Err(e) => {
                report(format_args!("{}: {e}", path.display()));
                failed = true;
            }
        }
    }

    if let Err(e) = out.flush() {
        report(e);
        failed = true;
    }

    if failed { Err(()) } else { Ok(matched) }
}

fn explain<W: Write>(pattern: &Pattern, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "Pattern".bold())?;
    writeln!(out, "  source:  {}", pattern.as_str().cyan())?;
    writeln!(out, "  parsed:  {}", pattern.expr().to_string().green())?;
    writeln!(out, "  groups:  {}", pattern.group_count())?;
    writeln!(out)?;
    writeln!(out, "{}", "Graph".bold())?;
    write!(out, "{}", pattern.graph())
}
