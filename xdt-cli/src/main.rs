//! xdtdiff - writes an XDT patch turning one XML config into another.
//!
//! Exit codes: 0 success, 1 invalid parameters, 2 no difference,
//! 3 root element mismatch, 100 any other error.

use std::fs;
use std::io;
use std::iter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Args, Parser};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use xdt_diff::xml::{XmlPrinter, XmlPrinterOptions};
use xdt_diff::{
    align_keyed_children, parse_file, Comparison, InsertStrategy, Matching, Settings,
    StructuralMatching, XdtWriter, WriterOptions,
};

const BIN_NAME: &str = "xdtdiff";

/// Writes an XML-Document-Transform patch turning SOURCE into TARGET
#[derive(Parser, Debug)]
#[command(name = BIN_NAME)]
#[command(version)]
#[command(about = "Writes an XML-Document-Transform patch turning one XML config into another", long_about = None)]
struct Cli {
    /// Run every line of FILE as a separate invocation
    #[arg(long, value_name = "FILE", conflicts_with_all = ["source", "target", "output"])]
    batch: Option<PathBuf>,

    #[command(flatten)]
    args: DiffArgs,

    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// The config file before the change
    #[arg(required_unless_present = "batch")]
    source: Option<PathBuf>,

    /// The final config file
    #[arg(required_unless_present = "batch")]
    target: Option<PathBuf>,

    /// Where to write the patch
    #[arg(required_unless_present = "batch")]
    output: Option<PathBuf>,

    /// JSON settings with `remove_node_path` and `reset_node_path`
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Align the keyed collection at PATH before diffing (repeatable)
    #[arg(long = "keyed", value_name = "PATH")]
    keyed: Vec<String>,

    /// Attribute identifying children of keyed collections
    #[arg(long, value_name = "NAME", default_value = "key")]
    key_attribute: String,

    /// Place inserts with InsertBefore/InsertAfter instead of appending
    #[arg(long)]
    positional_inserts: bool,

    /// Write the patch without indentation
    #[arg(long)]
    compact: bool,
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success = 0,
    InvalidParameters = 1,
    NoDifference = 2,
    RootMismatch = 3,
    UnknownError = 100,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status as u8)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let status = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Status::Success,
                _ => Status::InvalidParameters,
            };
            let _ = err.print();
            return status.into();
        }
    };

    init_logging(cli.verbose, cli.quiet);

    let status = match &cli.batch {
        Some(file) => run_batch(file),
        None => run(&cli.args),
    };
    status.into()
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{BIN_NAME}={level},xdt_diff={level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

/// Runs one invocation, mapping failures to an exit status.
fn run(args: &DiffArgs) -> Status {
    match transform_file(args) {
        Ok(status) => status,
        Err(err) => {
            error!("{err:#}");
            Status::UnknownError
        }
    }
}

fn transform_file(args: &DiffArgs) -> Result<Status> {
    let (Some(source), Some(target), Some(output)) = (&args.source, &args.target, &args.output)
    else {
        error!("expected SOURCE, TARGET and OUTPUT files");
        return Ok(Status::InvalidParameters);
    };

    let settings = match &args.settings {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?,
        None => Settings::default(),
    };

    info!("building xml trees");
    let mut old = parse_file(source).with_context(|| format!("failed to parse {}", source.display()))?;
    let mut new = parse_file(target).with_context(|| format!("failed to parse {}", target.display()))?;

    let mut missing = Vec::new();
    for path in &args.keyed {
        if let Some(report) = align_keyed_children(&old, &mut new, path, &args.key_attribute) {
            missing.push((path, report));
        }
    }

    info!("comparing xml trees");
    let mut matcher = StructuralMatching::new();
    match matcher.build_matching(&mut old, &mut new) {
        Comparison::Identical => {
            warn!("no difference found");
            return Ok(Status::NoDifference);
        }
        Comparison::RootMismatch { old, new } => {
            error!(%old, %new, "root elements must have the same name");
            return Ok(Status::RootMismatch);
        }
        Comparison::Changed => {}
    }

    info!("writing xdt transform");
    let options = WriterOptions {
        insert_strategy: if args.positional_inserts {
            InsertStrategy::Positional
        } else {
            InsertStrategy::Append
        },
        pretty_print: !args.compact,
    };
    let patch = XdtWriter::with_options(&settings, options).write(&old, &new)?;
    patch
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    for (path, report) in &missing {
        info!(path = path.as_str(), "nodes missing from the source collection");
        let mut stdout = io::stdout().lock();
        XmlPrinter::with_options(&mut stdout, XmlPrinterOptions { pretty_print: true })
            .print_fragment(report, report.root())?;
    }

    info!(output = %output.display(), "finished successfully");
    Ok(Status::Success)
}

/// Runs each non-blank line of `file` as its own invocation.
///
/// Failing lines are logged and skipped; the batch itself succeeds.
fn run_batch(file: &Path) -> Status {
    let content = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(err) => {
            error!(file = %file.display(), "failed to read batch file: {err}");
            return Status::InvalidParameters;
        }
    };

    for (number, line) in content.lines().enumerate() {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if is_program_token(tokens[0]) {
            tokens.remove(0);
        }

        let line = number + 1;
        info!(line, "running batch entry");
        match Cli::try_parse_from(iter::once(BIN_NAME).chain(tokens)) {
            Ok(entry) if entry.batch.is_some() => warn!(line, "nested --batch ignored"),
            Ok(entry) => {
                let status = run(&entry.args);
                if status != Status::Success {
                    warn!(line, ?status, "batch entry did not succeed");
                }
            }
            Err(err) => warn!(line, "invalid arguments: {}", err.to_string().trim_end()),
        }
    }

    info!("finished batch");
    Status::Success
}

/// Whether a batch line starts with the program itself, e.g. `./xdtdiff.exe`.
fn is_program_token(token: &str) -> bool {
    Path::new(token)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case(BIN_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_positional_and_flags() {
        let cli = Cli::try_parse_from([
            BIN_NAME,
            "old.config",
            "new.config",
            "patch.config",
            "--keyed",
            "/configuration/appSettings",
            "--positional-inserts",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.args.source, Some(PathBuf::from("old.config")));
        assert_eq!(cli.args.keyed, vec!["/configuration/appSettings"]);
        assert_eq!(cli.args.key_attribute, "key");
        assert!(cli.args.positional_inserts);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_missing_arguments_rejected() {
        let err = Cli::try_parse_from([BIN_NAME, "old.config"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_batch_alone() {
        let cli = Cli::try_parse_from([BIN_NAME, "--batch", "jobs.txt"]).unwrap();
        assert_eq!(cli.batch, Some(PathBuf::from("jobs.txt")));
        assert!(cli.args.source.is_none());
    }

    #[test]
    fn test_program_token() {
        assert!(is_program_token("./xdtdiff.exe"));
        assert!(is_program_token("XDTDIFF"));
        assert!(!is_program_token("old.config"));
    }

    #[test]
    fn test_exit_status_values() {
        assert_eq!(Status::NoDifference as u8, 2);
        assert_eq!(Status::UnknownError as u8, 100);
    }
}
