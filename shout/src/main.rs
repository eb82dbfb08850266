//! Command line entrypoint.
//!
//! Every subcommand reads one input (a path, or `-` for stdin) and writes its result to stdout.
//! Exits with 0 on success, 1 when the input is rejected and 2 on a usage error.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use shout_source::CompileError;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage:
    shout scan <file>                 source -> token stream
    shout parse [--tree] <file>       token stream -> JSON AST (or tree)
    shout gen <file>                  JSON AST -> C
    shout compile <file> [-o <out>]   source -> C

Pass `-` as <file> to read from stdin. Set SHOUT_LOG to control logging.";

#[derive(Debug, Error)]
enum UsageError {
    #[error("missing subcommand")]
    MissingCommand,
    #[error("unknown subcommand '{0}'")]
    UnknownCommand(String),
    #[error("missing input file")]
    MissingInput,
    #[error("missing value for '{0}'")]
    MissingValue(String),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

#[derive(Debug)]
enum Command {
    Scan { input: String },
    Parse { input: String, tree: bool },
    Gen { input: String },
    Compile { input: String, output: Option<PathBuf> },
}

impl Command {
    fn from_args(args: &[String]) -> Result<Self, UsageError> {
        let (command, rest) = args.split_first().ok_or(UsageError::MissingCommand)?;

        let mut input = None;
        let mut tree = false;
        let mut output = None;
        let mut rest = rest.iter();
        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--tree" if command == "parse" => tree = true,
                "-o" if command == "compile" => {
                    let path = rest
                        .next()
                        .ok_or_else(|| UsageError::MissingValue(arg.clone()))?;
                    output = Some(PathBuf::from(path));
                }
                _ if input.is_none() && (arg == "-" || !arg.starts_with('-')) => {
                    input = Some(arg.clone())
                }
                _ => return Err(UsageError::UnexpectedArgument(arg.clone())),
            }
        }
        let input = input.ok_or(UsageError::MissingInput)?;

        match command.as_str() {
            "scan" => Ok(Command::Scan { input }),
            "parse" => Ok(Command::Parse { input, tree }),
            "gen" => Ok(Command::Gen { input }),
            "compile" => Ok(Command::Compile { input, output }),
            other => Err(UsageError::UnknownCommand(other.to_string())),
        }
    }
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("reading stdin")?;
        Ok(content)
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {:?}", input))
    }
}

/// Attaches the input name, and the line and column for lexical errors.
fn locate(
    result: Result<String, CompileError>,
    input: &str,
    content: &str,
) -> anyhow::Result<String> {
    result.map_err(|err| {
        let location = match &err {
            CompileError::Lexical(lexical) => format!("{} ({})", input, lexical.locate(content)),
            _ => input.to_string(),
        };
        anyhow::Error::new(err).context(format!("cannot process {}", location))
    })
}

fn run(command: Command) -> anyhow::Result<()> {
    debug!(?command, "running");
    match command {
        Command::Scan { input } => {
            let content = read_input(&input)?;
            print!("{}", locate(shout::scan(&content), &input, &content)?);
        }
        Command::Parse { input, tree } => {
            let content = read_input(&input)?;
            let result = if tree {
                shout::parse_tree(&content)
            } else {
                shout::parse(&content).map(|json| json + "\n")
            };
            print!("{}", locate(result, &input, &content)?);
        }
        Command::Gen { input } => {
            let content = read_input(&input)?;
            print!("{}", locate(shout::generate(&content), &input, &content)?);
        }
        Command::Compile { input, output } => {
            let content = read_input(&input)?;
            let code = locate(shout::compile(&content), &input, &content)?;
            match output {
                Some(path) => {
                    fs::write(&path, code).with_context(|| format!("writing {:?}", path))?
                }
                None => print!("{}", code),
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("SHOUT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let command = match Command::from_args(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {}\n\n{}", err, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
