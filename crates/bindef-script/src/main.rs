//! CLI entry point for the `bindef` binary.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bindef_core::{Extra, SessionConfig};
use bindef_script::{emit_source, ScriptError, ScriptErrorKind, Source};
use clap::Parser;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;

/// Emits binary data described by a bindef script.
#[derive(Debug, Parser)]
#[command(name = "bindef", version, about)]
struct Cli {
    /// Script to run (`.md` for literate input); stdin when absent or `-`.
    input: Option<PathBuf>,

    /// File to write bytes to; stdout when absent.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Start with the `verbose` pragma enabled.
    #[arg(short, long)]
    verbose: bool,

    /// Start with the `warnings` pragma disabled.
    #[arg(short = 'W', long)]
    no_warnings: bool,

    /// Comma-separated extension sets to load, or `none`.
    #[arg(short, long, value_parser = parse_extras, default_value = "ctrl,int128,string,tlv")]
    extras: ExtraList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExtraList(Vec<Extra>);

fn parse_extras(list: &str) -> Result<ExtraList, String> {
    if list == "none" {
        return Ok(ExtraList(Vec::new()));
    }
    list.split(',')
        .map(|name| name.trim().parse::<Extra>())
        .collect::<Result<Vec<_>, _>>()
        .map(ExtraList)
}

impl Cli {
    fn config(&self) -> SessionConfig {
        SessionConfig {
            verbose: self.verbose,
            warnings: !self.no_warnings,
            extras: self.extras.0.clone(),
        }
    }

    fn stdin_input(&self) -> bool {
        self.input.as_deref().is_none_or(|path| path == Path::new("-"))
    }
}

fn read_source(cli: &Cli) -> Result<Source, ScriptError> {
    let read_error = |err: io::Error| ScriptError::new(ScriptErrorKind::Read(err.to_string()));
    match &cli.input {
        Some(path) if !cli.stdin_input() => {
            let content = fs::read_to_string(path).map_err(read_error)?;
            Ok(Source::from_file(path, &content))
        }
        _ => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content).map_err(read_error)?;
            Ok(Source::from_text("<stdin>", &content))
        }
    }
}

#[allow(clippy::option_if_let_else)]
fn run(cli: &Cli) -> Result<(), ScriptError> {
    let source = read_source(cli)?;
    let config = cli.config();
    let stderr = io::stderr().lock();

    let summary = match &cli.output {
        Some(path) => {
            let file = File::create(path).map_err(|err| {
                ScriptError::new(ScriptErrorKind::Create {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                })
            })?;
            emit_source(&source, BufWriter::new(file), stderr, &config)?
        }
        None => emit_source(&source, io::stdout().lock(), stderr, &config)?,
    };

    log::info!(
        "{}: {} statements, {} bytes",
        source.name,
        summary.statements,
        summary.bytes
    );
    Ok(())
}

/// Flushes bytes written before a failure, logging a sink that refuses them.
fn flush_or_warn(out: &mut impl Write) -> bool {
    match out.flush() {
        Ok(()) => true,
        Err(err) => {
            log::warn!("failed to flush stdout: {err}");
            false
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            flush_or_warn(&mut io::stdout());
            eprintln!("{}", err.format_for_stderr());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use bindef_core::Extra;
    use clap::Parser;

    use super::{flush_or_warn, parse_extras, Cli, ExtraList};

    struct ClosedPipe;

    impl std::io::Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bindef").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_read_stdin_with_every_extra() {
        let cli = parse(&[]);
        assert!(cli.stdin_input());
        assert_eq!(cli.output, None);
        let config = cli.config();
        assert!(!config.verbose);
        assert!(config.warnings);
        assert_eq!(config.extras, Extra::ALL);
    }

    #[test]
    fn dash_means_stdin() {
        assert!(parse(&["-"]).stdin_input());
        assert!(!parse(&["layout.bd"]).stdin_input());
    }

    #[test]
    fn flags_map_onto_session_config() {
        let cli = parse(&["in.md", "-o", "out.bin", "-v", "-W", "-e", "string,tlv"]);
        assert_eq!(cli.input, Some(PathBuf::from("in.md")));
        assert_eq!(cli.output, Some(PathBuf::from("out.bin")));
        let config = cli.config();
        assert!(config.verbose);
        assert!(!config.warnings);
        assert_eq!(config.extras, [Extra::String, Extra::Tlv]);
    }

    #[test]
    fn extras_list_parsing() {
        assert_eq!(parse_extras("none"), Ok(ExtraList(Vec::new())));
        assert_eq!(
            parse_extras("ctrl, int128"),
            Ok(ExtraList(vec![Extra::Ctrl, Extra::Int128]))
        );
        assert_eq!(
            parse_extras("ctrl,bogus"),
            Err("unknown extra: bogus".to_string())
        );
    }

    #[test]
    fn unknown_extra_is_a_usage_error() {
        let args = ["bindef", "--extras", "bogus"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn flush_failures_are_reported_not_raised() {
        assert!(!flush_or_warn(&mut ClosedPipe));
        assert!(flush_or_warn(&mut Vec::<u8>::new()));
    }
}
