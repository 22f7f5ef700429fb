//! Statement evaluation over an engine.

use std::io::Write;

use bindef_core::{Engine, SessionConfig};

use crate::errors::{ScriptError, ScriptResult};
use crate::parser::{parse_script, Script};
use crate::source::Source;

/// Totals of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Top-level statements evaluated.
    pub statements: usize,
    /// Bytes written to the primary sink.
    pub bytes: u64,
}

/// Evaluates `script` in order, stopping at the first failure.
///
/// Bytes of statements before the failing one stay written.
///
/// # Errors
///
/// Returns the evaluation error located at the failing statement's line in
/// the input named `file`.
pub fn run_script(script: &Script, engine: &mut Engine<'_>, file: &str) -> ScriptResult<RunSummary> {
    let start = engine.bytes_written();
    for statement in &script.statements {
        engine
            .evaluate(&statement.operation)
            .map_err(|err| ScriptError::evaluation(file, statement.line, err))?;
    }
    let summary = RunSummary {
        statements: script.statements.len(),
        bytes: engine.bytes_written() - start,
    };
    log::debug!(
        "{file}: {} statements, {} bytes",
        summary.statements,
        summary.bytes
    );
    Ok(summary)
}

/// Parses and runs `source` in a fresh session, then flushes both sinks.
///
/// # Errors
///
/// Returns the first parse or evaluation error, or an output error raised
/// while flushing.
pub fn emit_source(
    source: &Source,
    output: impl Write,
    diagnostics: impl Write,
    config: &SessionConfig,
) -> ScriptResult<RunSummary> {
    let script = parse_script(source).map_err(|err| ScriptError::parse(&source.name, err))?;
    let mut engine = Engine::new(output, diagnostics, config);
    let outcome = run_script(&script, &mut engine, &source.name);
    let flushed = engine.flush();
    let summary = outcome?;
    flushed.map_err(|err| {
        let line = source.lines.last().map_or(1, |line| line.number);
        ScriptError::evaluation(&source.name, line, err)
    })?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use bindef_core::{CommandError, EvaluationError, SessionConfig};

    use super::{emit_source, RunSummary};
    use crate::errors::ScriptErrorKind;
    use crate::source::Source;

    fn emit(text: &str, config: &SessionConfig) -> (Result<RunSummary, String>, Vec<u8>, String) {
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let result = emit_source(
            &Source::from_text("fixture.bd", text),
            &mut out,
            &mut diag,
            config,
        )
        .map_err(|err| err.format_for_stderr());
        (result, out, String::from_utf8(diag).unwrap())
    }

    #[test]
    fn summary_counts_top_level_statements() {
        let (result, out, _) = emit(
            "u8 1\npragma endian: :big do\n  u16 2\n  u16 3\nend\n",
            &SessionConfig::default(),
        );
        assert_eq!(
            result,
            Ok(RunSummary {
                statements: 2,
                bytes: 5
            })
        );
        assert_eq!(out, [0x01, 0x00, 0x02, 0x00, 0x03]);
    }

    #[test]
    fn failure_keeps_earlier_bytes_and_reports_line() {
        let (result, out, _) = emit("u8 1\n\nu8 256\nu8 2\n", &SessionConfig::default());
        assert_eq!(
            result,
            Err("fixture.bd:3:1: error: width of 256 exceeds 8 bits".to_string())
        );
        assert_eq!(out, [0x01]);
    }

    #[test]
    fn parse_errors_stop_before_any_output() {
        let (result, out, _) = emit("u8 1\nu8 \"open\n", &SessionConfig::default());
        assert_eq!(
            result,
            Err("fixture.bd:2:4: error: unterminated string literal".to_string())
        );
        assert!(out.is_empty());
    }

    #[test]
    fn config_flags_reach_the_session() {
        let config = SessionConfig {
            verbose: true,
            ..SessionConfig::default()
        };
        let (result, _, diag) = emit("u8 1\n", &config);
        assert!(result.is_ok());
        assert_eq!(diag, "V: u8 1 (1 bytes)\n");
    }

    #[test]
    fn evaluation_errors_keep_their_kind() {
        let mut out = Vec::new();
        let error = emit_source(
            &Source::from_text("x", "frob 1"),
            &mut out,
            std::io::sink(),
            &SessionConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            error.kind,
            ScriptErrorKind::Evaluation(EvaluationError::Command(CommandError::Unknown(
                "frob 1".into()
            )))
        );
    }
}
