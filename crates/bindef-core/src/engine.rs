//! Evaluation session: pragma state, command dispatch and the byte sink.

use std::fmt;
use std::io::Write;

use crate::{
    Blob, CommandError, Diagnostic, Diagnostics, EvalResult, EvaluationError, Invocation,
    Operation, Pragma, PragmaKey, PragmaSet, Registry, SessionConfig, Value,
};

/// One emission session.
///
/// Operations run strictly in order. The first failure aborts the run; bytes
/// already written to the primary sink stay written. Composite commands read
/// the bytes of an inner command through [`Engine::capture`], which diverts
/// emission into a buffer until the inner command returns.
pub struct Engine<'io> {
    pragmas: PragmaSet,
    registry: Registry,
    output: Box<dyn Write + 'io>,
    diagnostics: Diagnostics<'io>,
    captures: Vec<Vec<u8>>,
    bytes_written: u64,
}

impl<'io> Engine<'io> {
    /// Session with the primitives and the extension sets named in `config`.
    #[must_use]
    pub fn new(
        output: impl Write + 'io,
        diagnostics: impl Write + 'io,
        config: &SessionConfig,
    ) -> Self {
        Self::with_registry(
            Registry::with_extras(&config.extras),
            output,
            diagnostics,
            config,
        )
    }

    /// Session over an explicit command table.
    #[must_use]
    pub fn with_registry(
        registry: Registry,
        output: impl Write + 'io,
        diagnostics: impl Write + 'io,
        config: &SessionConfig,
    ) -> Self {
        Self {
            pragmas: config.initial_pragmas(),
            registry,
            output: Box::new(output),
            diagnostics: Diagnostics::new(diagnostics),
            captures: Vec::new(),
            bytes_written: 0,
        }
    }

    /// Current pragma values.
    #[must_use]
    pub const fn pragmas(&self) -> &PragmaSet {
        &self.pragmas
    }

    /// Current value of one pragma.
    #[must_use]
    pub const fn pragma(&self, key: PragmaKey) -> Pragma {
        self.pragmas.get(key)
    }

    /// Command table.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Command table, for registering extension commands.
    #[allow(clippy::missing_const_for_fn)]
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Bytes written to the primary sink so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Diagnostic lines written so far.
    #[must_use]
    pub const fn diagnostic_lines(&self) -> usize {
        self.diagnostics.lines_written()
    }

    /// Evaluates one operation.
    ///
    /// # Errors
    ///
    /// Returns the first [`EvaluationError`] raised by the operation.
    pub fn evaluate(&mut self, operation: &Operation) -> EvalResult<()> {
        self.dispatch(&operation.invocation())
    }

    /// Evaluates operations in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`EvaluationError`].
    pub fn evaluate_all(&mut self, operations: &[Operation]) -> EvalResult<()> {
        operations.iter().try_for_each(|op| self.evaluate(op))
    }

    /// Runs the command registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Unknown`] for an unregistered name, or the
    /// command's own failure.
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> EvalResult<()> {
        self.dispatch(&Invocation::new(name, args))
    }

    /// Resolves and runs one invocation.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Unknown`], [`CommandError::UnexpectedBlock`],
    /// or the command's own failure.
    pub fn dispatch(&mut self, invocation: &Invocation<'_>) -> EvalResult<()> {
        let command = self.registry.resolve(invocation)?;
        log::debug!("dispatch {}", invocation.describe());

        let start = self.position();
        command.call(self, invocation)?;
        let emitted = self.position() - start;
        self.verbose(format!("{} ({emitted} bytes)", invocation.describe()));
        Ok(())
    }

    /// Runs a command and returns the bytes it produced instead of writing
    /// them.
    ///
    /// If the command fails, whatever it produced before failing is passed
    /// on to the enclosing sink, as it would have been without the capture.
    ///
    /// # Errors
    ///
    /// Returns the command's failure.
    pub fn capture(&mut self, name: &str, args: &[Value]) -> EvalResult<Blob> {
        self.captures.push(Vec::new());
        let result = self.invoke(name, args);
        let bytes = self.captures.pop().unwrap_or_default();
        match result {
            Ok(()) => Ok(Blob::from(bytes)),
            Err(err) => {
                if let Err(flush_err) = self.append(&bytes) {
                    log::warn!("dropping {} captured bytes: {flush_err}", bytes.len());
                }
                Err(err)
            }
        }
    }

    /// Appends an encoded blob to the current sink.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Output`] if the primary sink fails.
    pub fn emit(&mut self, blob: &Blob) -> EvalResult<()> {
        self.append(blob.as_bytes())
    }

    /// Runs a primitive encoder against the current pragmas.
    ///
    /// Diagnostics the encoder records are written before its result is
    /// returned, whether it succeeded or not.
    ///
    /// # Errors
    ///
    /// Returns the encoder's [`CommandError`].
    pub fn encode_with<F>(&mut self, encode: F) -> EvalResult<Blob>
    where
        F: FnOnce(&PragmaSet, &mut Vec<Diagnostic>) -> Result<Blob, CommandError>,
    {
        let mut notes = Vec::new();
        let result = encode(&self.pragmas, &mut notes);
        for note in notes {
            self.diagnose(&note);
        }
        result.map_err(EvaluationError::from)
    }

    /// Validates and assigns one pragma.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PragmaError`] and leaves the pragmas unchanged.
    pub fn set_pragma(&mut self, key: &str, value: &Value) -> EvalResult<()> {
        let pragma = Pragma::parse(key, value)?;
        self.pragmas.apply(pragma);
        self.verbose(format!("pragma {pragma}"));
        Ok(())
    }

    /// Validates every entry, then assigns all of them.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::PragmaError`]; nothing is assigned.
    pub fn set_pragmas(&mut self, entries: &[(String, Value)]) -> EvalResult<()> {
        for pragma in self.pragmas.set_all(entries)? {
            self.verbose(format!("pragma {pragma}"));
        }
        Ok(())
    }

    /// Runs `body` under `overrides` and restores the full pragma snapshot
    /// afterwards, on success and on failure.
    ///
    /// # Errors
    ///
    /// Returns the override validation error (`body` does not run), or
    /// whatever `body` returned.
    pub fn scoped<T>(
        &mut self,
        overrides: &[(String, Value)],
        body: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let snapshot = self.pragmas;
        self.set_pragmas(overrides)?;
        let result = body(self);
        self.pragmas = snapshot;
        self.verbose("pragmas restored");
        result
    }

    /// Writes a `V:` line if `verbose` is on.
    pub fn verbose(&mut self, message: impl Into<String>) {
        self.diagnose(&Diagnostic::verbose(message));
    }

    /// Writes a `W:` line if `warnings` is on.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.diagnose(&Diagnostic::warning(message));
    }

    /// Writes a diagnostic, gated by the current pragmas.
    pub fn diagnose(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.emit(&self.pragmas, diagnostic);
    }

    /// Flushes both sinks.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Output`] if the primary sink fails.
    pub fn flush(&mut self) -> EvalResult<()> {
        self.diagnostics.flush();
        self.output
            .flush()
            .map_err(|err| EvaluationError::Output(err.to_string()))
    }

    fn position(&self) -> u64 {
        let buffered: usize = self.captures.iter().map(Vec::len).sum();
        self.bytes_written + buffered as u64
    }

    fn append(&mut self, bytes: &[u8]) -> EvalResult<()> {
        log::trace!(
            "append {} bytes at capture depth {}",
            bytes.len(),
            self.captures.len()
        );
        if let Some(buffer) = self.captures.last_mut() {
            buffer.extend_from_slice(bytes);
            return Ok(());
        }
        self.output
            .write_all(bytes)
            .map_err(|err| EvaluationError::Output(err.to_string()))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

impl fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("pragmas", &self.pragmas)
            .field("registry", &self.registry)
            .field("capture_depth", &self.captures.len())
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

/// `pragma {key: value, ...}` with an optional block.
///
/// Without a block the assignment persists. With a block it is scoped to the
/// block's operations.
pub(crate) fn pragma_command(engine: &mut Engine<'_>, call: &Invocation<'_>) -> EvalResult<()> {
    let entries = match call.args.len() {
        0 => &[][..],
        1 => call.mapping(0)?,
        given => {
            return Err(CommandError::Arity {
                command: call.name.to_string(),
                given,
                expected: "0..1",
            }
            .into())
        }
    };
    match call.block {
        Some(block) => engine.scoped(entries, |engine| engine.evaluate_all(block)),
        None => engine.set_pragmas(entries),
    }
}
