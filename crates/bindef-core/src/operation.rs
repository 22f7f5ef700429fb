//! Operations, argument values, and argument access for command handlers.

use std::fmt;

use crate::{CommandError, Int};

/// A single argument value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Value {
    /// `true` or `false`.
    Bool(bool),
    /// Integer literal.
    Int(Int),
    /// Floating-point literal.
    Float(f64),
    /// Text.
    Str(String),
    /// Bare name, used for command references and enumerated pragma values.
    Symbol(String),
    /// Ordered `key: value` pairs.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Short name of the value's kind for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Map(_) => "mapping",
        }
    }

    /// Shorthand for a string value.
    #[must_use]
    pub fn str(text: impl Into<String>) -> Self {
        Self::Str(text.into())
    }

    /// Shorthand for a symbol value.
    #[must_use]
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// Shorthand for an integer value.
    #[must_use]
    pub fn int(value: impl Into<Int>) -> Self {
        Self::Int(value.into())
    }

    /// Shorthand for a single-entry mapping.
    #[must_use]
    pub fn entry(key: impl Into<String>, value: Self) -> Self {
        Self::Map(vec![(key.into(), value)])
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) | Self::Symbol(s) => f.write_str(s),
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// One named emission request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Operation {
    name: String,
    args: Vec<Value>,
    block: Option<Vec<Operation>>,
}

impl Operation {
    /// Creates an operation without a block.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
            block: None,
        }
    }

    /// Attaches a nested operation sequence.
    #[must_use]
    pub fn with_block(mut self, block: Vec<Self>) -> Self {
        self.block = Some(block);
        self
    }

    /// Command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Nested operations, if any.
    #[must_use]
    pub fn block(&self) -> Option<&[Self]> {
        self.block.as_deref()
    }

    /// Borrowed view handed to the command handler.
    #[must_use]
    pub fn invocation(&self) -> Invocation<'_> {
        Invocation {
            name: &self.name,
            args: &self.args,
            block: self.block(),
        }
    }
}

/// Borrowed arguments of a command call.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Command name as dispatched.
    pub name: &'a str,
    /// Positional arguments.
    pub args: &'a [Value],
    /// Nested operations.
    pub block: Option<&'a [Operation]>,
}

impl<'a> Invocation<'a> {
    /// Invocation without a block.
    #[must_use]
    pub const fn new(name: &'a str, args: &'a [Value]) -> Self {
        Self {
            name,
            args,
            block: None,
        }
    }

    /// Renders `name arg arg ...` for unknown-command reports.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut text = self.name.to_string();
        for arg in self.args {
            text.push(' ');
            text.push_str(&arg.to_string());
        }
        text
    }

    /// Fails unless exactly `count` arguments were given.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Arity`] on a count mismatch.
    pub fn expect_arity(&self, count: usize, expected: &'static str) -> Result<(), CommandError> {
        if self.args.len() == count {
            Ok(())
        } else {
            Err(CommandError::Arity {
                command: self.name.to_string(),
                given: self.args.len(),
                expected,
            })
        }
    }

    fn arg(&self, index: usize) -> Result<&'a Value, CommandError> {
        self.args.get(index).ok_or_else(|| CommandError::Arity {
            command: self.name.to_string(),
            given: self.args.len(),
            expected: "more",
        })
    }

    fn mismatch(&self, index: usize, expected: &'static str, got: &Value) -> CommandError {
        CommandError::BadArgument {
            command: self.name.to_string(),
            index,
            expected,
            got: got.kind().to_string(),
        }
    }

    /// Integer argument at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the argument is missing or not an integer.
    pub fn int(&self, index: usize) -> Result<Int, CommandError> {
        match self.arg(index)? {
            Value::Int(value) => Ok(*value),
            other => Err(self.mismatch(index, "integer", other)),
        }
    }

    /// Numeric argument at `index`, widened to `f64`.
    ///
    /// # Errors
    ///
    /// Fails when the argument is missing or not numeric.
    pub fn number(&self, index: usize) -> Result<f64, CommandError> {
        match self.arg(index)? {
            Value::Float(value) => Ok(*value),
            Value::Int(value) => Ok(value.to_f64()),
            other => Err(self.mismatch(index, "number", other)),
        }
    }

    /// String argument at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the argument is missing or not a string.
    pub fn text(&self, index: usize) -> Result<&'a str, CommandError> {
        match self.arg(index)? {
            Value::Str(value) => Ok(value),
            other => Err(self.mismatch(index, "string", other)),
        }
    }

    /// Command-name argument at `index`; accepts a symbol or a string.
    ///
    /// # Errors
    ///
    /// Fails when the argument is missing or not a name.
    pub fn command_name(&self, index: usize) -> Result<&'a str, CommandError> {
        match self.arg(index)? {
            Value::Symbol(value) | Value::Str(value) => Ok(value),
            other => Err(self.mismatch(index, "command name", other)),
        }
    }

    /// Mapping argument at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the argument is missing or not a mapping.
    pub fn mapping(&self, index: usize) -> Result<&'a [(String, Value)], CommandError> {
        match self.arg(index)? {
            Value::Map(entries) => Ok(entries),
            other => Err(self.mismatch(index, "mapping", other)),
        }
    }
}
