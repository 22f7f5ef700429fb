//! Name to handler registry shared by primitives, composites and extensions.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::{extras, primitive, CommandError, Engine, EvalResult, Invocation};

/// Handler signature every command implements.
pub type Handler = dyn Fn(&mut Engine<'_>, &Invocation<'_>) -> EvalResult<()>;

/// A registered command.
#[derive(Clone)]
pub struct Command {
    handler: Rc<Handler>,
    takes_block: bool,
}

impl Command {
    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub fn call(&self, engine: &mut Engine<'_>, invocation: &Invocation<'_>) -> EvalResult<()> {
        (self.handler)(engine, invocation)
    }

    /// Returns true when the command accepts a nested block.
    #[must_use]
    pub const fn takes_block(&self) -> bool {
        self.takes_block
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("takes_block", &self.takes_block)
            .finish_non_exhaustive()
    }
}

/// Optional command sets layered over the primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Extra {
    /// ASCII control-code mnemonics (`nul` .. `us`).
    Ctrl,
    /// `u128` and `i128`.
    Int128,
    /// `strz`, `strnz` and `lstr`.
    String,
    /// `tlv_u8`, `tlv_u16` and `tlv_u32`.
    Tlv,
}

impl Extra {
    /// Every extension set.
    pub const ALL: [Self; 4] = [Self::Ctrl, Self::Int128, Self::String, Self::Tlv];

    /// Set name as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ctrl => "ctrl",
            Self::Int128 => "int128",
            Self::String => "string",
            Self::Tlv => "tlv",
        }
    }
}

impl fmt::Display for Extra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Extra {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|extra| extra.name() == s)
            .ok_or_else(|| format!("unknown extra: {s}"))
    }
}

/// Command table of one engine.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    commands: HashMap<String, Command>,
}

impl Registry {
    /// Registry with no commands at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// `pragma` plus the integer, float and `str` encoders.
    #[must_use]
    pub fn primitives() -> Self {
        let mut registry = Self::empty();
        registry.register_block_command("pragma", crate::engine::pragma_command);
        primitive::register(&mut registry);
        registry
    }

    /// Primitives plus the chosen extension sets.
    #[must_use]
    pub fn with_extras(extras: &[Extra]) -> Self {
        let mut registry = Self::primitives();
        for extra in extras {
            registry.install(*extra);
        }
        registry
    }

    /// Primitives plus every extension set.
    #[must_use]
    pub fn standard() -> Self {
        Self::with_extras(&Extra::ALL)
    }

    /// Registers the commands of one extension set.
    pub fn install(&mut self, extra: Extra) {
        log::debug!("installing {extra} commands");
        match extra {
            Extra::Ctrl => extras::ctrl::register(self),
            Extra::Int128 => extras::int128::register(self),
            Extra::String => extras::string::register(self),
            Extra::Tlv => extras::tlv::register(self),
        }
    }

    /// Registers `handler` under `name`, returning the command it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut Engine<'_>, &Invocation<'_>) -> EvalResult<()> + 'static,
    ) -> Option<Command> {
        self.insert(name.into(), Rc::new(handler), false)
    }

    /// Like [`Self::register`], for a command that accepts a nested block.
    pub fn register_block_command(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut Engine<'_>, &Invocation<'_>) -> EvalResult<()> + 'static,
    ) -> Option<Command> {
        self.insert(name.into(), Rc::new(handler), true)
    }

    fn insert(&mut self, name: String, handler: Rc<Handler>, takes_block: bool) -> Option<Command> {
        self.commands.insert(
            name,
            Command {
                handler,
                takes_block,
            },
        )
    }

    /// Command registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Returns true when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Resolves the command for `invocation`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Unknown`] with the rendered call, or
    /// [`CommandError::UnexpectedBlock`] when a block reaches a command that
    /// does not take one.
    pub fn resolve(&self, invocation: &Invocation<'_>) -> Result<Command, CommandError> {
        let command = self
            .get(invocation.name)
            .ok_or_else(|| CommandError::Unknown(invocation.describe()))?;
        if invocation.block.is_some() && !command.takes_block {
            return Err(CommandError::UnexpectedBlock(invocation.name.to_string()));
        }
        Ok(command.clone())
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Extra, Registry};
    use crate::{CommandError, Engine, EvalResult, Invocation, Operation, Value};

    #[test]
    fn primitives_cover_base_commands_only() {
        let registry = Registry::primitives();
        for name in ["pragma", "u8", "i64", "f32", "f64", "str"] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert!(!registry.contains("strz"));
        assert!(!registry.contains("nul"));
    }

    #[test]
    fn extras_add_their_names() {
        let registry = Registry::with_extras(&[Extra::Tlv]);
        assert!(registry.contains("tlv_u16"));
        assert!(!registry.contains("u128"));

        let standard = Registry::standard();
        for name in ["strz", "strnz", "lstr", "tlv_u32", "u128", "i128", "nul", "us"] {
            assert!(standard.contains(name), "{name} missing");
        }
        assert_eq!(standard.len(), 12 + 3 + 3 + 2 + 32);
    }

    #[test]
    fn unknown_names_describe_the_call() {
        let registry = Registry::standard();
        let args = [Value::int(1u8), Value::int(2u8)];
        let call = Invocation::new("nonexistent_command", &args);
        assert_eq!(
            registry.resolve(&call).unwrap_err(),
            CommandError::Unknown("nonexistent_command 1 2".into())
        );
    }

    #[test]
    fn blocks_are_rejected_on_plain_commands() {
        let registry = Registry::standard();
        let op = Operation::new("u8", vec![Value::int(1u8)]).with_block(Vec::new());
        assert_eq!(
            registry.resolve(&op.invocation()).unwrap_err(),
            CommandError::UnexpectedBlock("u8".into())
        );
    }

    #[test]
    fn register_replaces_existing_handler() {
        fn silent(_: &mut Engine<'_>, _: &Invocation<'_>) -> EvalResult<()> {
            Ok(())
        }

        let mut registry = Registry::primitives();
        assert!(registry.register("u8", silent).is_some());
        assert!(registry.register("brand_new", silent).is_none());
        assert!(registry.names().contains(&"brand_new"));
    }

    #[test]
    fn extra_names_parse() {
        for extra in Extra::ALL {
            assert_eq!(extra.name().parse::<Extra>(), Ok(extra));
        }
        assert!("nope".parse::<Extra>().is_err());
    }
}
