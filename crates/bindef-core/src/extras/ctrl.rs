//! Zero-argument commands for the ASCII control codes.

use crate::{Engine, EvalResult, Invocation, Registry, Value};

/// Control-code mnemonics; the index of each name is its code.
pub const CONTROL_NAMES: [&str; 32] = [
    "nul", "soh", "stx", "etx", "eot", "enq", "ack", "bel", "bs", "ht", "lf", "vt", "ff", "cr",
    "so", "si", "dle", "dc1", "dc2", "dc3", "dc4", "nak", "syn", "etb", "can", "em", "sub", "esc",
    "fs", "gs", "rs", "us",
];

/// Code for a mnemonic.
#[must_use]
pub fn control_code(name: &str) -> Option<u8> {
    CONTROL_NAMES
        .iter()
        .position(|candidate| *candidate == name)
        .and_then(|index| u8::try_from(index).ok())
}

fn control_command(code: u8) -> impl Fn(&mut Engine<'_>, &Invocation<'_>) -> EvalResult<()> {
    move |engine: &mut Engine<'_>, call: &Invocation<'_>| {
        call.expect_arity(0, "0")?;
        engine.invoke("u8", &[Value::int(code)])
    }
}

pub(crate) fn register(registry: &mut Registry) {
    for (code, name) in (0u8..).zip(CONTROL_NAMES) {
        registry.register(name, control_command(code));
    }
}
