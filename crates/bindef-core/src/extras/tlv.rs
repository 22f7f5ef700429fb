//! Tag-length-value records with 8, 16 and 32-bit tag and length fields.
//!
//! `tlv_uN(tag, {command: value})` writes the tag with `uN`, runs `command`
//! on `value` into a buffer, writes the buffer length with `uN`, then the
//! buffered bytes. Only the first mapping entry is used.

use crate::{CommandError, Engine, EvalResult, Invocation, Registry, Value};

/// TLV commands and the integer command used for their tag and length.
pub const TLV_COMMANDS: [(&str, &str); 3] =
    [("tlv_u8", "u8"), ("tlv_u16", "u16"), ("tlv_u32", "u32")];

fn tlv_command(
    field: &'static str,
) -> impl Fn(&mut Engine<'_>, &Invocation<'_>) -> EvalResult<()> {
    move |engine: &mut Engine<'_>, call: &Invocation<'_>| {
        call.expect_arity(2, "2")?;
        let tag = call.int(0)?;
        let (command, value) = call.mapping(1)?.first().ok_or_else(|| {
            CommandError::BadArgument {
                command: call.name.to_string(),
                index: 1,
                expected: "command: value",
                got: "empty mapping".to_string(),
            }
        })?;

        engine.invoke(field, &[Value::Int(tag)])?;
        let blob = engine.capture(command, std::slice::from_ref(value))?;
        engine.invoke(field, &[Value::int(blob.len())])?;
        engine.emit(&blob)
    }
}

pub(crate) fn register(registry: &mut Registry) {
    for (name, field) in TLV_COMMANDS {
        registry.register(name, tlv_command(field));
    }
}
