//! `u128` and `i128`, emitted as two 64-bit halves.
//!
//! The upper half is `value >> 64` rounded toward negative infinity and the
//! lower half is the low 64 bits of the two's-complement form. `u128` writes
//! both halves with `u64`. `i128` writes the upper half with `i64` and the
//! lower half with `u64`. Big endian emits the upper half first, little endian
//! the lower half first. Every half goes through the 64-bit commands, so their
//! width checks and negative-value warnings apply per half.

use crate::{Endian, Engine, EvalResult, Int, Invocation, Registry, Value};

/// Splits `value` into `(upper, lower)` halves.
#[must_use]
pub const fn split(value: Int) -> (Int, Int) {
    (value.high_half(), value.low_half())
}

fn wide_command(
    upper_command: &'static str,
) -> impl Fn(&mut Engine<'_>, &Invocation<'_>) -> EvalResult<()> {
    move |engine: &mut Engine<'_>, call: &Invocation<'_>| {
        call.expect_arity(1, "1")?;
        let (upper, lower) = split(call.int(0)?);
        let upper = [Value::Int(upper)];
        let lower = [Value::Int(lower)];
        match engine.pragmas().endian {
            Endian::Big => {
                engine.invoke(upper_command, &upper)?;
                engine.invoke("u64", &lower)
            }
            Endian::Little => {
                engine.invoke("u64", &lower)?;
                engine.invoke(upper_command, &upper)
            }
        }
    }
}

pub(crate) fn register(registry: &mut Registry) {
    registry.register("u128", wide_command("u64"));
    registry.register("i128", wide_command("i64"));
}
