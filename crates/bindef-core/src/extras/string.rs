//! Terminated, padded and length-prefixed strings over `str`.

use crate::{CommandError, Engine, EvalResult, Int, Invocation, Registry, Value};

/// Largest run of NUL padding encoded at once.
const PAD_CHUNK: usize = 4096;

/// `strz(text)`: the text, then one NUL character in the active encoding.
fn strz_command(engine: &mut Engine<'_>, call: &Invocation<'_>) -> EvalResult<()> {
    call.expect_arity(1, "1")?;
    let text = call.text(0)?;
    engine.invoke("str", &[Value::str(text)])?;
    engine.invoke("str", &[Value::str("\0")])
}

/// `strnz(text, maxpad)`: the text, NUL-padded to `maxpad` bytes.
///
/// The text is written before the size check, so an oversized text is still
/// emitted when the command fails. Padding is single NUL bytes regardless of
/// the active encoding.
fn strnz_command(engine: &mut Engine<'_>, call: &Invocation<'_>) -> EvalResult<()> {
    call.expect_arity(2, "2")?;
    let text = call.text(0)?;
    let maxpad = call.int(1)?;

    let blob = engine.capture("str", &[Value::str(text)])?;
    engine.emit(&blob)?;

    let pad = padding(maxpad, blob.len())?;
    let utf8 = [(String::from("encoding"), Value::str("utf-8"))];
    engine.scoped(&utf8, |engine| {
        let mut remaining = pad;
        while remaining > 0 {
            let chunk = remaining.min(PAD_CHUNK);
            engine.invoke("str", &[Value::Str("\0".repeat(chunk))])?;
            remaining -= chunk;
        }
        Ok(())
    })
}

/// Bytes of padding needed to grow `len` bytes to `maxpad`.
///
/// # Errors
///
/// Returns [`CommandError::PaddingOverflow`] when `maxpad < len`.
pub fn padding(maxpad: Int, len: usize) -> Result<usize, CommandError> {
    let overflow = CommandError::PaddingOverflow { maxpad, len };
    if maxpad.is_negative() {
        return Err(overflow);
    }
    let maxpad = usize::try_from(maxpad.magnitude()).map_err(|_| CommandError::WidthExceeded {
        value: maxpad,
        width: usize::BITS,
    })?;
    maxpad.checked_sub(len).ok_or(overflow)
}

/// `lstr(command, text)`: the encoded byte length via `command`, then the text.
fn lstr_command(engine: &mut Engine<'_>, call: &Invocation<'_>) -> EvalResult<()> {
    call.expect_arity(2, "2")?;
    let prefix = call.command_name(0)?;
    let text = call.text(1)?;

    let blob = engine.capture("str", &[Value::str(text)])?;
    engine.invoke(prefix, &[Value::int(blob.len())])?;
    engine.emit(&blob)
}

pub(crate) fn register(registry: &mut Registry) {
    registry.register("strz", strz_command);
    registry.register("strnz", strnz_command);
    registry.register("lstr", lstr_command);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::padding;
    use crate::{CommandError, Int};

    #[rstest]
    #[case(5, 3, 2)]
    #[case(3, 3, 0)]
    #[case(0, 0, 0)]
    fn padding_fills_to_maxpad(#[case] maxpad: u32, #[case] len: usize, #[case] pad: usize) {
        assert_eq!(padding(Int::from(maxpad), len), Ok(pad));
    }

    #[rstest]
    #[case(Int::from(2u8), 3)]
    #[case(Int::from(-1i8), 0)]
    fn padding_rejects_short_maxpad(#[case] maxpad: Int, #[case] len: usize) {
        assert_eq!(
            padding(maxpad, len),
            Err(CommandError::PaddingOverflow { maxpad, len })
        );
    }
}
