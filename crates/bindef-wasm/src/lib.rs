//! WebAssembly bindings for the bindef script driver.

use bindef_core::SessionConfig;
use bindef_script::{emit_source, Source};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Name used in error locations for in-memory scripts.
const INPUT_NAME: &str = "<input>";

/// Bytes and diagnostic lines of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Emission {
    pub output: Vec<u8>,
    pub diagnostics: Vec<String>,
}

impl Emission {
    /// `{ output: Uint8Array, diagnostics: string[] }`
    fn into_js(self) -> Result<JsValue, JsValue> {
        let object = js_sys::Object::new();
        let output = js_sys::Uint8Array::from(self.output.as_slice());
        js_sys::Reflect::set(&object, &"output".into(), &output)?;
        let diagnostics: js_sys::Array = self
            .diagnostics
            .iter()
            .map(|line| JsValue::from_str(line))
            .collect();
        js_sys::Reflect::set(&object, &"diagnostics".into(), &diagnostics)?;
        Ok(object.into())
    }
}

/// Runs a plain script in memory.
///
/// # Errors
///
/// Returns the error formatted as the CLI prints it.
pub fn run(source: &str, config: &SessionConfig) -> Result<Emission, String> {
    let mut output = Vec::new();
    let mut diagnostics = Vec::new();
    emit_source(
        &Source::from_text(INPUT_NAME, source),
        &mut output,
        &mut diagnostics,
        config,
    )
    .map_err(|err| err.format_for_stderr())?;
    let diagnostics = String::from_utf8_lossy(&diagnostics)
        .lines()
        .map(str::to_string)
        .collect();
    Ok(Emission {
        output,
        diagnostics,
    })
}

/// Runs `source` with every extension set loaded.
///
/// # Errors
///
/// Throws the formatted error string if the script fails to parse or run.
#[wasm_bindgen]
pub fn emit(source: &str, verbose: bool, warnings: bool) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let config = SessionConfig {
        verbose,
        warnings,
        ..SessionConfig::default()
    };
    run(source, &config)
        .map_err(|err| JsValue::from_str(&err))?
        .into_js()
}

/// Runs `source` with a session config object such as
/// `{ verbose: true, extras: ["string", "tlv"] }`. Missing fields take their
/// defaults; `undefined` means all defaults.
///
/// # Errors
///
/// Throws if the config does not deserialize or the script fails.
#[wasm_bindgen(js_name = emitWithConfig)]
pub fn emit_with_config(source: &str, config: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let config: SessionConfig = if config.is_undefined() || config.is_null() {
        SessionConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };
    run(source, &config)
        .map_err(|err| JsValue::from_str(&err))?
        .into_js()
}
