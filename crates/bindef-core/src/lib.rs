//! Binary emission engine.
//!
//! An [`Engine`] evaluates named operations in order and appends the encoded
//! bytes to a primary sink. Encoding follows a small set of pragmas
//! (`verbose`, `warnings`, `endian`, `encoding`) that can be changed for the
//! rest of the session or for a nested block only. Diagnostics go to a
//! separate line-oriented sink.
//!
//! ```
//! use bindef_core::{Engine, Operation, SessionConfig, Value};
//!
//! let mut out = Vec::new();
//! {
//!     let mut engine = Engine::new(&mut out, std::io::sink(), &SessionConfig::default());
//!     engine
//!         .evaluate(&Operation::new("lstr", vec![Value::symbol("u8"), Value::str("foo")]))
//!         .unwrap();
//! }
//! assert_eq!(out, b"\x03foo");
//! ```

/// Wide integer argument type.
pub mod int;
pub use int::Int;

/// Error taxonomy.
pub mod error;
pub use error::{CommandError, EvalResult, EvaluationError, PragmaError};

/// Operations, argument values and handler-side argument access.
pub mod operation;
pub use operation::{Invocation, Operation, Value};

/// Output charsets.
pub mod charset;
pub use charset::{Charset, CHARSET_NAMES};

/// Pragma schema, store and scoping.
pub mod pragma;
pub use pragma::{validate_all, Endian, Pragma, PragmaKey, PragmaSet};

/// `V:`/`W:` diagnostics channel.
pub mod diag;
pub use diag::{Diagnostic, Diagnostics, Severity};

/// Session construction parameters.
pub mod config;
pub use config::SessionConfig;

/// Integer, float and string encoders.
pub mod primitive;
pub use primitive::{
    encode_f32, encode_f64, encode_str, Blob, ByteOrder, IntegerFormat, INTEGER_FORMATS,
};

/// Command registry and extension sets.
pub mod registry;
pub use registry::{Command, Extra, Handler, Registry};

/// Evaluation session.
pub mod engine;
pub use engine::Engine;

/// Extension command sets: control codes, 128-bit integers, strings and TLV records.
pub mod extras;

#[cfg(test)]
use proptest as _;
