//! Extension command sets built on the primitives.
//!
//! Each set registers its commands through [`crate::Registry::install`] and
//! reaches primitives only through the engine, by name.

pub mod ctrl;
pub mod int128;
pub mod string;
pub mod tlv;
