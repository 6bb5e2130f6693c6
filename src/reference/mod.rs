//! Image reference parsing and canonical rendering
//!
//! A reference such as `ghcr.io/siderolabs/gvisor:20231214.0@sha256:548b...`
//! is split into `registry`, `org`, `repo`, `tag` and `shasum`, then rendered
//! back with any combination of the registry, tag and digest trimmed.
//!
//! # Modules
//!
//! - [`error`]: Parse failures
//! - [`parser`]: Regex-driven `ReferenceParser`
//! - [`types`]: `ImageReference` and `TrimOptions`

pub mod error;
pub mod parser;
pub mod types;

pub use error::ParseError;
pub use parser::ReferenceParser;
pub use types::{ImageReference, TrimOptions};
