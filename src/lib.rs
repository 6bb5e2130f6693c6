//! Release tag tracking for cluster-OS extension images
//!
//! - [`tags`]: fetches upstream release tags and diffs them against a local cache
//! - [`reference`]: parses image references and renders trimmed canonical forms
//! - [`config`]: defaults and the JSON config file

pub mod config;
pub mod reference;
pub mod tags;
