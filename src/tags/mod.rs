//! Release tag tracking against the upstream registry
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│  Resolver   │────▶│   TagSet    │
//! │ (list tags) │     │ (diff/sort) │     │   (delta)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            ▲                   │ merge
//!                            │                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   TagSet    │◀────│    Cache    │
//!                     │  (cached)   │     │   (JSON)    │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: JSON file store for the known tag set
//! - [`error`]: Error types for cache and registry operations
//! - [`registry`]: `TagLister` trait and repository names
//! - [`registries`]: OCI distribution API implementation
//! - [`resolver`]: Computes the releases missing from the cache
//! - [`semver`]: Release tag ordering
//! - [`types`]: `ReleaseVersion` and `TagSet`

pub mod cache;
pub mod error;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod semver;
pub mod types;
