//! Registry implementations for listing repository tags

pub mod oci;

pub use oci::OciRegistry;
