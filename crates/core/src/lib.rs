//! Domain primitives shared by the storage and HTTP layers.
//!
//! - [`states`] -- closed lifecycle enums for every entity.
//! - [`error`] -- the domain-level error type.
//! - [`types`] -- identity and timestamp aliases.

pub mod error;
pub mod states;
pub mod types;
