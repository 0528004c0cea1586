//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access-token generation and validation, refresh-token helpers.

pub mod jwt;
pub mod password;
