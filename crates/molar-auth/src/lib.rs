//! Credential hashing and session tokens for the Molar clinic platform.
//!
//! Two small, independent pieces: Argon2id password hashing in PHC string
//! format (the hash is opaque to every other crate), and HS256 session
//! tokens carrying the user id, username, and role. The signing secret is
//! provided by server configuration; this crate never reads the
//! environment itself.

mod password;
mod token;

use thiserror::Error;

pub use password::{hash_password, verify_password};
pub use token::{issue_token, verify_token, Claims};

/// Errors produced by credential and token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Hashing failed or a stored hash could not be parsed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The token's signature or shape is wrong.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token was valid once but its expiry has passed.
    #[error("token expired")]
    TokenExpired,
}
