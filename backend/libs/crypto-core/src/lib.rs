//! Shared credential primitives for Lumo services.
//!
//! - `jwt`: HS256 access tokens signed with the server-held secret
//! - `password`: Argon2id password hashing and verification
pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError};
pub use password::PasswordError;
