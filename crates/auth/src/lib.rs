//! `taskboard-auth`: credential primitives (session tokens, password hashes,
//! reset tokens) and the `User` document.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod reset;
pub mod user;

pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtValidator, TokenIssueError, TokenIssuer, DEFAULT_SESSION_TTL_SECS};
pub use password::{PasswordError, PasswordHasher};
pub use reset::{RESET_TOKEN_BYTES, ResetToken, ResetTokenError, check_reset_token, reset_token_ttl};
pub use user::{
    MIN_PASSWORD_LEN, User, UserView, normalize_email, validate_email, validate_name, validate_password,
};
