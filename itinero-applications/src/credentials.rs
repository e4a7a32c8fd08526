//! Credential collaborator seam
//!
//! Password hashing is delegated to the web layer (argon2 there); the
//! directory service only depends on this trait so the hashing primitive
//! stays swappable and tests stay cheap.

use itinero_core::ItineroResult;

/// Password hashing and verification
pub trait Credentials: Send + Sync {
    /// Hash a plaintext password into an opaque, self-describing string
    fn hash_password(&self, password: &str) -> ItineroResult<String>;

    /// Verify a plaintext password against a stored hash
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}
