//! Argon2 implementation of the credential collaborator

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use itinero_applications::Credentials;
use itinero_core::{ItineroError, ItineroResult};

/// Password hashing via Argon2 with per-password salts
#[derive(Debug, Clone, Default)]
pub struct ArgonCredentials;

impl Credentials for ArgonCredentials {
    fn hash_password(&self, password: &str) -> ItineroResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ItineroError::Internal {
                message: format!("password hashing failed: {}", e),
                source: None,
                context: itinero_core::ErrorContext::new("credentials"),
            })
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
