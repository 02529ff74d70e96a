//! Password hashing and verification using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password")]
    Hash,

    #[error("Invalid password hash format")]
    BadHash,

    #[error("Invalid credentials")]
    Mismatch,
}

/// Hash a password for storage on the user record
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::Hash)?
        .to_string())
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::BadHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("hunter2-but-longer").unwrap();
        assert!(verify_password("hunter2-but-longer", &hash).is_ok());
    }

    #[test]
    fn wrong_password_rejected() {
        let hash = hash_password("correct horse").unwrap();
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn malformed_hash_rejected() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(PasswordError::BadHash)
        ));
    }
}
