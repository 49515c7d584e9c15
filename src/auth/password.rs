// src/auth/password.rs

use bcrypt::{BcryptError, hash, verify};

use crate::error::{PdmsError, PdmsResult};

/// Cost comes from configuration; tests use the minimum of 4
pub fn hash_password(password: &str, cost: u32) -> PdmsResult<String> {
    hash(password, cost)
        .map_err(|e: BcryptError| PdmsError::internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> PdmsResult<bool> {
    verify(password, hash)
        .map_err(|e: BcryptError| PdmsError::internal(format!("Failed to verify password: {}", e)))
}
