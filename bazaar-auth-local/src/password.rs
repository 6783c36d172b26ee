// Password hashing and credential checks.

use anyhow::Result;
use bazaar_core::errors::BazaarError;
use bcrypt::{hash, verify};

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    hash(password, cost).map_err(|e| BazaarError::general_error(e.to_string()).into_anyhow())
}

/// `Ok(false)` on a plain mismatch; a malformed hash is an error.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool> {
    verify(password, hashed).map_err(|e| BazaarError::not_authenticated(e.to_string()).into_anyhow())
}

/// Lowercased, trimmed email, or `BadRequest` when it can't be an address.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(BazaarError::bad_request(format!("Invalid email address '{email}'")).into_anyhow());
    }
    Ok(email)
}
