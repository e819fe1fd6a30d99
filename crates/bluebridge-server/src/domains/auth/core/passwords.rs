use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

/// Outcome of checking a password against the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordMatch {
    Mismatch,
    /// Matched an argon2 PHC hash.
    Hashed,
    /// Matched a plaintext value carried over from before hashing. The caller
    /// should store a hash in its place.
    Legacy,
}

impl PasswordMatch {
    #[must_use]
    pub fn is_match(self) -> bool {
        !matches!(self, Self::Mismatch)
    }
}

/// Hashes a password into a PHC string (`$argon2id$...`).
pub fn hash_password(password: &str) -> Result<String, &'static str> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| "password_hash_failed")
}

/// Returns `Ok(false)` on mismatch and `Err` only when the stored hash is unreadable.
pub fn verify_password(stored: &str, password: &str) -> Result<bool, &'static str> {
    let parsed = PasswordHash::new(stored).map_err(|_| "password_hash_invalid")?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// PHC strings are verified with argon2. Anything else is a legacy plaintext
/// value and is compared in constant time.
#[must_use]
pub fn check_stored_password(stored: &str, password: &str) -> PasswordMatch {
    if stored.starts_with('$') {
        if let Ok(true) = verify_password(stored, password) {
            return PasswordMatch::Hashed;
        }
        if PasswordHash::new(stored).is_ok() {
            return PasswordMatch::Mismatch;
        }
    }
    if !stored.is_empty() && bool::from(stored.as_bytes().ct_eq(password.as_bytes())) {
        PasswordMatch::Legacy
    } else {
        PasswordMatch::Mismatch
    }
}
