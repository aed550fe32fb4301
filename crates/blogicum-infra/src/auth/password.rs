//! Account password storage.
//!
//! Passwords are stored as Argon2id PHC strings. An empty stored hash, or one
//! starting with `!`, marks an account without a usable password: it can hold
//! posts and comments but never logs in.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, Version};

use blogicum_core::ports::{AuthError, PasswordService};

/// Prefix of a stored hash that can never match.
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

/// Hashes and checks the passwords of blog accounts.
pub struct AccountPasswordHasher {
    argon2: Argon2<'static>,
}

impl AccountPasswordHasher {
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    fn is_usable(stored: &str) -> bool {
        !stored.is_empty() && !stored.starts_with(UNUSABLE_PASSWORD_PREFIX)
    }
}

impl Default for AccountPasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for AccountPasswordHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        // Registration rejects short passwords before this point.
        if password.is_empty() {
            return Err(AuthError::HashingError("empty password".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        if !Self::is_usable(stored) {
            tracing::debug!("Account has no usable password");
            return Ok(false);
        }

        let parsed = PasswordHash::new(stored).map_err(|e| AuthError::HashingError(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> AccountPasswordHasher {
        AccountPasswordHasher::with_params(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn test_registered_password_logs_in() {
        let hasher = hasher();

        let stored = hasher.hash("correct-horse").unwrap();

        assert!(stored.starts_with("$argon2id$"));
        assert!(hasher.verify("correct-horse", &stored).unwrap());
        assert!(!hasher.verify("wrong-horse", &stored).unwrap());
    }

    #[test]
    fn test_same_password_is_salted() {
        let hasher = hasher();

        assert_ne!(hasher.hash("correct-horse").unwrap(), hasher.hash("correct-horse").unwrap());
    }

    #[test]
    fn test_empty_password_is_not_stored() {
        assert!(matches!(hasher().hash(""), Err(AuthError::HashingError(_))));
    }

    #[test]
    fn test_unusable_password_never_matches() {
        let hasher = hasher();

        assert!(!hasher.verify("", "").unwrap());
        assert!(!hasher.verify("anything", "!locked").unwrap());
    }

    #[test]
    fn test_corrupt_stored_hash_is_an_error() {
        let result = hasher().verify("anything", "not-a-phc-string");

        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }
}
