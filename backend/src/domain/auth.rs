//! Credential material: password hashing and opaque access tokens.
//!
//! Passwords are stored only as argon2id PHC strings. Access tokens are
//! random hex keys handed to the client once; the database keeps a SHA-256
//! digest so a leaked table cannot be replayed against the API.

use std::fmt;

use argon2::password_hash::rand_core::OsRng as SaltRng;
use argon2::password_hash::{PasswordHash as PhcString, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 5;

/// Number of random bytes backing an access token (40 hex characters).
const TOKEN_BYTES: usize = 20;

/// Validation errors for plaintext passwords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordPolicyError {
    TooShort { min: usize },
}

impl fmt::Display for PasswordPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for PasswordPolicyError {}

/// Failure while producing an argon2 hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHashingError(String);

impl fmt::Display for PasswordHashingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl std::error::Error for PasswordHashingError {}

/// Enforce the password policy on a plaintext candidate.
pub fn check_password_policy(password: &str) -> Result<(), PasswordPolicyError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(PasswordPolicyError::TooShort { min: PASSWORD_MIN });
    }
    Ok(())
}

/// An argon2id password hash in PHC string format.
///
/// The plaintext is irrecoverable; `Debug` deliberately omits the hash so it
/// never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(password: &str) -> Result<Self, PasswordHashingError> {
        let salt = SaltString::generate(&mut SaltRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| PasswordHashingError(err.to_string()))?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap an already-hashed PHC string loaded from storage.
    pub fn from_phc_string(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// Check a plaintext candidate against this hash.
    ///
    /// An unparsable stored hash counts as a mismatch rather than an error;
    /// the caller cannot do anything more useful with it than reject.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = PhcString::new(&self.0) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// The PHC-encoded hash for persistence.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// A plaintext access token as handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Generate a fresh token from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// The token key to return to the client.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Digest used to look the token up at rest.
    pub fn digest(&self) -> TokenDigest {
        TokenDigest::of(&self.0)
    }
}

/// SHA-256 digest of an access token; the only token form ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(Vec<u8>);

impl TokenDigest {
    /// Digest an arbitrary presented token key.
    pub fn of(key: &str) -> Self {
        Self(Sha256::digest(key.as_bytes()).to_vec())
    }

    /// Raw digest bytes for storage.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<Vec<u8>> for TokenDigest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn hash_verifies_original_and_rejects_others() {
        let hash = PasswordHash::hash("pw123").expect("hashing succeeds");
        assert!(hash.verify("pw123"));
        assert!(!hash.verify("pw124"));
    }

    #[test]
    fn hashing_is_salted() {
        let first = PasswordHash::hash("pw123").expect("hashing succeeds");
        let second = PasswordHash::hash("pw123").expect("hashing succeeds");
        assert_ne!(first.as_str(), second.as_str());
    }

    #[test]
    fn unparsable_stored_hash_is_a_mismatch() {
        let hash = PasswordHash::from_phc_string("not-a-phc-string");
        assert!(!hash.verify("anything"));
    }

    #[rstest]
    #[case("pw12", false)]
    #[case("pw123", true)]
    #[case("", false)]
    fn password_policy_enforces_minimum_length(#[case] candidate: &str, #[case] ok: bool) {
        assert_eq!(check_password_policy(candidate).is_ok(), ok);
    }

    #[test]
    fn tokens_are_forty_hex_characters_and_unique() {
        let first = AccessToken::generate();
        let second = AccessToken::generate();
        assert_eq!(first.as_str().len(), 40);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn digest_matches_presented_key() {
        let token = AccessToken::generate();
        assert_eq!(token.digest(), TokenDigest::of(token.as_str()));
        assert_ne!(token.digest(), TokenDigest::of("another-key"));
    }
}
