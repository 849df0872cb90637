//! Argon2id implementation of the password hasher port.

use argon2::Argon2;
use argon2::password_hash::{
    self, PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use rand::RngCore;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

const SALT_BYTES: usize = 16;

/// Argon2id hasher with the crate's default parameters.
#[derive(Debug, Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_salt() -> Result<SaltString, PasswordHashError> {
        let mut bytes = [0_u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        SaltString::encode_b64(&bytes).map_err(|err| PasswordHashError::hashing(err.to_string()))
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        let salt = Self::fresh_salt()?;
        let encoded = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| PasswordHashError::hashing(err.to_string()))?;
        Ok(PasswordHash::new(encoded.to_string()))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
        let parsed = PhcString::new(hash.as_str())
            .map_err(|err| PasswordHashError::malformed_hash(err.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(other) => Err(PasswordHashError::malformed_hash(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new()
    }

    #[rstest]
    fn hashes_verify_only_the_original_password(hasher: Argon2PasswordHasher) {
        let hash = hasher.hash("correct horse").expect("hashing succeeds");

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash).expect("verify runs"));
        assert!(!hasher.verify("battery staple", &hash).expect("verify runs"));
    }

    #[rstest]
    fn salts_differ_between_hashes(hasher: Argon2PasswordHasher) {
        let first = hasher.hash("same password").expect("hashing succeeds");
        let second = hasher.hash("same password").expect("hashing succeeds");
        assert_ne!(first.as_str(), second.as_str());
    }

    #[rstest]
    fn malformed_hashes_are_reported(hasher: Argon2PasswordHasher) {
        let result = hasher.verify("anything", &PasswordHash::new("plaintext"));
        assert!(matches!(
            result,
            Err(PasswordHashError::MalformedHash { .. })
        ));
    }

    #[rstest]
    #[case("secret")]
    #[case("")]
    fn unknown_user_hash_parses_and_rejects(
        hasher: Argon2PasswordHasher,
        #[case] password: &str,
    ) {
        let decoy = PasswordHash::new(crate::domain::accounts_service::UNKNOWN_USER_HASH);
        assert!(!hasher.verify(password, &decoy).expect("decoy hash parses"));
    }
}
