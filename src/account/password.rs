/// Admin password hashing
///
/// Stored format is `scrypt:<base64 salt>:<base64 derived key>` with the
/// scrypt defaults N=2^14, r=8, p=1. Values without the `scrypt:` prefix
/// are legacy plaintext rows and compare by equality.
use crate::error::{PortalError, PortalResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;

const PREFIX: &str = "scrypt";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 64;
const LOG_N: u8 = 14;
const R: u32 = 8;
const P: u32 = 1;

pub struct PasswordHasher;

impl PasswordHasher {
    /// Hash a password with a fresh random salt
    pub fn hash(password: &str) -> PortalResult<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let mut derived = [0u8; KEY_LEN];
        derive(password, &salt, &mut derived)?;

        Ok(format!(
            "{}:{}:{}",
            PREFIX,
            STANDARD.encode(salt),
            STANDARD.encode(derived)
        ))
    }

    /// Verify a password against a stored value
    pub fn verify(password: &str, stored: &str) -> bool {
        if password.is_empty() {
            return false;
        }

        let Some(rest) = stored.strip_prefix("scrypt:") else {
            return constant_time_eq::constant_time_eq(password.as_bytes(), stored.as_bytes());
        };

        let mut parts = rest.split(':');
        let (Some(salt), Some(expected), None) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };

        let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(expected)) else {
            return false;
        };

        if expected.is_empty() {
            return false;
        }

        let mut actual = vec![0u8; expected.len()];
        if derive(password, &salt, &mut actual).is_err() {
            return false;
        }

        constant_time_eq::constant_time_eq(&expected, &actual)
    }
}

fn derive(password: &str, salt: &[u8], output: &mut [u8]) -> PortalResult<()> {
    let params = scrypt::Params::new(LOG_N, R, P, output.len())
        .map_err(|e| PortalError::Internal(format!("Invalid scrypt parameters: {}", e)))?;

    scrypt::scrypt(password.as_bytes(), salt, &params, output)
        .map_err(|e| PortalError::Internal(format!("Password hashing failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordHasher::hash("correct horse").unwrap();
        assert!(hash.starts_with("scrypt:"));
        assert_eq!(hash.split(':').count(), 3);

        assert!(PasswordHasher::verify("correct horse", &hash));
        assert!(!PasswordHasher::verify("wrong horse", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = PasswordHasher::hash("same").unwrap();
        let b = PasswordHasher::hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_legacy_plaintext() {
        assert!(PasswordHasher::verify("letmein", "letmein"));
        assert!(!PasswordHasher::verify("letmein", "LetMeIn"));
    }

    #[test]
    fn test_empty_password_never_verifies() {
        assert!(!PasswordHasher::verify("", ""));
        let hash = PasswordHasher::hash("").unwrap();
        assert!(!PasswordHasher::verify("", &hash));
    }

    #[test]
    fn test_malformed_hashes() {
        assert!(!PasswordHasher::verify("pw", "scrypt:"));
        assert!(!PasswordHasher::verify("pw", "scrypt:onlysalt"));
        assert!(!PasswordHasher::verify("pw", "scrypt:a:b:c"));
        assert!(!PasswordHasher::verify("pw", "scrypt:!!!:???"));
        assert!(!PasswordHasher::verify("pw", "scrypt:AAAA:"));
    }
}
