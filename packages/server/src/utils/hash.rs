use argon2::password_hash::{Error, SaltString};
use argon2::{Argon2, PasswordHasher};
use rand::Rng;

/// Hash a password into an Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let mut salt = [0u8; 16];
    rand::rng().fill(&mut salt);
    let salt = SaltString::encode_b64(&salt)?;
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Check `password` against a stored hash. The unusable marker never matches.
#[cfg(test)]
pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
    use crate::store::UNUSABLE_PASSWORD;
    use argon2::{PasswordHash, PasswordVerifier};

    if hash == UNUSABLE_PASSWORD {
        return Ok(false);
    }
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
