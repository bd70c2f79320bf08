use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{error, warn};

/// Argon2id work factor. Fixed for the whole process; stored hashes carry
/// their own parameters so raising these only affects new hashes.
pub const HASH_MEMORY_KIB: u32 = 19_456;
pub const HASH_TIME_COST: u32 = 2;
pub const HASH_PARALLELISM: u32 = 1;

fn hasher() -> anyhow::Result<Argon2<'static>> {
    let params = Params::new(HASH_MEMORY_KIB, HASH_TIME_COST, HASH_PARALLELISM, None)
        .map_err(|e| anyhow::anyhow!("argon2 params: {e}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes with a fresh random salt, returning a PHC string.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

lazy_static! {
    static ref DUMMY_HASH: String = hash_password("unused-dummy-password").unwrap_or_default();
}

/// A hash with the configured cost that no login password is checked
/// against for real. Verifying against it keeps unknown-email logins as
/// slow as wrong-password ones.
pub fn dummy_hash() -> &'static str {
    DUMMY_HASH.as_str()
}

/// An unparseable stored hash counts as a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored password hash is not a valid PHC string");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}
