//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Encoded form: `pbkdf2_sha256$<iterations>$<salt>$<base64 digest>`. The
//! iteration count travels with each hash.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const ALGORITHM: &str = "pbkdf2_sha256";
pub const DEFAULT_ITERATIONS: u32 = 600_000;
const SALT_LEN: usize = 22;

/// Random string over `[A-Za-z0-9]`.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Random string over `[a-z0-9]`.
pub fn random_lowercase_token(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut out = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}

pub fn hash_password(password: &str, iterations: u32) -> String {
    hash_password_with_salt(password, &random_token(SALT_LEN), iterations)
}

pub fn hash_password_with_salt(password: &str, salt: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let digest = pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), iterations);
    format!("{ALGORITHM}${iterations}${salt}${}", STANDARD.encode(digest))
}

/// Check `password` against an encoded hash. Malformed hashes never match.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Ok(expected) = STANDARD.decode(expected) else {
        return false;
    };
    let actual = pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), iterations.max(1));

    expected.len() == actual.len() && bool::from(actual.as_slice().ct_eq(expected.as_slice()))
}

/// A well-formed hash no password derives to in practice. Verifying against
/// it costs the same as verifying a real hash with `iterations` rounds.
pub fn decoy_hash(iterations: u32) -> String {
    format!(
        "{ALGORITHM}${}${}${}",
        iterations.max(1),
        random_token(SALT_LEN),
        STANDARD.encode([0u8; 32])
    )
}
