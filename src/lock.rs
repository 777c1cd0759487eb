//! Script access control: salted password derivation for locked scripts.
//!
//! Stored format is `base64(salt):base64(derivedKey)`. A script is locked
//! iff a stored value is present; verification has no side effects, no
//! attempt counter, no lockout.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const ITERATIONS: u32 = 10_000;

/// Derive a stored password value from a plaintext password.
pub fn set_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let key = derive_key(password, &salt);
    format!("{}:{}", BASE64.encode(salt), BASE64.encode(key))
}

/// Check an entered password against a stored value. Malformed stored values
/// (wrong part count, bad base64) verify as false rather than raising.
pub fn verify(entered: &str, stored: &str) -> bool {
    let mut parts = stored.split(':');
    let (Some(salt_b64), Some(key_b64), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let Ok(salt) = BASE64.decode(salt_b64) else {
        return false;
    };
    let Ok(stored_key) = BASE64.decode(key_b64) else {
        return false;
    };
    keys_match(&derive_key(entered, &salt), &stored_key)
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ITERATIONS, &mut key);
    key
}

// TODO: swap for a constant-time comparison (subtle::ConstantTimeEq).
fn keys_match(derived: &[u8], stored: &[u8]) -> bool {
    derived == stored
}
