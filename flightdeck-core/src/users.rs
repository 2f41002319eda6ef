use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A registered account. Staff accounts hold admin permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Basic RFC 5322 sanity check: one `@`, non-empty local and domain parts,
/// sane length. Full validation is left to the mail loop.
pub fn valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let mut parts = email.splitn(2, '@');
    match (parts.next(), parts.next()) {
        (Some(local), Some(domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        _ => false,
    }
}

/// Hash a password with a fresh 128-bit random salt.
///
/// Stored form is `base64(salt)$base64(sha256(salt || password))`.
pub fn hash_password(password: &str) -> String {
    use base64::Engine;
    use rand::RngCore;

    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let digest = salted_digest(&salt, password);

    format!(
        "{}${}",
        base64::engine::general_purpose::STANDARD.encode(salt),
        base64::engine::general_purpose::STANDARD.encode(digest),
    )
}

/// Constant-time check of a password against its stored hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    use base64::Engine;

    let Some((salt_b64, digest_b64)) = stored.split_once('$') else {
        return false;
    };

    let Ok(salt) = base64::engine::general_purpose::STANDARD.decode(salt_b64) else {
        return false;
    };
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(digest_b64) else {
        return false;
    };

    let digest = salted_digest(&salt, password);

    constant_time_eq::constant_time_eq(&digest, &expected)
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
