// Publisher password hashes
// Decision: New accounts get Argon2id PHC strings (`$argon2id$...`)
// Decision: Accounts provisioned by the earlier publisher tooling keep their werkzeug
//           hashes (`pbkdf2:<digest>:<iterations>$salt$hex`, `scrypt:<n>:<r>:<p>$salt$hex`)
//
// Stored records are read-only here; both formats must verify as they are.

use anyhow::{anyhow, bail, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

// werkzeug defaults when a method string omits its parameters
const WERKZEUG_PBKDF2_ITERATIONS: u32 = 1_000_000;
const WERKZEUG_SCRYPT_N: u64 = 1 << 15;
const WERKZEUG_SCRYPT_R: u32 = 8;
const WERKZEUG_SCRYPT_P: u32 = 1;

/// Hash a new password as an Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// Verify a password against a stored hash in either supported format.
///
/// Errors only when the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    StoredHash::parse(stored)?.verify(password)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pbkdf2Digest {
    Sha256,
    Sha512,
}

/// A parsed stored hash
#[derive(Debug)]
enum StoredHash<'a> {
    Argon2(PasswordHash<'a>),
    Pbkdf2 {
        digest: Pbkdf2Digest,
        iterations: u32,
        salt: &'a str,
        expected: Vec<u8>,
    },
    Scrypt {
        log_n: u8,
        r: u32,
        p: u32,
        salt: &'a str,
        expected: Vec<u8>,
    },
}

impl<'a> StoredHash<'a> {
    fn parse(stored: &'a str) -> Result<Self> {
        if stored.starts_with('$') {
            let parsed = PasswordHash::new(stored)
                .map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;
            return Ok(StoredHash::Argon2(parsed));
        }

        let mut sections = stored.splitn(3, '$');
        let (method, salt, hex_hash) = match (sections.next(), sections.next(), sections.next()) {
            (Some(method), Some(salt), Some(hex_hash)) => (method, salt, hex_hash),
            _ => bail!("Unrecognised password hash format"),
        };
        let expected = hex::decode(hex_hash).context("Password hash digest is not hex")?;
        if expected.is_empty() {
            bail!("Password hash digest is empty");
        }

        let mut params = method.split(':');
        match params.next() {
            Some("pbkdf2") => {
                let digest = match params.next().unwrap_or("sha256") {
                    "sha256" => Pbkdf2Digest::Sha256,
                    "sha512" => Pbkdf2Digest::Sha512,
                    other => bail!("Unsupported pbkdf2 digest: {}", other),
                };
                let iterations = match params.next() {
                    Some(n) => n.parse().context("Invalid pbkdf2 iteration count")?,
                    None => WERKZEUG_PBKDF2_ITERATIONS,
                };
                Ok(StoredHash::Pbkdf2 {
                    digest,
                    iterations,
                    salt,
                    expected,
                })
            }
            Some("scrypt") => {
                let n: u64 = match params.next() {
                    Some(n) => n.parse().context("Invalid scrypt cost")?,
                    None => WERKZEUG_SCRYPT_N,
                };
                let r = match params.next() {
                    Some(r) => r.parse().context("Invalid scrypt block size")?,
                    None => WERKZEUG_SCRYPT_R,
                };
                let p = match params.next() {
                    Some(p) => p.parse().context("Invalid scrypt parallelism")?,
                    None => WERKZEUG_SCRYPT_P,
                };
                if n < 2 || !n.is_power_of_two() {
                    bail!("scrypt cost must be a power of two, got {}", n);
                }
                Ok(StoredHash::Scrypt {
                    log_n: n.trailing_zeros() as u8,
                    r,
                    p,
                    salt,
                    expected,
                })
            }
            _ => bail!("Unsupported password hash method: {}", method),
        }
    }

    fn verify(&self, password: &str) -> Result<bool> {
        match self {
            StoredHash::Argon2(parsed) => Ok(Argon2::default()
                .verify_password(password.as_bytes(), parsed)
                .is_ok()),
            StoredHash::Pbkdf2 {
                digest,
                iterations,
                salt,
                expected,
            } => {
                let mut derived = vec![0u8; expected.len()];
                match digest {
                    Pbkdf2Digest::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(
                        password.as_bytes(),
                        salt.as_bytes(),
                        *iterations,
                        &mut derived,
                    ),
                    Pbkdf2Digest::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(
                        password.as_bytes(),
                        salt.as_bytes(),
                        *iterations,
                        &mut derived,
                    ),
                }
                Ok(derived.ct_eq(expected).into())
            }
            StoredHash::Scrypt {
                log_n,
                r,
                p,
                salt,
                expected,
            } => {
                let params = scrypt::Params::new(*log_n, *r, *p, expected.len())
                    .map_err(|e| anyhow!("Invalid scrypt parameters: {}", e))?;
                let mut derived = vec![0u8; expected.len()];
                scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut derived)
                    .map_err(|e| anyhow!("scrypt failed: {}", e))?;
                Ok(derived.ct_eq(expected).into())
            }
        }
    }
}
