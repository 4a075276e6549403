//! Password hashing and session tokens

use anyhow::{bail, Result};
use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

pub const SESSION_TOKEN_LENGTH: usize = 64;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct SessionTokenValue(pub String);

impl SessionTokenValue {
    pub fn generate() -> SessionTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(SESSION_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        SessionTokenValue(random_string)
    }
}

#[derive(Clone, Debug)]
pub struct SessionToken {
    pub account_id: usize,
    pub value: SessionTokenValue,
    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
}

mod soundwave_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash(plain: &[u8], b64_salt: &str) -> Result<String> {
        let salt = SaltString::from_b64(b64_salt).map_err(|err| anyhow!("{}", err))?;
        let hash = Argon2::default()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?;
        Ok(hash.to_string())
    }

    pub fn verify(plain: &[u8], target_hash: &str) -> Result<bool> {
        let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain, &password_hash)
            .is_ok())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordHasherKind {
    Argon2,
    /// Plain salted comparison, only available to speed up test suites.
    #[cfg(feature = "test-fast-hasher")]
    Fast,
}

impl PasswordHasherKind {
    #[cfg(feature = "test-fast-hasher")]
    pub fn default_for_build() -> Self {
        PasswordHasherKind::Fast
    }

    #[cfg(not(feature = "test-fast-hasher"))]
    pub fn default_for_build() -> Self {
        PasswordHasherKind::Argon2
    }

    pub fn generate_b64_salt(&self) -> String {
        match self {
            PasswordHasherKind::Argon2 => soundwave_argon2::generate_b64_salt(),
            #[cfg(feature = "test-fast-hasher")]
            PasswordHasherKind::Fast => soundwave_argon2::generate_b64_salt(),
        }
    }

    pub fn hash(&self, plain: &str, b64_salt: &str) -> Result<String> {
        match self {
            PasswordHasherKind::Argon2 => soundwave_argon2::hash(plain.as_bytes(), b64_salt),
            #[cfg(feature = "test-fast-hasher")]
            PasswordHasherKind::Fast => Ok(format!("{}${}", b64_salt, plain)),
        }
    }

    pub fn verify(&self, plain: &str, target_hash: &str, _salt: &str) -> Result<bool> {
        match self {
            PasswordHasherKind::Argon2 => soundwave_argon2::verify(plain.as_bytes(), target_hash),
            #[cfg(feature = "test-fast-hasher")]
            PasswordHasherKind::Fast => Ok(format!("{}${}", _salt, plain) == target_hash),
        }
    }
}

impl FromStr for PasswordHasherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(PasswordHasherKind::Argon2),
            #[cfg(feature = "test-fast-hasher")]
            "fast" => Ok(PasswordHasherKind::Fast),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl fmt::Display for PasswordHasherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordHasherKind::Argon2 => write!(f, "argon2"),
            #[cfg(feature = "test-fast-hasher")]
            PasswordHasherKind::Fast => write!(f, "fast"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PasswordCredentials {
    pub salt: String,
    pub hash: String,
    pub hasher: PasswordHasherKind,
}

impl PasswordCredentials {
    pub fn from_plain(password: &str) -> Result<Self> {
        let hasher = PasswordHasherKind::default_for_build();
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password, &salt)?;
        Ok(PasswordCredentials { salt, hash, hasher })
    }

    pub fn verify(&self, password: &str) -> Result<bool> {
        self.hasher.verify(password, &self.hash, &self.salt)
    }
}
