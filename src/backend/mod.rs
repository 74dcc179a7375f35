//! Pluggable hashing capability under test.
//!
//! The harness only ever calls [`HashBackend::hash`] followed by
//! [`HashBackend::verify`] with the same inputs, and treats any error or a
//! `false` verification as fatal.

mod argon;
mod digest;

pub use self::argon::Argon2Backend;
pub use self::digest::{DigestBackend, NullBackend};

use crate::error::{BackendError, HarnessError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashType {
    I,
    D,
    #[default]
    Id,
}

impl HashType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::I => "Argon2i",
            Self::D => "Argon2d",
            Self::Id => "Argon2id",
        }
    }
}

impl FromStr for HashType {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i" => Ok(Self::I),
            "d" => Ok(Self::D),
            "id" => Ok(Self::Id),
            other => Err(HarnessError::Configuration(format!(
                "wrong type {other}, expected i|d|id"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashVersion {
    V10,
    #[default]
    V13,
}

impl fmt::Display for HashVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V10 => f.write_str("v10"),
            Self::V13 => f.write_str("v13"),
        }
    }
}

impl FromStr for HashVersion {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "10" => Ok(Self::V10),
            "13" => Ok(Self::V13),
            other => Err(HarnessError::Configuration(format!(
                "wrong version {other}, expected 10|13"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    #[default]
    Encoded,
    Raw,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoded => f.write_str("encoded"),
            Self::Raw => f.write_str("raw"),
        }
    }
}

impl FromStr for OutputKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encoded" => Ok(Self::Encoded),
            "raw" => Ok(Self::Raw),
            other => Err(HarnessError::Configuration(format!(
                "wrong output type {other}, expected raw|encoded"
            ))),
        }
    }
}

/// Cost and shape parameters shared by hash and verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashParams {
    pub hash_type: HashType,
    pub version: HashVersion,
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub hash_length: usize,
    pub secret: Option<Vec<u8>>,
    pub output: OutputKind,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            hash_type: HashType::Id,
            version: HashVersion::V13,
            memory_cost_kib: 4 * 1024,
            time_cost: 2,
            parallelism: 2,
            hash_length: 16,
            secret: None,
            output: OutputKind::Encoded,
        }
    }
}

impl HashParams {
    /// Minimal-cost variant used to warm the backend up.
    #[must_use]
    pub fn warm_up(&self) -> Self {
        Self {
            memory_cost_kib: 8,
            time_cost: 1,
            parallelism: 1,
            secret: None,
            ..self.clone()
        }
    }
}

/// Output of [`HashBackend::hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashOutput {
    /// Self-describing text bundling parameters, salt and digest.
    Encoded(String),
    /// Bare digest; the salt travels alongside so it can be verified.
    Raw { hash: Vec<u8>, salt: Vec<u8> },
}

pub trait HashBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn hash(
        &self,
        ad: Option<&[u8]>,
        salt: &[u8],
        password: &[u8],
        params: &HashParams,
    ) -> Result<HashOutput, BackendError>;

    fn verify(
        &self,
        hash: &HashOutput,
        ad: Option<&[u8]>,
        password: &[u8],
        params: &HashParams,
    ) -> Result<bool, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Argon2,
    Sha256,
    Null,
}

impl BackendKind {
    #[must_use]
    pub fn build(self) -> Arc<dyn HashBackend> {
        match self {
            Self::Argon2 => Arc::new(Argon2Backend),
            Self::Sha256 => Arc::new(DigestBackend),
            Self::Null => Arc::new(NullBackend),
        }
    }

    /// Checks lengths and costs against what this backend can honour, so a
    /// bad combination fails before any worker starts.
    pub fn check_shape(
        self,
        salt_len: usize,
        ad_len: usize,
        params: &HashParams,
    ) -> Result<(), HarnessError> {
        match self {
            Self::Argon2 => argon::check_shape(salt_len, ad_len, params),
            Self::Sha256 => digest::check_shape(params),
            Self::Null => Ok(()),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argon2 => f.write_str("argon2"),
            Self::Sha256 => f.write_str("sha256"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argon2" => Ok(Self::Argon2),
            "sha256" => Ok(Self::Sha256),
            "null" => Ok(Self::Null),
            other => Err(HarnessError::Configuration(format!(
                "unknown backend {other}, expected argon2|sha256|null"
            ))),
        }
    }
}
