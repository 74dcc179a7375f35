//! Error types for the harness.
//!
//! | Type | Fatal | Raised by |
//! |------|-------|-----------|
//! | `HarnessError::Configuration` | yes, before any worker starts | config parsing / validation |
//! | `HarnessError::Backend` | yes | hash or verify call failed |
//! | `HarnessError::VerificationMismatch` | yes | verify returned `false` |
//! | `HarnessError::InvalidInput` | yes in the default drivers | percentile calculator |
//! | `SamplingError` | never | process probe; logged and the row is dropped |

use thiserror::Error;

/// Failure signalled by a hashing backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("argon2 rejected the request")]
    Argon2(#[from] argon2::Error),

    #[error("password hash encoding failed")]
    PasswordHash(#[from] argon2::password_hash::Error),

    /// The hash handed to `verify` could not be decoded.
    #[error("malformed hash: {0}")]
    Malformed(String),

    /// The backend cannot honour the requested configuration.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),
}

/// Failure while reading external process metrics. Never fatal.
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("failed to spawn probe")]
    Spawn(#[from] std::io::Error),

    #[error("probe exited with {0}")]
    Status(std::process::ExitStatus),

    #[error("unparseable probe output: {0:?}")]
    Parse(String),

    #[error("probe task failed: {0}")]
    Task(String),
}

/// Fatal harness error. Unwinds to the binary's top level.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("backend failure in {context}")]
    Backend {
        context: &'static str,
        #[source]
        source: BackendError,
    },

    /// `verify` rejected a hash it was just handed for the same inputs.
    #[error("verification mismatch on {origin} after {completed} completed pairs")]
    VerificationMismatch { origin: String, completed: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to build thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn backend(context: &'static str, source: BackendError) -> Self {
        Self::Backend { context, source }
    }

    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::Backend { .. }
            | Self::VerificationMismatch { .. }
            | Self::InvalidInput(_)
            | Self::ThreadPool(_)
            | Self::Io(_) => 1,
        }
    }
}
