//! Run configurations for both driver modes.

use crate::backend::{BackendKind, HashParams};
use crate::error::HarnessError;
use crate::input::InputLengths;
use std::fmt;
use std::time::Duration;

const RULE: &str = "--------------------------------------------------";

/// Duration-bounded multi-worker run.
#[derive(Debug, Clone)]
pub struct SoakConfig {
    pub backend: BackendKind,
    pub workers: usize,
    pub runtime: Duration,
    /// `Duration::ZERO` disables sampling.
    pub sampling_period: Duration,
    pub lengths: InputLengths,
    pub secret_length: usize,
    pub params: HashParams,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Argon2,
            workers: 4,
            runtime: Duration::from_secs(300),
            sampling_period: Duration::ZERO,
            lengths: InputLengths::default(),
            secret_length: 16,
            params: HashParams::default(),
        }
    }
}

impl SoakConfig {
    #[must_use]
    pub fn sampling_enabled(&self) -> bool {
        !self.sampling_period.is_zero()
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.workers == 0 {
            return Err(HarnessError::Configuration(
                "at least one worker is required".into(),
            ));
        }
        if self.workers > rayon::max_num_threads() {
            return Err(HarnessError::Configuration(format!(
                "{} workers exceeds the thread pool limit of {}",
                self.workers,
                rayon::max_num_threads()
            )));
        }
        validate_shape(self.backend, &self.lengths, &self.params)
    }
}

impl fmt::Display for SoakConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Configuration")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Backend:\t\t{}", self.backend)?;
        writeln!(f, "Runtime:\t\t{} seconds", self.runtime.as_secs())?;
        if self.sampling_enabled() {
            writeln!(
                f,
                "Collect stats:\t\tevery {} seconds",
                self.sampling_period.as_secs()
            )?;
        } else {
            writeln!(f, "Collect stats:\t\tno")?;
        }
        writeln!(f, "Workers:\t\t{}", self.workers)?;
        write_shape(f, &self.lengths, self.secret_length, &self.params)?;
        write!(f, "{RULE}")
    }
}

/// Fixed-iteration single-thread latency run.
#[derive(Debug, Clone)]
pub struct StressConfig {
    pub backend: BackendKind,
    pub iterations: usize,
    pub warm_up_iterations: usize,
    pub lengths: InputLengths,
    pub secret_length: usize,
    pub params: HashParams,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Argon2,
            iterations: 100,
            warm_up_iterations: 5000,
            lengths: InputLengths {
                ad: 0,
                salt: 16,
                password: 32,
            },
            secret_length: 0,
            params: HashParams::default(),
        }
    }
}

impl StressConfig {
    pub fn validate(&self) -> Result<(), HarnessError> {
        validate_shape(self.backend, &self.lengths, &self.params)
    }
}

impl fmt::Display for StressConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Configuration")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Backend:\t\t{}", self.backend)?;
        writeln!(f, "Iterations:\t\t{}", self.iterations)?;
        writeln!(f, "Output type:\t\t{}", self.params.output)?;
        write_shape(f, &self.lengths, self.secret_length, &self.params)?;
        write!(f, "{RULE}")
    }
}

fn validate_shape(
    backend: BackendKind,
    lengths: &InputLengths,
    params: &HashParams,
) -> Result<(), HarnessError> {
    if lengths.salt == 0 {
        return Err(HarnessError::Configuration(
            "salt length must be positive".into(),
        ));
    }
    if params.hash_length == 0 {
        return Err(HarnessError::Configuration(
            "hash length must be positive".into(),
        ));
    }
    backend.check_shape(lengths.salt, lengths.ad, params)
}

fn write_shape(
    f: &mut fmt::Formatter<'_>,
    lengths: &InputLengths,
    secret_length: usize,
    params: &HashParams,
) -> fmt::Result {
    writeln!(f, "Salt length:\t\t{} bytes", lengths.salt)?;
    writeln!(f, "Password length:\t{} bytes", lengths.password)?;
    writeln!(f, "Secret length:\t\t{secret_length} bytes")?;
    writeln!(f, "AD length:\t\t{} bytes", lengths.ad)?;
    writeln!(f, "Hash length:\t\t{} bytes", params.hash_length)?;
    writeln!(f, "Type:\t\t\t{}", params.hash_type.name())?;
    writeln!(f, "Version:\t\t{}", params.version)?;
    writeln!(f, "Memory cost:\t\t{} KB", params.memory_cost_kib)?;
    writeln!(f, "Time cost:\t\t{} passes", params.time_cost)?;
    writeln!(f, "Parallelism:\t\t{} lanes/threads", params.parallelism)
}
