//! Concurrent soak and latency harness for password hashing backends.
//!
//! Two drivers share the same building blocks:
//!
//! - [`driver::run_soak`] spawns a pool of hash/verify workers for a fixed
//!   wall-clock duration while a background [`sampler::Sampler`] records
//!   process CPU and memory. A [`gate::StartupGate`] keeps workers parked
//!   until the first sample exists, and a [`gate::ShutdownGate`] sized
//!   `workers + 1` guarantees the final [`counter::HashCounter`] read happens
//!   after every participant has stopped.
//! - [`driver::run_stress`] warms the backend up, times a fixed number of
//!   pairs on the calling thread and reports [`stats::TrimmedStats`] over the
//!   fastest 95%.
//!
//! A verification mismatch or backend failure is always fatal.

pub mod backend;
pub mod config;
pub mod control;
pub mod counter;
pub mod driver;
pub mod error;
pub mod gate;
pub mod input;
pub mod probe;
pub mod sampler;
pub mod stats;
pub mod worker;

pub use backend::{BackendKind, HashBackend, HashOutput, HashParams};
pub use config::{SoakConfig, StressConfig};
pub use driver::{run_soak, run_stress, Echo, SoakReport, StressReport};
pub use error::{BackendError, HarnessError, SamplingError};

/// Installs the stderr `tracing` subscriber used by the binaries.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init();
}
