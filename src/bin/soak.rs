// Multi-threaded hash/verify soak test
// Random ad, salt and password on every iteration; optional CPU/RSS sampling
// through `ps` to spot leaks over long runs.

use anyhow::Result;
use clap::Parser;
use hash_soak::backend::{BackendKind, HashParams, HashType, HashVersion};
use hash_soak::input::InputLengths;
use hash_soak::probe::PsProbe;
use hash_soak::{run_soak, Echo, SoakConfig};
use std::sync::Arc;
use std::time::Duration;

/// Runs a multi-threaded hash / verify loop with random ad, salt and password
/// on every iteration.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Hashing backend (argon2|sha256|null)
    #[arg(short, long, default_value = "argon2")]
    backend: BackendKind,

    /// Run for N seconds
    #[arg(long = "runtime", visible_alias = "rt", default_value_t = 300)]
    runtime: u64,

    /// Sample statistics every N seconds (0 = no stats, Unix only)
    #[arg(long = "collect-stats", visible_alias = "cs", default_value_t = 0)]
    collect_stats: u64,

    /// Number of hash/verify worker threads
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Number of salt bytes
    #[arg(long = "salt-length", visible_alias = "sl", default_value_t = 16)]
    salt_length: usize,

    /// Number of password bytes
    #[arg(long = "password-length", visible_alias = "pl", default_value_t = 32)]
    password_length: usize,

    /// Number of secret bytes
    #[arg(long = "secret-length", visible_alias = "kl", default_value_t = 16)]
    secret_length: usize,

    /// Number of ad bytes
    #[arg(long = "ad-length", visible_alias = "al", default_value_t = 32)]
    ad_length: usize,

    /// Number of output hash bytes
    #[arg(long = "hash-length", visible_alias = "hl", default_value_t = 16)]
    hash_length: usize,

    /// Argon2 type (i|d|id)
    #[arg(short = 't', long = "type", default_value = "id")]
    hash_type: HashType,

    /// Argon2 version (10|13)
    #[arg(short = 'v', long = "hash-version", default_value = "13")]
    hash_version: HashVersion,

    /// Number of KB of memory used for hash calculation
    #[arg(long = "memory-cost", visible_alias = "mc", default_value_t = 4096)]
    memory_cost: u32,

    /// Number of passes through memory during hash calculation
    #[arg(long = "time-cost", visible_alias = "tc", default_value_t = 2)]
    time_cost: u32,

    /// Number of lanes used for hash calculation
    #[arg(short, long, default_value_t = 2)]
    parallelism: u32,
}

impl Args {
    fn into_config(self) -> SoakConfig {
        SoakConfig {
            backend: self.backend,
            workers: self.workers,
            runtime: Duration::from_secs(self.runtime),
            sampling_period: Duration::from_secs(self.collect_stats),
            lengths: InputLengths {
                ad: self.ad_length,
                salt: self.salt_length,
                password: self.password_length,
            },
            secret_length: self.secret_length,
            params: HashParams {
                hash_type: self.hash_type,
                version: self.hash_version,
                memory_cost_kib: self.memory_cost,
                time_cost: self.time_cost,
                parallelism: self.parallelism,
                hash_length: self.hash_length,
                ..HashParams::default()
            },
        }
    }
}

fn main() {
    hash_soak::init_tracing();
    if let Err(err) = run() {
        tracing::error!("{err:#}");
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<hash_soak::HarnessError>()
            .map_or(1, hash_soak::HarnessError::exit_code);
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let config = Args::parse().into_config();
    config.validate()?;

    println!("{config}");
    println!(
        "Pid: {}. Estimated completion in {} seconds\n",
        std::process::id(),
        config.runtime.saturating_add(config.sampling_period).as_secs()
    );

    let backend = config.backend.build();
    let report = run_soak(&config, backend, Arc::new(PsProbe), Echo::Rows)?;

    println!("\n{report}");
    Ok(())
}
