// Single-thread latency benchmark
// Warms the backend up, then times hash and verify separately and reports
// avg/min/max over the fastest 95% of iterations.

use anyhow::Result;
use clap::Parser;
use hash_soak::backend::{BackendKind, HashParams, HashType, HashVersion, OutputKind};
use hash_soak::input::InputLengths;
use hash_soak::{run_stress, StressConfig};

/// Warms up and runs a stress test with the selected settings.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Hashing backend (argon2|sha256|null)
    #[arg(short, long, default_value = "argon2")]
    backend: BackendKind,

    /// Run N iterations on stress test
    #[arg(long = "iterations", visible_alias = "it", default_value_t = 100)]
    iterations: usize,

    /// Untimed warm-up iterations
    #[arg(long = "warm-up", default_value_t = 5000)]
    warm_up: usize,

    /// Output hash type (raw|encoded)
    #[arg(long = "output-type", visible_alias = "ot", default_value = "encoded")]
    output_type: OutputKind,

    /// Number of salt bytes
    #[arg(long = "salt-length", visible_alias = "sl", default_value_t = 16)]
    salt_length: usize,

    /// Number of password bytes
    #[arg(long = "password-length", visible_alias = "pl", default_value_t = 32)]
    password_length: usize,

    /// Number of secret bytes
    #[arg(long = "secret-length", visible_alias = "kl", default_value_t = 0)]
    secret_length: usize,

    /// Number of ad bytes
    #[arg(long = "ad-length", visible_alias = "al", default_value_t = 0)]
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
    fn into_config(self) -> StressConfig {
        StressConfig {
            backend: self.backend,
            iterations: self.iterations,
            warm_up_iterations: self.warm_up,
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
                secret: None,
                output: self.output_type,
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

    let backend = config.backend.build();
    let report = run_stress(&config, backend.as_ref())?;

    println!(
        "Iterations: {:5}, Output type: {}, AD length: {}, Salt length: {}, Password length: {}",
        config.iterations,
        config.params.output,
        config.lengths.ad,
        config.lengths.salt,
        config.lengths.password
    );
    println!("{report}");
    Ok(())
}
