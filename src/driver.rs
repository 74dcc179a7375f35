//! Benchmark drivers.
//!
//! [`run_soak`] keeps `workers` hash/verify loops busy for a fixed wall-clock
//! time while an optional sampler records process metrics. [`run_stress`]
//! times a fixed number of pairs on the calling thread and summarises the
//! latencies with [`TrimmedStats`].

use crate::backend::{HashBackend, HashParams};
use crate::config::{SoakConfig, StressConfig};
use crate::control::{RunAbort, WorkerControl};
use crate::counter::HashCounter;
use crate::error::HarnessError;
use crate::gate::{ShutdownGate, StartupGate};
use crate::input::{random_secret, InputGenerator};
use crate::probe::ProcessProbe;
use crate::sampler::{SampleRecord, SampleTable, Sampler};
use crate::stats::TrimmedStats;
use crate::worker::{hash_verify_pair, Worker};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::watch;

pub const WARM_UP_PASSWORD: &[u8] = b"a password value";
pub const WARM_UP_SALT: &[u8] = b"a salt value";

/// Pause after warm-up so the allocator and caches settle.
const SETTLE_AFTER_WARM_UP: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct SoakReport {
    pub total_hashes: u64,
    /// Sum of the pairs each worker reports it completed.
    pub completed_pairs: u64,
    /// Shutdown slots released before the counter was read.
    pub gate_releases: usize,
    pub elapsed: Duration,
    pub samples: Vec<SampleRecord>,
}

impl fmt::Display for SoakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Executed {} hash/verify in {}s.",
            self.total_hashes,
            self.elapsed.as_secs()
        )
    }
}

/// Echo sample rows to stdout as they are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    Rows,
    Quiet,
}

pub fn run_soak(
    config: &SoakConfig,
    backend: Arc<dyn HashBackend>,
    probe: Arc<dyn ProcessProbe>,
    echo: Echo,
) -> Result<SoakReport, HarnessError> {
    config.validate()?;
    let params = Arc::new(HashParams {
        secret: random_secret(config.secret_length),
        ..config.params.clone()
    });

    let counter = Arc::new(HashCounter::new());
    let startup = Arc::new(StartupGate::new());
    let shutdown = ShutdownGate::new(config.workers + 1);
    let abort = Arc::new(RunAbort::new());
    let table = SampleTable::new();

    let sampler_slot = shutdown
        .slot()
        .ok_or_else(|| HarnessError::InvalidInput("no shutdown slot for sampler".into()))?;
    let (stop_sampler, stop_rx) = watch::channel(false);
    let sampler_runtime = if config.sampling_enabled() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("stats-sampler")
            .enable_all()
            .build()?;
        let sampler = Sampler {
            counter: Arc::clone(&counter),
            startup: Arc::clone(&startup),
            slot: sampler_slot,
            probe,
            period: config.sampling_period,
            table: table.clone(),
            echo: echo == Echo::Rows,
            pid: std::process::id(),
        };
        runtime.spawn(sampler.run(stop_rx));
        Some(runtime)
    } else {
        startup.open();
        sampler_slot.release();
        None
    };

    // No worker may start before the baseline sample exists.
    startup.wait();
    let start = Instant::now();
    tracing::info!(
        workers = config.workers,
        runtime_secs = config.runtime.as_secs_f64(),
        backend = backend.name(),
        "starting hash/verify loops"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("hash-verify-{i}"))
        .build()?;
    let mut controls = Vec::with_capacity(config.workers);
    for id in 0..config.workers {
        let control = Arc::new(WorkerControl::new(id));
        let slot = shutdown
            .slot()
            .ok_or_else(|| HarnessError::InvalidInput("no shutdown slot for worker".into()))?;
        let worker = Worker {
            control: Arc::clone(&control),
            counter: Arc::clone(&counter),
            abort: Arc::clone(&abort),
            slot,
            backend: Arc::clone(&backend),
            params: Arc::clone(&params),
            lengths: config.lengths,
        };
        pool.spawn(move || worker.run());
        controls.push(control);
    }

    if abort.wait_timeout(config.runtime) {
        tracing::warn!("run cut short by a fatal error");
    }

    for control in &controls {
        control.request_stop();
    }
    let _ = stop_sampler.send(true);

    shutdown.wait();
    let elapsed = start.elapsed();
    let total_hashes = counter.get();
    if let Some(runtime) = sampler_runtime {
        runtime.shutdown_background();
    }

    if let Some(err) = abort.take() {
        return Err(err);
    }

    let report = SoakReport {
        total_hashes,
        completed_pairs: controls.iter().map(|c| c.completed()).sum(),
        gate_releases: shutdown.released(),
        elapsed,
        samples: table.snapshot(),
    };
    tracing::info!(
        total_hashes = report.total_hashes,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "hash/verify loops finished"
    );
    Ok(report)
}

/// Per-iteration nanosecond timings of one stress run.
#[derive(Debug, Clone, Default)]
pub struct LatencySeries {
    pub hash: Vec<i64>,
    pub verify: Vec<i64>,
}

impl LatencySeries {
    /// Reserves room for `iterations` timings up front so the timed loop
    /// never reallocates. An iteration count the process cannot hold is a
    /// configuration error.
    pub fn try_with_capacity(iterations: usize) -> Result<Self, HarnessError> {
        let mut series = Self::default();
        series
            .hash
            .try_reserve_exact(iterations)
            .and_then(|()| series.verify.try_reserve_exact(iterations))
            .map_err(|e| {
                HarnessError::Configuration(format!(
                    "cannot hold {iterations} latency samples: {e}"
                ))
            })?;
        Ok(series)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StressReport {
    pub hash: TrimmedStats,
    pub verify: TrimmedStats,
}

impl StressReport {
    /// Combined trimmed time spent hashing and verifying.
    #[must_use]
    pub fn total_millis(&self) -> i64 {
        (self.hash.sum + self.verify.sum) / 1_000_000
    }
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "        [{:>10}    {:>15}      {:>14} ]", "avg", "min", "max (95%)")?;
        writeln!(f, "Hash  : {}", self.hash)?;
        writeln!(f, "Verify: {}", self.verify)?;
        write!(f, "Total : {}ms", self.total_millis())
    }
}

fn nanos_since(start: Instant) -> i64 {
    i64::try_from(start.elapsed().as_nanos()).unwrap_or(i64::MAX)
}

/// Runs `iterations` untimed pairs on fixed inputs with minimal-cost
/// parameters.
pub fn warm_up(
    backend: &dyn HashBackend,
    params: &HashParams,
    iterations: usize,
) -> Result<(), HarnessError> {
    let params = params.warm_up();
    for _ in 0..iterations {
        if !hash_verify_pair(backend, &params, None, WARM_UP_SALT, WARM_UP_PASSWORD)? {
            return Err(HarnessError::VerificationMismatch {
                origin: "warm-up".into(),
                completed: 0,
            });
        }
    }
    thread::sleep(SETTLE_AFTER_WARM_UP);
    Ok(())
}

/// Times `iterations` pairs on fresh random inputs, appending to `series`.
pub fn measure(
    backend: &dyn HashBackend,
    params: &HashParams,
    inputs: &mut InputGenerator,
    series: &mut LatencySeries,
    iterations: usize,
) -> Result<(), HarnessError> {
    for i in 0..iterations {
        let input = inputs.next_inputs();

        let start = Instant::now();
        let hash = backend
            .hash(input.ad(), &input.salt, &input.password, params)
            .map_err(|e| HarnessError::backend("hash", e))?;
        series.hash.push(nanos_since(start));

        let start = Instant::now();
        let matched = backend
            .verify(&hash, input.ad(), &input.password, params)
            .map_err(|e| HarnessError::backend("verify", e))?;
        series.verify.push(nanos_since(start));

        if !matched {
            return Err(HarnessError::VerificationMismatch {
                origin: format!("iteration {i}"),
                completed: i as u64,
            });
        }
    }
    Ok(())
}

pub fn run_stress(
    config: &StressConfig,
    backend: &dyn HashBackend,
) -> Result<StressReport, HarnessError> {
    config.validate()?;
    let mut series = LatencySeries::try_with_capacity(config.iterations)?;

    tracing::info!(iterations = config.warm_up_iterations, "warming up");
    warm_up(backend, &config.params, config.warm_up_iterations)?;

    let params = HashParams {
        secret: random_secret(config.secret_length),
        ..config.params.clone()
    };
    tracing::info!(
        iterations = config.iterations,
        backend = backend.name(),
        "running stress test"
    );
    let mut inputs = InputGenerator::new(config.lengths);
    measure(backend, &params, &mut inputs, &mut series, config.iterations)?;

    Ok(StressReport {
        hash: TrimmedStats::from_latencies(&series.hash)?,
        verify: TrimmedStats::from_latencies(&series.verify)?,
    })
}
