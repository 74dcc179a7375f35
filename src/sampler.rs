//! Background stats collector.
//!
//! Order of events in [`Sampler::run`]:
//!
//! 1. header sample at `T = 0`
//! 2. open the [`StartupGate`] so the driver may spawn workers
//! 3. one sample per period until the stop signal arrives
//! 4. three settle rounds, then a final sample
//! 5. release the sampler's [`ShutdownSlot`]
//!
//! A failed reading only drops its row.

use crate::counter::HashCounter;
use crate::error::SamplingError;
use crate::gate::{ShutdownSlot, StartupGate};
use crate::probe::{ProbeReading, ProcessProbe};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

pub const SETTLE_ROUNDS: usize = 3;
pub const SETTLE_PAUSE: Duration = Duration::from_millis(10);

/// One immutable row of the sample table.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub elapsed_millis: u64,
    pub hash_counter: u64,
    pub metrics: ProbeReading,
}

impl SampleRecord {
    /// Column titles for [`row`](Self::row): `T,C,` followed by the probe's
    /// own header.
    #[must_use]
    pub fn header(&self) -> String {
        comma_join(&format!("T C {}", self.metrics.header))
    }

    #[must_use]
    pub fn row(&self) -> String {
        comma_join(&format!(
            "{} {} {}",
            self.elapsed_millis, self.hash_counter, self.metrics.values
        ))
    }
}

fn comma_join(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(",")
}

/// Rows collected so far, in emission order.
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    rows: Arc<Mutex<Vec<SampleRecord>>>,
}

impl SampleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, record: SampleRecord) {
        self.rows.lock().push(record);
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<SampleRecord> {
        self.rows.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct Sampler {
    pub counter: Arc<HashCounter>,
    pub startup: Arc<StartupGate>,
    pub slot: ShutdownSlot,
    pub probe: Arc<dyn ProcessProbe>,
    pub period: Duration,
    pub table: SampleTable,
    /// Print rows to stdout as they are taken.
    pub echo: bool,
    pub pid: u32,
}

impl Sampler {
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        let start = Instant::now();

        self.sample(start, true).await;
        self.startup.open();

        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                () = tokio::time::sleep(self.period) => {}
                // Either a stop request or the driver went away.
                _ = stop.changed() => break,
            }
            self.sample(start, false).await;
        }

        for _ in 0..SETTLE_ROUNDS {
            self.probe.settle();
            tokio::time::sleep(SETTLE_PAUSE).await;
        }
        self.sample(start, false).await;

        tracing::debug!(rows = self.table.len(), "sampler stopped");
        self.slot.release();
    }

    async fn sample(&self, start: Instant, header: bool) {
        let probe = Arc::clone(&self.probe);
        let pid = self.pid;
        let reading = tokio::task::spawn_blocking(move || probe.read(pid))
            .await
            .unwrap_or_else(|err| Err(SamplingError::Task(err.to_string())));
        let reading = match reading {
            Ok(reading) => reading,
            Err(err) => {
                tracing::warn!(error = ?err, "stats sample skipped");
                return;
            }
        };

        let record = SampleRecord {
            elapsed_millis: if header {
                0
            } else {
                u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
            },
            hash_counter: self.counter.get(),
            metrics: reading,
        };
        if self.echo {
            if header {
                println!("{}", record.header());
            }
            println!("{}", record.row());
        }
        self.table.push(record);
    }
}
