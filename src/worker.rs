//! Hash/verify load generator.

use crate::backend::{HashBackend, HashParams};
use crate::control::{RunAbort, WorkerControl};
use crate::counter::HashCounter;
use crate::error::HarnessError;
use crate::gate::ShutdownSlot;
use crate::input::{InputGenerator, InputLengths};
use std::sync::Arc;

/// One hash followed by one verify of the result. A `false` verification is
/// an error, never a benchmarking outcome.
pub fn hash_verify_pair(
    backend: &dyn HashBackend,
    params: &HashParams,
    ad: Option<&[u8]>,
    salt: &[u8],
    password: &[u8],
) -> Result<bool, HarnessError> {
    let hash = backend
        .hash(ad, salt, password, params)
        .map_err(|e| HarnessError::backend("hash", e))?;
    backend
        .verify(&hash, ad, password, params)
        .map_err(|e| HarnessError::backend("verify", e))
}

pub struct Worker {
    pub control: Arc<WorkerControl>,
    pub counter: Arc<HashCounter>,
    pub abort: Arc<RunAbort>,
    pub slot: ShutdownSlot,
    pub backend: Arc<dyn HashBackend>,
    pub params: Arc<HashParams>,
    pub lengths: InputLengths,
}

impl Worker {
    /// Runs until a stop is requested, then marks itself stopped and releases
    /// its shutdown slot. A fatal error trips the shared [`RunAbort`] instead
    /// of counting the pair.
    pub fn run(self) {
        let id = self.control.id();
        tracing::debug!(worker = id, "hash/verify loop started");

        if let Err(err) = self.hash_verify_loop() {
            self.abort.trip(err);
        }

        self.control.mark_stopped();
        tracing::debug!(
            worker = id,
            completed = self.control.completed(),
            "hash/verify loop stopped"
        );
        self.slot.release();
    }

    fn hash_verify_loop(&self) -> Result<(), HarnessError> {
        let mut inputs = InputGenerator::new(self.lengths);
        while !self.control.stop_requested() {
            let i = inputs.next_inputs();
            let matched = hash_verify_pair(
                self.backend.as_ref(),
                &self.params,
                i.ad(),
                &i.salt,
                &i.password,
            )?;
            if !matched {
                return Err(HarnessError::VerificationMismatch {
                    origin: format!("worker {}", self.control.id()),
                    completed: self.control.completed(),
                });
            }
            // Another worker failed: this pair does not count.
            if self.abort.is_tripped() {
                break;
            }
            self.counter.add_pair();
            self.control.record_pair();
        }
        Ok(())
    }
}
