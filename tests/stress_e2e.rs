use hash_soak::backend::{
    Argon2Backend, BackendKind, DigestBackend, HashOutput, HashParams, NullBackend, OutputKind,
};
use hash_soak::input::InputLengths;
use hash_soak::{run_stress, BackendError, HarnessError, HashBackend, StressConfig};
use std::sync::atomic::{AtomicU64, Ordering};

fn config(iterations: usize, warm_up: usize) -> StressConfig {
    StressConfig {
        iterations,
        warm_up_iterations: warm_up,
        ..StressConfig::default()
    }
}

#[test]
fn zero_iterations_is_invalid_input() {
    let err = run_stress(&config(0, 10), &NullBackend).unwrap_err();
    assert!(matches!(err, HarnessError::InvalidInput(_)), "{err:?}");
    assert_ne!(err.exit_code(), 0);
}

#[test]
fn reports_trimmed_stats_for_both_operations() {
    let report = run_stress(&config(40, 50), &DigestBackend).unwrap();
    assert_eq!(report.hash.count, 38);
    assert_eq!(report.verify.count, 38);
    assert!(report.hash.min <= report.hash.max);
    assert!(report.verify.min <= report.verify.max);
    assert_eq!(
        report.total_millis(),
        (report.hash.sum + report.verify.sum) / 1_000_000
    );
}

#[test]
fn raw_output_with_ad_and_secret() {
    let config = StressConfig {
        lengths: InputLengths {
            ad: 16,
            salt: 16,
            password: 8,
        },
        secret_length: 16,
        params: HashParams {
            output: OutputKind::Raw,
            ..HashParams::default()
        },
        ..config(20, 5)
    };
    let report = run_stress(&config, &DigestBackend).unwrap();
    assert_eq!(report.hash.count, 19);
}

#[test]
fn argon2_with_small_costs() {
    let config = StressConfig {
        backend: BackendKind::Argon2,
        params: HashParams {
            memory_cost_kib: 64,
            time_cost: 1,
            parallelism: 1,
            ..HashParams::default()
        },
        ..config(4, 2)
    };
    let report = run_stress(&config, &Argon2Backend).unwrap();
    assert_eq!(report.hash.count, 3);
    assert!(report.hash.min > 0);
}

/// Accepts warm-up pairs, then rejects the n-th timed verification.
struct RejectAfter {
    verifies: AtomicU64,
    reject_at: u64,
}

impl HashBackend for RejectAfter {
    fn name(&self) -> &'static str {
        "reject-after"
    }

    fn hash(
        &self,
        _ad: Option<&[u8]>,
        _salt: &[u8],
        _password: &[u8],
        _params: &HashParams,
    ) -> Result<HashOutput, BackendError> {
        Ok(HashOutput::Encoded(String::new()))
    }

    fn verify(
        &self,
        _hash: &HashOutput,
        _ad: Option<&[u8]>,
        _password: &[u8],
        _params: &HashParams,
    ) -> Result<bool, BackendError> {
        Ok(self.verifies.fetch_add(1, Ordering::SeqCst) != self.reject_at)
    }
}

#[test]
fn mismatch_during_timed_loop_is_fatal() {
    let backend = RejectAfter {
        verifies: AtomicU64::new(0),
        reject_at: 10 + 7,
    };
    let err = run_stress(&config(100, 10), &backend).unwrap_err();
    match err {
        HarnessError::VerificationMismatch { origin, completed } => {
            assert_eq!(origin, "iteration 7");
            assert_eq!(completed, 7);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn mismatch_during_warm_up_is_fatal() {
    let backend = RejectAfter {
        verifies: AtomicU64::new(0),
        reject_at: 3,
    };
    let err = run_stress(&config(100, 10), &backend).unwrap_err();
    assert!(
        matches!(&err, HarnessError::VerificationMismatch { origin, .. } if origin == "warm-up"),
        "{err:?}"
    );
}
