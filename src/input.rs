use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// Sizes of the random fields generated for every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLengths {
    /// Zero omits the associated data entirely.
    pub ad: usize,
    pub salt: usize,
    pub password: usize,
}

impl Default for InputLengths {
    fn default() -> Self {
        Self {
            ad: 32,
            salt: 16,
            password: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub ad: Option<Vec<u8>>,
    pub salt: Vec<u8>,
    pub password: Vec<u8>,
}

impl Inputs {
    #[must_use]
    pub fn ad(&self) -> Option<&[u8]> {
        self.ad.as_deref()
    }
}

/// Fresh random inputs on every call. One generator per thread.
#[derive(Debug)]
pub struct InputGenerator {
    lengths: InputLengths,
    rng: SmallRng,
}

impl InputGenerator {
    #[must_use]
    pub fn new(lengths: InputLengths) -> Self {
        Self {
            lengths,
            rng: SmallRng::from_entropy(),
        }
    }

    #[must_use]
    pub fn with_seed(lengths: InputLengths, seed: u64) -> Self {
        Self {
            lengths,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn next_inputs(&mut self) -> Inputs {
        let ad = (self.lengths.ad > 0).then(|| self.bytes(self.lengths.ad));
        Inputs {
            ad,
            salt: self.bytes(self.lengths.salt),
            password: self.bytes(self.lengths.password),
        }
    }

    pub fn bytes(&mut self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.rng.fill_bytes(&mut buf);
        buf
    }
}

/// Random key material, or `None` for length zero.
#[must_use]
pub fn random_secret(len: usize) -> Option<Vec<u8>> {
    (len > 0).then(|| {
        let mut secret = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut secret);
        secret
    })
}
