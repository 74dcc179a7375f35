use super::{HashBackend, HashOutput, HashParams, OutputKind};
use crate::error::{BackendError, HarnessError};
use sha2::{Digest, Sha256};

/// Iterated, salted SHA-256. Cheap enough to push the harness itself.
///
/// Encoded form: `$sha256$t=<time cost>$<salt hex>$<digest hex>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestBackend;

const MAX_DIGEST: usize = 32;

pub(super) fn check_shape(params: &HashParams) -> Result<(), HarnessError> {
    if params.hash_length == 0 || params.hash_length > MAX_DIGEST {
        return Err(HarnessError::Configuration(format!(
            "sha256 hash length must be 1..={MAX_DIGEST}, got {}",
            params.hash_length
        )));
    }
    Ok(())
}

fn digest(
    secret: Option<&[u8]>,
    ad: Option<&[u8]>,
    salt: &[u8],
    password: &[u8],
    rounds: u32,
    len: usize,
) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for field in [secret.unwrap_or_default(), ad.unwrap_or_default(), salt] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field);
    }
    hasher.update(password);
    let mut state = hasher.finalize();
    for _ in 1..rounds.max(1) {
        let mut hasher = Sha256::new();
        hasher.update(state);
        hasher.update(password);
        state = hasher.finalize();
    }
    state[..len.min(MAX_DIGEST)].to_vec()
}

fn parse_encoded(text: &str) -> Result<(u32, Vec<u8>, Vec<u8>), BackendError> {
    let malformed = || BackendError::Malformed(text.to_owned());
    let mut parts = text.split('$');
    if parts.next() != Some("") || parts.next() != Some("sha256") {
        return Err(malformed());
    }
    let rounds = parts
        .next()
        .and_then(|p| p.strip_prefix("t="))
        .and_then(|t| t.parse().ok())
        .ok_or_else(malformed)?;
    let mut field = || parts.next().and_then(|p| hex::decode(p).ok());
    let salt = field().ok_or_else(malformed)?;
    let hash = field().ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok((rounds, salt, hash))
}

impl HashBackend for DigestBackend {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn hash(
        &self,
        ad: Option<&[u8]>,
        salt: &[u8],
        password: &[u8],
        params: &HashParams,
    ) -> Result<HashOutput, BackendError> {
        if params.hash_length == 0 || params.hash_length > MAX_DIGEST {
            return Err(BackendError::Unsupported(format!(
                "sha256 hash length must be 1..={MAX_DIGEST}, got {}",
                params.hash_length
            )));
        }
        let secret = params.secret.as_deref();
        let hash = digest(secret, ad, salt, password, params.time_cost, params.hash_length);
        Ok(match params.output {
            OutputKind::Raw => HashOutput::Raw {
                hash,
                salt: salt.to_vec(),
            },
            OutputKind::Encoded => HashOutput::Encoded(format!(
                "$sha256$t={}${}${}",
                params.time_cost,
                hex::encode(salt),
                hex::encode(&hash)
            )),
        })
    }

    fn verify(
        &self,
        hash: &HashOutput,
        ad: Option<&[u8]>,
        password: &[u8],
        params: &HashParams,
    ) -> Result<bool, BackendError> {
        let secret = params.secret.as_deref();
        let (rounds, salt, expected) = match hash {
            HashOutput::Raw { hash, salt } => (params.time_cost, salt.clone(), hash.clone()),
            HashOutput::Encoded(text) => parse_encoded(text)?,
        };
        if expected.is_empty() || expected.len() > MAX_DIGEST {
            return Err(BackendError::Malformed(format!(
                "digest of {} bytes",
                expected.len()
            )));
        }
        Ok(digest(secret, ad, &salt, password, rounds, expected.len()) == expected)
    }
}

/// Does no work and accepts everything. Measures harness overhead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl HashBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn hash(
        &self,
        _ad: Option<&[u8]>,
        _salt: &[u8],
        _password: &[u8],
        params: &HashParams,
    ) -> Result<HashOutput, BackendError> {
        Ok(match params.output {
            OutputKind::Raw => HashOutput::Raw {
                hash: Vec::new(),
                salt: Vec::new(),
            },
            OutputKind::Encoded => HashOutput::Encoded(String::new()),
        })
    }

    fn verify(
        &self,
        _hash: &HashOutput,
        _ad: Option<&[u8]>,
        _password: &[u8],
        _params: &HashParams,
    ) -> Result<bool, BackendError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(output: OutputKind) -> HashParams {
        HashParams {
            output,
            ..HashParams::default()
        }
    }

    #[test]
    fn encoded_form_is_self_describing() {
        let hash = DigestBackend
            .hash(None, &[0xde, 0xad], b"pw", &params(OutputKind::Encoded))
            .unwrap();
        let HashOutput::Encoded(text) = &hash else {
            panic!("expected encoded, got {hash:?}");
        };
        assert!(text.starts_with("$sha256$t=2$dead$"), "{text}");
        // 16 byte digest, hex encoded.
        assert_eq!(text.rsplit('$').next().unwrap().len(), 32);
    }

    #[test]
    fn verify_checks_every_input() {
        let p = HashParams {
            secret: Some(b"k".to_vec()),
            ..params(OutputKind::Encoded)
        };
        let ad = Some(&b"ad"[..]);
        let hash = DigestBackend.hash(ad, b"salt", b"pw", &p).unwrap();

        assert!(DigestBackend.verify(&hash, ad, b"pw", &p).unwrap());
        assert!(!DigestBackend.verify(&hash, ad, b"px", &p).unwrap());
        assert!(!DigestBackend.verify(&hash, None, b"pw", &p).unwrap());
        let other_secret = HashParams {
            secret: Some(b"j".to_vec()),
            ..p.clone()
        };
        assert!(!DigestBackend.verify(&hash, ad, b"pw", &other_secret).unwrap());
    }

    #[test]
    fn raw_output_verifies() {
        let p = params(OutputKind::Raw);
        let hash = DigestBackend.hash(None, b"salt", b"pw", &p).unwrap();
        assert!(DigestBackend.verify(&hash, None, b"pw", &p).unwrap());
    }

    #[test]
    fn field_boundaries_are_length_prefixed() {
        let a = digest(None, Some(b"ab"), b"c", b"pw", 1, 32);
        let b = digest(None, Some(b"a"), b"bc", b"pw", 1, 32);
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_encodings_are_rejected() {
        let p = params(OutputKind::Encoded);
        for text in ["", "$sha256$t=x$00$00", "$md5$t=1$00$00", "$sha256$t=1$0$00", "$sha256$t=1$00$00$"] {
            let err = DigestBackend
                .verify(&HashOutput::Encoded(text.into()), None, b"pw", &p)
                .unwrap_err();
            assert!(matches!(err, BackendError::Malformed(_)), "{text}: {err:?}");
        }
    }

    #[test]
    fn oversized_hash_length_is_unsupported() {
        let p = HashParams {
            hash_length: 64,
            ..params(OutputKind::Raw)
        };
        assert!(matches!(
            DigestBackend.hash(None, b"s", b"pw", &p),
            Err(BackendError::Unsupported(_))
        ));
    }

    #[test]
    fn null_backend_accepts_anything() {
        let p = params(OutputKind::Encoded);
        let hash = NullBackend.hash(None, b"", b"", &p).unwrap();
        assert_eq!(hash, HashOutput::Encoded(String::new()));
        assert!(NullBackend.verify(&hash, None, b"other", &p).unwrap());
    }
}
