use super::{HashBackend, HashOutput, HashParams, HashType, HashVersion, OutputKind};
use crate::error::{BackendError, HarnessError};
use argon2::password_hash::{Output, PasswordHash, Salt, SaltString};
use argon2::{Algorithm, Argon2, AssociatedData, Params, ParamsBuilder, PasswordHasher, Version};

/// Argon2 through the `argon2` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Backend;

fn algorithm(hash_type: HashType) -> Algorithm {
    match hash_type {
        HashType::I => Algorithm::Argon2i,
        HashType::D => Algorithm::Argon2d,
        HashType::Id => Algorithm::Argon2id,
    }
}

fn version(version: HashVersion) -> Version {
    match version {
        HashVersion::V10 => Version::V0x10,
        HashVersion::V13 => Version::V0x13,
    }
}

fn build_params(
    memory_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
    hash_length: usize,
    ad: Option<&[u8]>,
) -> Result<Params, BackendError> {
    let mut builder = ParamsBuilder::new();
    builder
        .m_cost(memory_cost_kib)
        .t_cost(time_cost)
        .p_cost(parallelism)
        .output_len(hash_length);
    if let Some(ad) = ad {
        builder.data(AssociatedData::new(ad)?);
    }
    Ok(builder.build()?)
}

fn context<'k>(
    secret: Option<&'k [u8]>,
    algorithm: Algorithm,
    version: Version,
    params: Params,
) -> Result<Argon2<'k>, BackendError> {
    Ok(match secret {
        Some(secret) => Argon2::new_with_secret(secret, algorithm, version, params)?,
        None => Argon2::new(algorithm, version, params),
    })
}

/// Shortest salt Argon2 accepts.
const MIN_SALT_LEN: usize = 8;

/// Longest salt that fits a PHC salt field (base64 without padding).
const MAX_ENCODED_SALT_LEN: usize = Salt::MAX_LENGTH / 4 * 3;

/// Rejects settings the `argon2` crate would refuse on the first hash.
pub(super) fn check_shape(
    salt_len: usize,
    ad_len: usize,
    params: &HashParams,
) -> Result<(), HarnessError> {
    let reject = |msg: String| Err(HarnessError::Configuration(format!("argon2: {msg}")));

    if let Err(err) = Params::new(
        params.memory_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(params.hash_length),
    ) {
        return reject(err.to_string());
    }
    if salt_len < MIN_SALT_LEN {
        return reject(format!("salt must be at least {MIN_SALT_LEN} bytes, got {salt_len}"));
    }
    if ad_len > AssociatedData::MAX_LEN {
        return reject(format!(
            "ad must be at most {} bytes, got {ad_len}",
            AssociatedData::MAX_LEN
        ));
    }
    if params.output == OutputKind::Encoded {
        if salt_len > MAX_ENCODED_SALT_LEN {
            return reject(format!(
                "encoded output holds at most {MAX_ENCODED_SALT_LEN} salt bytes, got {salt_len}"
            ));
        }
        if params.hash_length > Output::MAX_LENGTH {
            return reject(format!(
                "encoded output holds at most {} hash bytes, got {}",
                Output::MAX_LENGTH,
                params.hash_length
            ));
        }
    }
    Ok(())
}

fn raw_digest(
    ctx: &Argon2<'_>,
    password: &[u8],
    salt: &[u8],
    len: usize,
) -> Result<Vec<u8>, BackendError> {
    let mut out = vec![0u8; len];
    ctx.hash_password_into(password, salt, &mut out)?;
    Ok(out)
}

impl HashBackend for Argon2Backend {
    fn name(&self) -> &'static str {
        "argon2"
    }

    fn hash(
        &self,
        ad: Option<&[u8]>,
        salt: &[u8],
        password: &[u8],
        params: &HashParams,
    ) -> Result<HashOutput, BackendError> {
        let argon_params = build_params(
            params.memory_cost_kib,
            params.time_cost,
            params.parallelism,
            params.hash_length,
            ad,
        )?;
        let ctx = context(
            params.secret.as_deref(),
            algorithm(params.hash_type),
            version(params.version),
            argon_params,
        )?;

        match params.output {
            OutputKind::Raw => Ok(HashOutput::Raw {
                hash: raw_digest(&ctx, password, salt, params.hash_length)?,
                salt: salt.to_vec(),
            }),
            OutputKind::Encoded => {
                let salt = SaltString::encode_b64(salt)?;
                let encoded = ctx.hash_password(password, &salt)?.to_string();
                Ok(HashOutput::Encoded(encoded))
            }
        }
    }

    fn verify(
        &self,
        hash: &HashOutput,
        ad: Option<&[u8]>,
        password: &[u8],
        params: &HashParams,
    ) -> Result<bool, BackendError> {
        match hash {
            HashOutput::Raw { hash, salt } => {
                let argon_params = build_params(
                    params.memory_cost_kib,
                    params.time_cost,
                    params.parallelism,
                    hash.len(),
                    ad,
                )?;
                let ctx = context(
                    params.secret.as_deref(),
                    algorithm(params.hash_type),
                    version(params.version),
                    argon_params,
                )?;
                Ok(raw_digest(&ctx, password, salt, hash.len())? == *hash)
            }
            HashOutput::Encoded(encoded) => {
                // Everything except ad and secret comes from the encoded string.
                let parsed = PasswordHash::new(encoded)?;
                let encoded_params = Params::try_from(&parsed)?;
                let algorithm = Algorithm::try_from(parsed.algorithm)?;
                let version = match parsed.version {
                    Some(v) => Version::try_from(v)?,
                    None => Version::default(),
                };

                let stored = parsed
                    .hash
                    .as_ref()
                    .ok_or_else(|| BackendError::Malformed("missing digest".into()))?;
                let salt = parsed
                    .salt
                    .as_ref()
                    .ok_or_else(|| BackendError::Malformed("missing salt".into()))?;
                let mut salt_buf = [0u8; 64];
                let salt = salt.decode_b64(&mut salt_buf)?;
                let argon_params = build_params(
                    encoded_params.m_cost(),
                    encoded_params.t_cost(),
                    encoded_params.p_cost(),
                    stored.len(),
                    ad,
                )?;
                let ctx = context(params.secret.as_deref(), algorithm, version, argon_params)?;
                Ok(raw_digest(&ctx, password, salt, stored.len())? == stored.as_bytes())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap(output: OutputKind) -> HashParams {
        HashParams {
            memory_cost_kib: 32,
            time_cost: 1,
            parallelism: 1,
            output,
            ..HashParams::default()
        }
    }

    #[test]
    fn encoded_hash_verifies() {
        let params = cheap(OutputKind::Encoded);
        let hash = Argon2Backend
            .hash(None, b"somesaltvalue", b"password", &params)
            .unwrap();
        let HashOutput::Encoded(text) = &hash else {
            panic!("expected encoded output, got {hash:?}");
        };
        assert!(text.starts_with("$argon2id$v=19$m=32,t=1,p=1$"), "{text}");

        assert!(Argon2Backend
            .verify(&hash, None, b"password", &params)
            .unwrap());
        assert!(!Argon2Backend
            .verify(&hash, None, b"wrong", &params)
            .unwrap());
    }

    #[test]
    fn raw_hash_honours_length_ad_and_secret() {
        let params = HashParams {
            hash_length: 24,
            secret: Some(b"pepper-pepper".to_vec()),
            ..cheap(OutputKind::Raw)
        };
        let ad = Some(&b"associated"[..]);
        let hash = Argon2Backend
            .hash(ad, b"saltsaltsalt", b"password", &params)
            .unwrap();
        match &hash {
            HashOutput::Raw { hash, salt } => {
                assert_eq!(hash.len(), 24);
                assert_eq!(salt, b"saltsaltsalt");
            }
            other => panic!("expected raw output, got {other:?}"),
        }

        assert!(Argon2Backend.verify(&hash, ad, b"password", &params).unwrap());
        assert!(!Argon2Backend
            .verify(&hash, Some(b"other ad"), b"password", &params)
            .unwrap());
        let no_secret = HashParams {
            secret: None,
            ..params.clone()
        };
        assert!(!Argon2Backend
            .verify(&hash, ad, b"password", &no_secret)
            .unwrap());
    }

    #[test]
    fn version_10_round_trips() {
        let params = HashParams {
            hash_type: HashType::I,
            version: HashVersion::V10,
            ..cheap(OutputKind::Encoded)
        };
        let hash = Argon2Backend
            .hash(None, b"somesaltvalue", b"pw", &params)
            .unwrap();
        assert!(Argon2Backend.verify(&hash, None, b"pw", &params).unwrap());
    }

    #[test]
    fn invalid_cost_is_backend_error() {
        let params = HashParams {
            memory_cost_kib: 1,
            ..cheap(OutputKind::Raw)
        };
        assert!(Argon2Backend
            .hash(None, b"saltsaltsalt", b"pw", &params)
            .is_err());
    }

    #[test]
    fn encoded_limits_are_configuration_errors() {
        let encoded = cheap(OutputKind::Encoded);
        assert!(check_shape(48, 0, &encoded).is_ok());
        assert!(matches!(
            check_shape(64, 0, &encoded),
            Err(HarnessError::Configuration(_))
        ));
        let long_hash = HashParams {
            hash_length: 128,
            ..encoded.clone()
        };
        assert!(check_shape(16, 0, &long_hash).is_err());

        // Raw output has no PHC field limits.
        let raw = HashParams {
            hash_length: 128,
            ..cheap(OutputKind::Raw)
        };
        assert!(check_shape(64, 0, &raw).is_ok());
        let hash = Argon2Backend
            .hash(None, &[7u8; 64], b"pw", &raw)
            .unwrap();
        assert!(Argon2Backend.verify(&hash, None, b"pw", &raw).unwrap());
    }

    #[test]
    fn short_salt_long_ad_and_bad_costs_rejected() {
        let params = cheap(OutputKind::Raw);
        assert!(check_shape(7, 0, &params).is_err());
        assert!(check_shape(8, 33, &params).is_err());
        let bad_cost = HashParams {
            memory_cost_kib: 1,
            ..params
        };
        assert!(check_shape(16, 0, &bad_cost).is_err());
    }

    #[test]
    fn longest_encoded_salt_hashes() {
        let params = cheap(OutputKind::Encoded);
        let salt = [7u8; MAX_ENCODED_SALT_LEN];
        let hash = Argon2Backend.hash(None, &salt, b"pw", &params).unwrap();
        assert!(Argon2Backend.verify(&hash, None, b"pw", &params).unwrap());
    }

    #[test]
    fn garbage_encoded_hash_is_malformed() {
        let params = cheap(OutputKind::Encoded);
        let err = Argon2Backend
            .verify(
                &HashOutput::Encoded("not a phc string".into()),
                None,
                b"pw",
                &params,
            )
            .unwrap_err();
        assert!(matches!(err, BackendError::PasswordHash(_)), "{err:?}");
    }
}
