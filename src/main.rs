// Argon2 command-line utility
// Mirrors the reference `argon2` CLI: salt as the first argument, password on
// stdin, e.g. `echo -n password | hash_soak somesalt -t 2 -m 16 -p 4 -l 24`

use anyhow::{bail, Context, Result};
use clap::Parser;
use hash_soak::backend::{
    Argon2Backend, HashOutput, HashParams, HashType, HashVersion, OutputKind,
};
use hash_soak::HashBackend;
use std::io::Read;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hashes stdin with Argon2 and verifies the result")]
struct Args {
    /// Salt to hash with
    salt: String,

    /// Use Argon2i (this is the default)
    #[arg(short = 'i', conflicts_with_all = ["argon2d", "argon2id"])]
    argon2i: bool,

    /// Use Argon2d instead of Argon2i
    #[arg(short = 'd')]
    argon2d: bool,

    /// Use Argon2id instead of Argon2i
    #[arg(long = "id")]
    argon2id: bool,

    /// Sets the number of iterations to N
    #[arg(short = 't', value_name = "N", default_value_t = 3)]
    time_cost: u32,

    /// Sets the memory usage of 2^N KiB
    #[arg(
        short = 'm',
        value_name = "N",
        default_value_t = 12,
        value_parser = clap::value_parser!(u32).range(0..32)
    )]
    memory_exp: u32,

    /// Sets parallelism to N threads
    #[arg(short = 'p', value_name = "N", default_value_t = 1)]
    parallelism: u32,

    /// Sets hash output length to N bytes
    #[arg(short = 'l', value_name = "N", default_value_t = 32)]
    hash_length: usize,

    /// Output only encoded hash
    #[arg(short = 'e', conflicts_with = "raw_only")]
    encoded_only: bool,

    /// Output only the raw bytes of the hash
    #[arg(short = 'r')]
    raw_only: bool,

    /// Argon2 version (10|13)
    #[arg(short = 'v', value_name = "10|13", default_value = "13")]
    hash_version: HashVersion,
}

impl Args {
    fn hash_type(&self) -> HashType {
        match (self.argon2i, self.argon2d, self.argon2id) {
            (_, _, true) => HashType::Id,
            (false, true, false) => HashType::D,
            _ => HashType::I,
        }
    }
}

fn main() {
    hash_soak::init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let verbose = !args.encoded_only && !args.raw_only;
    let params = HashParams {
        hash_type: args.hash_type(),
        version: args.hash_version,
        memory_cost_kib: 1 << args.memory_exp,
        time_cost: args.time_cost,
        parallelism: args.parallelism,
        hash_length: args.hash_length,
        secret: None,
        output: OutputKind::Encoded,
    };

    if verbose {
        println!("Type:\t\t{}", params.hash_type.name());
        println!("Iterations:\t{}", params.time_cost);
        println!("Memory:\t\t{} KiB", params.memory_cost_kib);
        println!("Parallelism:\t{}", params.parallelism);
    }

    let mut password = Vec::new();
    std::io::stdin()
        .read_to_end(&mut password)
        .context("failed to read password from stdin")?;
    let salt = args.salt.as_bytes();
    let backend = Argon2Backend;
    let start = Instant::now();

    if verbose || args.raw_only {
        let raw_params = HashParams {
            output: OutputKind::Raw,
            ..params.clone()
        };
        let raw = backend.hash(None, salt, &password, &raw_params)?;
        if let HashOutput::Raw { hash, .. } = raw {
            let hex = hex::encode(hash);
            if args.raw_only {
                println!("{hex}");
            } else {
                println!("Hash:\t\t{hex}");
            }
        }
    }

    let encoded = if verbose || args.encoded_only {
        let encoded = backend.hash(None, salt, &password, &params)?;
        if let HashOutput::Encoded(text) = &encoded {
            if args.encoded_only {
                println!("{text}");
            } else {
                println!("Encoded:\t{text}");
            }
        }
        Some(encoded)
    } else {
        None
    };

    if verbose {
        println!("{:2.3} seconds", start.elapsed().as_secs_f64());
        let Some(encoded) = encoded else {
            bail!("no encoded hash to verify");
        };
        if !backend.verify(&encoded, None, &password, &params)? {
            bail!("Verification failed.");
        }
        println!("Verification ok");
    }
    Ok(())
}
