//! # Keygen Subcommand
//!
//! Generates a random symmetric key for encrypted registries and prints it
//! as lowercase hex.

use anyhow::Result;
use clap::Args;
use credreg_crypto::SymmetricKey;
use zeroize::Zeroizing;

/// Arguments for `credreg keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Number of keys to generate, one per line.
    #[arg(long, default_value_t = 1)]
    pub count: u32,
}

/// Generate `count` keys as hex strings.
pub fn keygen(args: &KeygenArgs) -> Vec<Zeroizing<String>> {
    (0..args.count)
        .map(|_| SymmetricKey::generate().to_hex())
        .collect()
}

pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    for key in keygen(args) {
        println!("{}", key.as_str());
    }
    Ok(0)
}
