use anyhow::{Context, Result};
use clap::Parser;
use ethers::signers::{LocalWallet, Signer};
use ethers::utils::{hash_message, to_checksum};
use log::info;
use private_membership::{Config, SeedPurpose};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

/// Signs the three seed messages with a wallet, producing fixtures for
/// `derive_membership`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Wallet private key; a random wallet is created when omitted
    #[arg(short, long, env = "PMP_PRIVATE_KEY")]
    private_key: Option<String>,

    #[arg(short, long, default_value = "signatures.json")]
    output: PathBuf,

    #[arg(short, long, env = "PMP_CONFIG")]
    config: Option<PathBuf>,
}

fn sign_message(wallet: &LocalWallet, message: &str) -> Result<String> {
    let signature = wallet
        .sign_hash(hash_message(message))
        .context("Failed to sign seed message")?;
    Ok(format!("0x{}", hex::encode(signature.to_vec())))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    let wallet: LocalWallet = match &args.private_key {
        Some(key) => {
            private_membership::ethereum::validate_private_key(key)?;
            key.parse().context("Failed to parse private key")?
        }
        None => LocalWallet::new(&mut rand::thread_rng()),
    };
    let address = to_checksum(&wallet.address(), None);
    info!("Signer address: {address}");

    let mut signatures = serde_json::Map::new();
    for purpose in SeedPurpose::ALL {
        let message = config.keys.seed_message(purpose, &address);
        let signature = sign_message(&wallet, &message)?;
        info!("Signed {purpose} seed message");
        signatures.insert(
            purpose.to_string(),
            json!({ "message": message, "signature": signature }),
        );
    }

    let document = json!({
        "address": address,
        "chainId": config.keys.chain_id,
        "signatures": signatures,
    });
    let content =
        serde_json::to_string_pretty(&document).context("Failed to serialize signatures")?;
    fs::write(&args.output, content)
        .with_context(|| format!("Failed to write signatures to {}", args.output.display()))?;
    info!("Signatures written to: {}", args.output.display());

    Ok(())
}
