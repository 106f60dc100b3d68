use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use private_membership::{
    ethereum::normalize_signature, generate_membership_hash, BjjKeyPair, Config,
    NewMembershipInput,
};
use std::path::PathBuf;

/// Derives the BabyJubJub key pair and membership commitment from the three
/// seed signatures and writes the circuit input file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Signature over the BJJ key seed message
    #[arg(long, env = "PMP_BJJ_SIGNATURE")]
    bjj_signature: String,

    /// Signature over the secret id seed message
    #[arg(long, env = "PMP_SECRET_ID_SIGNATURE")]
    secret_id_signature: String,

    /// Signature over the nullifier and trapdoor seed message
    #[arg(long, env = "PMP_NULLIFIER_SIGNATURE")]
    nullifier_signature: String,

    /// Output path, defaults to `membership.circuit_input_file` from the config
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, env = "PMP_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    let bjj_signature =
        normalize_signature(&args.bjj_signature).context("Invalid BJJ key signature")?;
    let secret_id_signature =
        normalize_signature(&args.secret_id_signature).context("Invalid secret id signature")?;
    let nullifier_signature = normalize_signature(&args.nullifier_signature)
        .context("Invalid nullifier and trapdoor signature")?;

    info!("Deriving BabyJubJub key pair...");
    let key_pair = BjjKeyPair::from_signature(&bjj_signature)
        .context("Failed to derive key pair from signature")?;
    info!(
        "Public key: ({}, {})",
        key_pair.public_key.x, key_pair.public_key.y
    );

    info!("Generating membership hash...");
    let membership = generate_membership_hash(&nullifier_signature, &secret_id_signature)
        .context("Failed to generate membership hash")?;
    info!("Membership hash: {}", membership.hash);

    let input = NewMembershipInput::new(&key_pair, &membership);
    if let Err(e) = input.validate() {
        error!("Derived circuit input is inconsistent: {e:#}");
        return Err(e);
    }
    debug!("Circuit input validated");

    let output = args
        .output
        .unwrap_or_else(|| config.membership.circuit_input_file.clone());
    input.write_to_file(&output)?;
    info!("Circuit input written to: {}", output.display());

    Ok(())
}
