use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use private_membership::{utils::parse_bytes32, Config, MerkleProofOutput, MerkleTree};
use std::fs;
use std::path::PathBuf;

/// Builds the member Merkle tree from a leaves file and writes the inclusion
/// proof for one leaf.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File with one `0x` hex leaf per line, in on-chain order
    #[arg(short, long)]
    leaves_file: PathBuf,

    /// Position of the leaf to prove
    #[arg(short, long, conflicts_with = "leaf", required_unless_present = "leaf")]
    position: Option<usize>,

    /// Leaf to prove, looked up in the leaves file
    #[arg(long)]
    leaf: Option<String>,

    /// Output path, defaults to `merkle.proof_output_file` from the config
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, env = "PMP_CONFIG")]
    config: Option<PathBuf>,
}

fn read_leaves(path: &PathBuf, max_size: u64) -> Result<Vec<[u8; 32]>> {
    let metadata = fs::metadata(path).context("Failed to read leaves file metadata")?;
    debug!("Leaves file size: {} bytes", metadata.len());

    if metadata.len() > max_size {
        return Err(anyhow::anyhow!(
            "Leaves file too large: {} bytes (max {} bytes). Raise merkle.max_leaves_file_size in the config to allow it.",
            metadata.len(),
            max_size
        ));
    }

    let content = fs::read_to_string(path).context("Failed to read leaves file")?;
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| {
            parse_bytes32(line).with_context(|| format!("Invalid leaf on line {}: '{line}'", i + 1))
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    info!("Loading leaves from: {}", args.leaves_file.display());
    let leaves = read_leaves(&args.leaves_file, config.merkle.max_leaves_file_size)?;
    if leaves.is_empty() {
        return Err(anyhow::anyhow!(
            "No leaves found in '{}'",
            args.leaves_file.display()
        ));
    }
    info!("Loaded {} leaves", leaves.len());

    info!("Building Merkle tree...");
    let tree = MerkleTree::new(leaves);
    info!("Merkle root: 0x{}", hex::encode(tree.root));

    let position = match (args.position, &args.leaf) {
        (Some(position), _) => position,
        (None, Some(leaf)) => {
            let leaf = parse_bytes32(leaf).context("Invalid leaf")?;
            tree.position_of(&leaf).with_context(|| {
                format!(
                    "Leaf 0x{} not found in '{}'",
                    hex::encode(leaf),
                    args.leaves_file.display()
                )
            })?
        }
        (None, None) => return Err(anyhow::anyhow!("Either --position or --leaf is required")),
    };
    debug!("Proving leaf at position {position}");

    let proof = tree
        .generate_proof(position)
        .context("Failed to generate Merkle proof")?;

    if !tree.verify_proof(&proof) {
        error!("Generated proof does not verify against the tree root");
        return Err(anyhow::anyhow!("Merkle proof self-verification failed"));
    }
    info!("Proof verified against root");

    let output = MerkleProofOutput::from(&proof);
    output.validate()?;

    let output_path = args
        .output
        .unwrap_or_else(|| config.merkle.proof_output_file.clone());
    output.write_to_file(&output_path)?;
    info!("Merkle proof written to: {}", output_path.display());

    Ok(())
}
