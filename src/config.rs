//! Configuration file support for the membership tooling.
//!
//! This module provides configuration file loading from TOML format. Every
//! field has a default, so a partial file (or no file at all) is valid.

use crate::key::{
    render_seed_message, SeedPurpose, BJJ_KEY_MESSAGE_TEMPLATE, DEFAULT_CHAIN_ID,
    NULLIFIER_TRAPDOOR_MESSAGE_TEMPLATE, SECRET_ID_MESSAGE_TEMPLATE,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_MAX_LEAVES_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_PROOF_OUTPUT_FILE: &str = "merkle_proof.json";
const DEFAULT_CIRCUIT_INPUT_FILE: &str = "input_newMembership.json";

/// Configuration for the membership tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub merkle: MerkleConfig,
    #[serde(default)]
    pub membership: MembershipConfig,
}

/// Chain id and the seed message templates wallets sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default = "default_bjj_message_template")]
    pub bjj_message_template: String,
    #[serde(default = "default_secret_id_message_template")]
    pub secret_id_message_template: String,
    #[serde(default = "default_nullifier_message_template")]
    pub nullifier_message_template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleConfig {
    #[serde(default = "default_max_leaves_file_size")]
    pub max_leaves_file_size: u64,
    #[serde(default = "default_proof_output_file")]
    pub proof_output_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipConfig {
    #[serde(default = "default_circuit_input_file")]
    pub circuit_input_file: PathBuf,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            bjj_message_template: default_bjj_message_template(),
            secret_id_message_template: default_secret_id_message_template(),
            nullifier_message_template: default_nullifier_message_template(),
        }
    }
}

impl Default for MerkleConfig {
    fn default() -> Self {
        Self {
            max_leaves_file_size: DEFAULT_MAX_LEAVES_FILE_SIZE,
            proof_output_file: default_proof_output_file(),
        }
    }
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            circuit_input_file: default_circuit_input_file(),
        }
    }
}

fn default_chain_id() -> String {
    DEFAULT_CHAIN_ID.to_string()
}

fn default_bjj_message_template() -> String {
    BJJ_KEY_MESSAGE_TEMPLATE.to_string()
}

fn default_secret_id_message_template() -> String {
    SECRET_ID_MESSAGE_TEMPLATE.to_string()
}

fn default_nullifier_message_template() -> String {
    NULLIFIER_TRAPDOOR_MESSAGE_TEMPLATE.to_string()
}

fn default_max_leaves_file_size() -> u64 {
    DEFAULT_MAX_LEAVES_FILE_SIZE
}

fn default_proof_output_file() -> PathBuf {
    PathBuf::from(DEFAULT_PROOF_OUTPUT_FILE)
}

fn default_circuit_input_file() -> PathBuf {
    PathBuf::from(DEFAULT_CIRCUIT_INPUT_FILE)
}

impl KeysConfig {
    #[must_use]
    pub fn template(&self, purpose: SeedPurpose) -> &str {
        match purpose {
            SeedPurpose::BjjKey => &self.bjj_message_template,
            SeedPurpose::SecretId => &self.secret_id_message_template,
            SeedPurpose::NullifierTrapdoor => &self.nullifier_message_template,
        }
    }

    /// Renders the seed message for `purpose` with the configured template
    /// and chain id.
    #[must_use]
    pub fn seed_message(&self, purpose: SeedPurpose, address: &str) -> String {
        render_seed_message(self.template(purpose), address, &self.chain_id)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn load_from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}
