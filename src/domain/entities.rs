//! Domain entities: core data structures

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Node binary invoked when nothing else is configured.
pub const DEFAULT_NODE_BINARY: &str = "oasis-node";

/// Entity genesis document, relative to an entity directory.
pub const ENTITY_GENESIS_REL_PATH: [&str; 2] = ["entity", "entity_genesis.json"];

/// Node genesis document, relative to an entity directory.
pub const NODE_GENESIS_REL_PATH: [&str; 2] = ["node", "node_genesis.json"];

/// One unpacked entity package: a named subdirectory of the entities directory.
///
/// The genesis documents inside are never opened here; a missing file only
/// shows up as a failure of the node binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDir {
    /// Directory name, as listed by the filesystem
    pub name: OsString,
    /// Absolute path to the entity directory
    pub path: PathBuf,
}

impl EntityDir {
    /// Create an entity from its absolute directory path.
    ///
    /// The name is the last path component (empty for a filesystem root).
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();
        Self { name, path }
    }

    /// Path to `<entity>/entity/entity_genesis.json`.
    pub fn entity_genesis(&self) -> PathBuf {
        join_rel(&self.path, &ENTITY_GENESIS_REL_PATH)
    }

    /// Path to `<entity>/node/node_genesis.json`.
    pub fn node_genesis(&self) -> PathBuf {
        join_rel(&self.path, &NODE_GENESIS_REL_PATH)
    }
}

fn join_rel(base: &Path, rel: &[&str]) -> PathBuf {
    rel.iter().fold(base.to_path_buf(), |acc, part| acc.join(part))
}

/// Chain bootstrap parameters passed through to the node binary.
///
/// All values are opaque to this crate; durations and sizes stay strings
/// because the node parses them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChainParams {
    /// Where the node writes the genesis document
    pub genesis_file: PathBuf,
    /// Chain identifier
    pub chain_id: String,
    /// Staking ledger consumed by the node
    pub staking_file: PathBuf,
    /// Epoch interval in blocks
    pub epoch_interval: u64,
    pub timeout_commit: String,
    pub empty_block_interval: String,
    pub max_tx_size: String,
    /// Consensus backend name
    pub backend: String,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            genesis_file: PathBuf::from("/tmp/genesis.json"),
            chain_id: "sometest-chain-id".into(),
            staking_file: PathBuf::from("/tmp/staking.json"),
            epoch_interval: 200,
            timeout_commit: "5s".into(),
            empty_block_interval: "0s".into(),
            max_tx_size: "32kb".into(),
            backend: "tendermint".into(),
        }
    }
}

impl ChainParams {
    /// Fixed flag/value prefix of the genesis invocation, in node flag order.
    pub fn prefix_args(&self) -> Vec<OsString> {
        let pairs: [(&str, OsString); 8] = [
            ("--genesis.file", self.genesis_file.clone().into_os_string()),
            ("--chain.id", self.chain_id.clone().into()),
            ("--staking", self.staking_file.clone().into_os_string()),
            (
                "--epochtime.tendermint.interval",
                self.epoch_interval.to_string().into(),
            ),
            (
                "--epochtime.tendermint.timeout_commit",
                self.timeout_commit.clone().into(),
            ),
            (
                "--consensus.tendermint.empty_block_interval",
                self.empty_block_interval.clone().into(),
            ),
            (
                "--consensus.tendermint.max_tx_size",
                self.max_tx_size.clone().into(),
            ),
            (
                "--consensus.tendermint.backend",
                self.backend.clone().into(),
            ),
        ];

        pairs
            .into_iter()
            .flat_map(|(flag, value)| [OsString::from(flag), value])
            .collect()
    }
}
