//! Genesis invocation service
//!
//! Discovers unpacked entity packages under a directory and runs the node
//! binary once with the fixed chain prefix plus one `--entity`/`--node` pair
//! per entity. The genesis documents themselves are never read here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{DomainError, EntityDir, GenesisCommand};
use crate::infrastructure::traits::{CommandRunner, FileSystem};

/// Builds and runs the genesis command.
pub struct GenesisService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl GenesisService {
    /// Create a new genesis service.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Resolve the entities directory to an absolute, canonical path.
    ///
    /// # Errors
    /// - `EntitiesDirNotFound` if nothing exists at `path`
    /// - `NotADirectory` if `path` resolves to something other than a directory
    pub fn resolve_entities_dir(&self, path: &Path) -> ApplicationResult<PathBuf> {
        if !self.fs.exists(path) {
            return Err(DomainError::EntitiesDirNotFound(path.to_path_buf()).into());
        }
        let resolved = self
            .fs
            .canonicalize(path)
            .with_path_context("resolve entities directory", path)?;
        if !self.fs.is_dir(&resolved) {
            return Err(DomainError::NotADirectory(resolved).into());
        }
        debug!("resolve_entities_dir: {}", resolved.display());
        Ok(resolved)
    }

    /// Enumerate the entity directories directly under `dir`.
    ///
    /// Children that are not directories are skipped. Entities are sorted by
    /// name unless `sort_entities` is disabled, in which case the filesystem
    /// listing order is kept.
    pub fn discover_entities(&self, dir: &Path) -> ApplicationResult<Vec<EntityDir>> {
        let children = self
            .fs
            .list_dir(dir)
            .with_path_context("list entities directory", dir)?;

        let mut entities: Vec<EntityDir> = children
            .into_iter()
            .filter_map(|child| {
                if self.fs.is_dir(&child) {
                    Some(EntityDir::from_path(child))
                } else {
                    debug!("discover_entities: skipping non-directory {}", child.display());
                    None
                }
            })
            .collect();

        if self.settings.sort_entities {
            entities.sort_by(|a, b| a.name.cmp(&b.name));
        }

        debug!(
            "discover_entities: found {} entities in {}",
            entities.len(),
            dir.display()
        );
        Ok(entities)
    }

    /// Assemble the node invocation for the given entities, in order.
    pub fn build_command(&self, entities: &[EntityDir]) -> GenesisCommand {
        GenesisCommand::new(
            self.settings.node_binary.as_str(),
            &self.settings.chain,
            entities,
        )
    }

    /// Resolve, discover and assemble without running anything.
    pub fn plan(&self, entities_dir: &Path) -> ApplicationResult<GenesisCommand> {
        let dir = self.resolve_entities_dir(entities_dir)?;
        let entities = self.discover_entities(&dir)?;
        Ok(self.build_command(&entities))
    }

    /// Run the node binary once and wait for it.
    ///
    /// A non-zero exit is returned as `NodeFailed`; there is no retry.
    pub fn invoke(&self, command: &GenesisCommand) -> ApplicationResult<()> {
        info!(
            "running {} with {} entities",
            command.program(),
            command.entity_pairs().len()
        );
        debug!("invoke: {}", command);

        let status = self
            .cmd
            .status(command.program(), command.args())
            .map_err(|source| ApplicationError::NodeSpawn {
                program: command.program().to_string(),
                source,
            })?;

        if !status.success() {
            return Err(ApplicationError::NodeFailed {
                program: command.program().to_string(),
                exit_code: status.code(),
            });
        }
        Ok(())
    }

    /// Plan and invoke. Returns the command that was run.
    pub fn run(&self, entities_dir: &Path) -> ApplicationResult<GenesisCommand> {
        let command = self.plan(entities_dir)?;
        self.invoke(&command)?;
        info!(
            "genesis written to {}",
            self.settings.chain.genesis_file.display()
        );
        Ok(command)
    }
}
