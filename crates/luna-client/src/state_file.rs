//! JSON state file for the in-memory inventory
//!
//! Lets the CLI keep node records between runs without a luna backend.

use crate::error::RepositoryError;
use crate::memory::{InMemoryNodeRepository, Inventory};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

/// Location of a persisted [`Inventory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the inventory into a new repository; a missing file is an empty inventory
    pub async fn load(&self) -> Result<InMemoryNodeRepository, RepositoryError> {
        let inventory = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<Inventory>(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("State file {} does not exist, starting with an empty inventory", self.path.display());
                Inventory::default()
            }
            Err(e) => return Err(RepositoryError::Io(e)),
        };
        debug!(
            "Loaded {} nodes, {} groups, {} switches from {}",
            inventory.nodes.len(),
            inventory.groups.len(),
            inventory.switches.len(),
            self.path.display()
        );
        Ok(InMemoryNodeRepository::from_inventory(inventory))
    }

    /// Write the repository's inventory, replacing the file atomically
    pub async fn save(&self, repo: &InMemoryNodeRepository) -> Result<(), RepositoryError> {
        let rendered = serde_json::to_vec_pretty(&repo.inventory())?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, rendered).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Saved inventory to {}", self.path.display());
        Ok(())
    }
}
