// In-memory хранилище для тестов и встраивания

use crate::storage::models::StoredArtifact;
use crate::storage::ArtifactSink;
use crate::utils::error::Result;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryArtifactSink {
    artifacts: Mutex<Vec<StoredArtifact>>,
}

impl MemoryArtifactSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<StoredArtifact> {
        self.artifacts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }
}

impl ArtifactSink for MemoryArtifactSink {
    fn save(&self, artifact: &StoredArtifact) -> Result<String> {
        if let Ok(mut artifacts) = self.artifacts.lock() {
            artifacts.push(artifact.clone());
        }
        Ok(format!("memory:{}", artifact.name))
    }
}
