// Файловое хранилище артефактов

use crate::storage::models::StoredArtifact;
use crate::storage::ArtifactSink;
use crate::utils::error::Result;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Пишет каждый артефакт в новый файл в `dir`, никогда не перезаписывая существующий
pub struct FileArtifactSink {
    dir: PathBuf,
}

impl FileArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate(&self, name: &str, attempt: u32) -> PathBuf {
        if attempt == 0 {
            return self.dir.join(name);
        }
        let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
        self.dir.join(format!("{}_{}.{}", stem, attempt, ext))
    }
}

impl ArtifactSink for FileArtifactSink {
    fn save(&self, artifact: &StoredArtifact) -> Result<String> {
        let mut attempt = 0;
        loop {
            let path = self.candidate(&artifact.name, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&artifact.data)?;
                    let shown = path.canonicalize().unwrap_or(path);
                    return Ok(shown.display().to_string());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
