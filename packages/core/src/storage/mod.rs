// Модуль хранилища диагностических артефактов
//
// Дескриптор с неизвестным algorithm id сохраняется как есть,
// чтобы его можно было приложить к issue и разобрать офлайн.

pub mod file;
pub mod memory;
pub mod models;

use crate::utils::error::Result;
use models::StoredArtifact;

pub use file::FileArtifactSink;
pub use memory::MemoryArtifactSink;

/// Приёмник диагностических артефактов
pub trait ArtifactSink: Send + Sync {
    /// Сохранить артефакт, вернуть человекочитаемое место хранения
    fn save(&self, artifact: &StoredArtifact) -> Result<String>;
}

impl<T: ArtifactSink + ?Sized> ArtifactSink for std::sync::Arc<T> {
    fn save(&self, artifact: &StoredArtifact) -> Result<String> {
        (**self).save(artifact)
    }
}
