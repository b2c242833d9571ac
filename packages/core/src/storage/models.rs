// Модели данных для хранилища

use crate::utils::time::current_timestamp_millis;

/// Сырые байты, сохранённые для офлайн-разбора
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub name: String,
    pub data: Vec<u8>,
    pub created_at: i64,
}

impl StoredArtifact {
    /// Дамп дескриптора алгоритма: `algo_dump_<millis>.bin`
    pub fn algorithm_dump(data: &[u8]) -> Self {
        let created_at = current_timestamp_millis();
        Self {
            name: format!("algo_dump_{}.bin", created_at),
            data: data.to_vec(),
            created_at,
        }
    }
}
