pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod traits;

use crate::{
    config::{Config, HistoryBackend},
    error::Result,
};
use std::sync::Arc;

pub use memory::MemoryHistoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresHistoryStore;
pub use traits::HistoryStore;

/// Builds the history backend once at startup. `Ok(None)` means history is
/// not configured and the endpoints degrade instead of failing.
pub fn open_history_store(config: &Config) -> Result<Option<Arc<dyn HistoryStore>>> {
    match config.history_backend {
        HistoryBackend::Memory => Ok(Some(Arc::new(MemoryHistoryStore::new()))),
        HistoryBackend::Postgres => {
            let Some(database) = &config.database else {
                return Ok(None);
            };

            #[cfg(feature = "postgres")]
            {
                Ok(Some(Arc::new(PostgresHistoryStore::new(database)?)))
            }
            #[cfg(not(feature = "postgres"))]
            {
                let _ = database;
                Err(crate::error::StudioError::ConfigError(
                    "PostgreSQL feature not enabled".into(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_database_yields_none() {
        assert!(open_history_store(&Config::new()).unwrap().is_none());
    }

    #[test]
    fn test_memory_backend() {
        let store = open_history_store(&Config::new().with_memory_history())
            .unwrap()
            .unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
