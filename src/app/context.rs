use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{ReelError, Result};
use crate::config::Config;
use crate::engine::Engine;
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub engine: Engine,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.database.path.clone() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let engine = Engine::new(&config.engine, config.catalog.clone())?;
        Ok(Self {
            config,
            store,
            engine,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ReelError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("reelscout");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("reelscout.db"))
    }
}
