pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;

pub use error::{AppError, DatabaseError};
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use db::{DbOperations, Property, SearchCriteria};

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: Arc<DbOperations>,
}

impl AppState {
    /// Opens the connection pool and checks the schema is reachable.
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::connect(&config.database).await?;
        db.probe().await?;

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
        })
    }

    /// Runs the filtered property search against this state's pool.
    pub async fn search_properties(
        &self,
        criteria: &SearchCriteria,
        limit: Option<u32>,
    ) -> Result<Vec<Property>> {
        self.db.get_all_properties(criteria, limit).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db.close().await;
        Ok(())
    }
}
