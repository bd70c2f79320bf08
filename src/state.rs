use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::auth::{
    jwt::JwtKeys,
    memory::InMemoryUserStore,
    repo::{PgUserStore, UserStore},
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn UserStore>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    /// Connects to Postgres and runs migrations when `DATABASE_URL` is set,
    /// otherwise falls back to the in-memory store.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                info!("using postgres user store");
                Arc::new(PgUserStore::new(db))
            }
            None => {
                warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(InMemoryUserStore::new())
            }
        };
        Ok(Self::from_parts(Arc::new(config), store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        let jwt = Arc::new(JwtKeys::from_config(&config.jwt));
        Self { config, store, jwt }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(Arc::new(config), Arc::new(InMemoryUserStore::new()))
    }
}
