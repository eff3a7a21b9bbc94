use redis::aio::ConnectionManager;

use crate::{
    adapters::persistence::PostgresPersistence,
    infra::{db::init_db, error::InfraError},
};

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod scope_handoff;
pub mod setup;

pub async fn postgres_persistence(database_url: &str) -> anyhow::Result<PostgresPersistence> {
    let pool = init_db(database_url).await?;
    let persistence = PostgresPersistence::new(pool);
    Ok(persistence)
}

pub async fn redis_connection(redis_url: &str) -> Result<ConnectionManager, InfraError> {
    let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
    let manager = ConnectionManager::new(client)
        .await
        .map_err(InfraError::RedisConnection)?;
    tracing::info!("Connected to redis!");
    Ok(manager)
}
