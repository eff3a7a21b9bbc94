use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::account_link::{LinkedAccountProfile, LinkedAccountRepo},
};

fn row_to_profile(row: sqlx::postgres::PgRow) -> LinkedAccountProfile {
    LinkedAccountProfile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        provider: row.get("provider"),
        external_id: row.get("external_id"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl LinkedAccountRepo for PostgresPersistence {
    async fn get(&self, user_id: Uuid, provider: &str) -> AppResult<Option<LinkedAccountProfile>> {
        let row = sqlx::query(
            "SELECT id, user_id, provider, external_id, created_at FROM oauth_accounts WHERE user_id = $1 AND provider = $2",
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_profile))
    }

    async fn delete(&self, user_id: Uuid, provider: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM oauth_accounts WHERE user_id = $1 AND provider = $2")
            .bind(user_id)
            .bind(provider)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
