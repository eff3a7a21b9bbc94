use async_trait::async_trait;
use sqlx::{Row, types::Json};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::settings::UserLinkRepo,
    domain::entities::provider_settings::UserLinkState,
};

#[async_trait]
impl UserLinkRepo for PostgresPersistence {
    async fn get(&self, user_id: Uuid, provider: &str) -> AppResult<Option<UserLinkState>> {
        let row = sqlx::query(
            "SELECT connected, scopes FROM user_provider_links WHERE user_id = $1 AND provider = $2",
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(|row| {
            let scopes_json: serde_json::Value = row.get("scopes");
            UserLinkState {
                connected: row.get("connected"),
                scopes: parse_json_with_fallback(
                    &scopes_json,
                    "scopes",
                    "user_provider_links",
                    &user_id.to_string(),
                ),
            }
        }))
    }

    async fn upsert(&self, user_id: Uuid, provider: &str, state: &UserLinkState) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_provider_links (user_id, provider, connected, scopes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, provider) DO UPDATE SET
                connected = EXCLUDED.connected,
                scopes = EXCLUDED.scopes,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(state.connected)
        .bind(Json(&state.scopes))
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
