use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{Row, types::Json};

use crate::{
    adapters::persistence::{PostgresPersistence, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::settings::ProviderSettingsRepo,
    domain::entities::provider_settings::{ProviderSettings, SettingsUpdate},
};

const COLUMNS: &str = "name, display_name, enable_module, client_id, client_secret, scopes";

fn row_to_settings(row: sqlx::postgres::PgRow) -> ProviderSettings {
    let name: String = row.get("name");
    let scopes_json: serde_json::Value = row.get("scopes");
    let client_secret: String = row.get("client_secret");
    ProviderSettings {
        scopes: parse_json_with_fallback(&scopes_json, "scopes", "provider_settings", &name),
        display_name: row.get("display_name"),
        enable_module: row.get("enable_module"),
        client_id: row.get("client_id"),
        client_secret: SecretString::new(client_secret.into()),
        name,
    }
}

#[async_trait]
impl ProviderSettingsRepo for PostgresPersistence {
    async fn get(&self, provider: &str) -> AppResult<Option<ProviderSettings>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM provider_settings WHERE name = $1"
        ))
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_settings))
    }

    async fn list(&self) -> AppResult<Vec<ProviderSettings>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM provider_settings ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_settings).collect())
    }

    async fn update(
        &self,
        provider: &str,
        update: &SettingsUpdate,
    ) -> AppResult<Option<ProviderSettings>> {
        // Providers are seeded by migrations; unknown names match no row.
        let row = sqlx::query(&format!(
            r#"
            UPDATE provider_settings SET
                enable_module = $2,
                client_id = $3,
                client_secret = $4,
                scopes = COALESCE($5, scopes),
                updated_at = CURRENT_TIMESTAMP
            WHERE name = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(provider)
        .bind(update.enable_module)
        .bind(&update.client_id)
        .bind(update.client_secret.expose_secret())
        .bind(update.scopes.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_settings))
    }
}
