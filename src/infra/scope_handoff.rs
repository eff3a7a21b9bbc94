use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::link_runtime::{ScopeHandoff, ScopeHandoffStore},
};

/// Scope handoff kept in Redis under a per-user, per-provider key.
#[derive(Clone)]
pub struct RedisScopeHandoffStore {
    manager: ConnectionManager,
}

impl RedisScopeHandoffStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn handoff_key(user_id: Uuid, provider: &str) -> String {
        format!("scope_handoff:{user_id}:{provider}")
    }
}

#[async_trait]
impl ScopeHandoffStore for RedisScopeHandoffStore {
    async fn put(
        &self,
        user_id: Uuid,
        provider: &str,
        handoff: &ScopeHandoff,
        ttl_secs: u64,
    ) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let key = Self::handoff_key(user_id, provider);

        let json = serde_json::to_string(handoff)
            .map_err(|e| AppError::Internal(format!("Failed to serialize scope handoff: {e}")))?;

        let _: () = conn
            .set_ex(key, json, ttl_secs.max(1))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, user_id: Uuid, provider: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .del(Self::handoff_key(user_id, provider))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn take(&self, user_id: Uuid, provider: &str) -> AppResult<Option<ScopeHandoff>> {
        let mut conn = self.manager.clone();
        let key = Self::handoff_key(user_id, provider);

        // Atomic GET + DEL so the handoff is read at most once.
        let script = redis::Script::new(
            r#"
            local value = redis.call('GET', KEYS[1])
            if value then
                redis.call('DEL', KEYS[1])
            end
            return value
            "#,
        );

        let raw: Option<String> = script
            .key(&key)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to take scope handoff: {e}")))?;

        match raw {
            Some(value) => {
                let handoff: ScopeHandoff = serde_json::from_str(&value).map_err(|e| {
                    AppError::Internal(format!("Failed to parse scope handoff: {e}"))
                })?;
                Ok(Some(handoff))
            }
            None => Ok(None),
        }
    }
}
