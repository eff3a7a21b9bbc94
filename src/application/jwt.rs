use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::user_role::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

pub fn issue(
    user_id: Uuid,
    role: UserRole,
    secret: &secrecy::SecretString,
    ttl: Duration,
) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let exp = now + ttl.whole_seconds();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now,
        exp,
    };
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn verify(token: &str, secret: &secrecy::SecretString) -> AppResult<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let secret = SecretString::new("test-secret".into());
        let user_id = Uuid::new_v4();
        let token = issue(user_id, UserRole::TenantAdmin, &secret, Duration::hours(1)).unwrap();

        let claims = verify(&token, &secret).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, UserRole::TenantAdmin);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = issue(
            Uuid::new_v4(),
            UserRole::NormalUser,
            &SecretString::new("a".into()),
            Duration::hours(1),
        )
        .unwrap();

        let err = verify(&token, &SecretString::new("b".into())).unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
