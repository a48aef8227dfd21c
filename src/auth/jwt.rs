use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::role::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account email.
    pub sub: String,
    pub user_id: u64,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

pub fn generate_access_token(
    user_id: u64,
    email: &str,
    role: Role,
    secret: &str,
    ttl: u64,
) -> AppResult<String> {
    let issued_at = now();
    let claims = Claims {
        sub: email.to_string(),
        user_id,
        role,
        iat: issued_at,
        exp: issued_at + ttl as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let token = generate_access_token(7, "ana@corp.test", Role::Admin, "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "ana@corp.test");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);

        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let a = generate_access_token(1, "a@corp.test", Role::Employee, "k", 60).unwrap();
        let b = generate_access_token(1, "a@corp.test", Role::Employee, "k", 60).unwrap();
        assert_ne!(a, b);
    }
}
