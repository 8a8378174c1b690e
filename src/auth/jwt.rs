use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

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
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn token(exp_offset: i64, secret: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            user_id: 7,
            tenant_id: 1,
            sub: "ana".to_string(),
            role: 3,
            exp: (now + exp_offset) as usize,
            jti: "test-jti".to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_accepts_valid_token() {
        let claims = verify_token(&token(600, "secret"), "secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.tenant_id, 1);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        assert!(verify_token(&token(600, "secret"), "other").is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        assert!(verify_token(&token(-600, "secret"), "secret").is_err());
    }
}
