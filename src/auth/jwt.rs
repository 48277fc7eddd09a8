use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;

/// Access-token claims. The role travels in the token so handlers can gate
/// on it without a user lookup; a role change takes effect on next refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
}

impl JwtService {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            access_ttl: Duration::minutes(config.jwt_expiry_minutes),
        })
    }

    pub fn generate_token(&self, user_id: Uuid, username: &str, role: &str) -> Result<String> {
        let issued = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_owned(),
            role: role.to_owned(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued.timestamp() as usize,
            exp: (issued + self.access_ttl).timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[self.issuer.clone()]);
        validation.set_audience(&[self.audience.clone()]);
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService {
            encoding: EncodingKey::from_secret(b"test-secret"),
            decoding: DecodingKey::from_secret(b"test-secret"),
            issuer: "careers-test".to_string(),
            audience: "careers-clients".to_string(),
            access_ttl: Duration::minutes(5),
        }
    }

    #[test]
    fn round_trips_role_claim() {
        let svc = service();
        let id = Uuid::new_v4();
        let token = svc.generate_token(id, "dana", "hrd").unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, "hrd");
    }

    #[test]
    fn rejects_token_from_other_issuer() {
        let svc = service();
        let other = JwtService {
            issuer: "someone-else".to_string(),
            ..service()
        };
        let token = other
            .generate_token(Uuid::new_v4(), "dana", "candidate")
            .unwrap();
        assert!(svc.verify_token(&token).is_err());
    }
}
