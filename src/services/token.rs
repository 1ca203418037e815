//! Access and refresh token issuance
//!
//! Tokens are HMAC-signed JWTs carrying the user id as `sub` and a `type`
//! tag. Verification fails closed: any decode problem yields `None`.

use crate::config::Config;
use crate::domain::models::User;
use crate::error::{AppError, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by both token types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenService {
    pub fn new(
        secret: &str,
        algorithm: Algorithm,
        access_ttl: chrono::Duration,
        refresh_ttl: chrono::Duration,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            &config.jwt_secret,
            config.algorithm()?,
            chrono::Duration::minutes(config.access_token_minutes),
            chrono::Duration::days(config.refresh_token_days),
        ))
    }

    /// Issue a fresh access/refresh pair for a stored user
    pub fn issue_token_pair(&self, user: &User) -> Result<TokenPair> {
        let user_id = user.id.ok_or_else(|| {
            AppError::InvalidInput("Cannot issue tokens for an unsaved user".into())
        })?;
        let now = chrono::Utc::now();

        let access = Claims {
            sub: user_id.to_string(),
            email: Some(user.email.clone()),
            token_type: TokenType::Access,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let refresh = Claims {
            sub: user_id.to_string(),
            email: None,
            token_type: TokenType::Refresh,
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Claims of a valid, unexpired token of the expected type
    pub fn verify_token(&self, token: &str, expected: TokenType) -> Option<Claims> {
        match self.decode(token) {
            Ok(claims) if claims.token_type == expected => Some(claims),
            Ok(claims) => {
                log::debug!(
                    "Rejected {:?} token where {:?} was expected",
                    claims.token_type,
                    expected
                );
                None
            }
            Err(e) => {
                log::debug!("Rejected token: {}", e);
                None
            }
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| AppError::Other(format!("Failed to sign token: {}", e)))
    }

    fn decode(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}
