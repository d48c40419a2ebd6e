use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::config::AuthSettings;

/// Value of the `type` claim that marks a refresh token.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Represents the claims encoded within a JWT.
///
/// Access tokens carry no `type` claim; refresh tokens carry `type: "refresh"`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// The user's email.
    pub sub: String,
    pub id: Uuid,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// The caller identity recovered from a verified access token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for VerifiedIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.id,
            email: claims.sub,
        }
    }
}

/// Signs and verifies access and refresh tokens with one shared HMAC secret.
///
/// Built once at startup and shared read-only between workers.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(settings.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            header: Header::new(settings.algorithm),
            validation,
            access_ttl: Duration::minutes(settings.access_token_ttl_minutes),
            refresh_ttl: Duration::days(settings.refresh_token_ttl_days),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// Configured lifetime of access tokens.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Configured lifetime of refresh tokens.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issues an access token for `email` / `user_id` expiring `ttl` from now.
    pub fn issue_access(
        &self,
        email: &str,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        self.sign(email, user_id, ttl, None)
    }

    /// Issues a refresh token. Same claims as an access token plus `type: "refresh"`.
    pub fn issue_refresh(
        &self,
        email: &str,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        self.sign(email, user_id, ttl, Some(REFRESH_TOKEN_TYPE.to_string()))
    }

    /// Verifies an access token. Tokens carrying any `type` claim are rejected.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if let Some(token_type) = &claims.token_type {
            debug!("Rejected token of type {:?} presented as access token", token_type);
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Verifies a refresh token. The `type` claim must be `"refresh"`.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if claims.token_type.as_deref() != Some(REFRESH_TOKEN_TYPE) {
            debug!("Rejected token without refresh type presented as refresh token");
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    fn sign(
        &self,
        email: &str,
        user_id: Uuid,
        ttl: Duration,
        token_type: Option<String>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: email.to_string(),
            id: user_id,
            exp: (Utc::now() + ttl).timestamp(),
            token_type,
        };

        encode(&self.header, &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign token: {}", e);
            AuthError::Internal(format!("Failed to generate token: {}", e))
        })
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("Token verification failed: {}", e);
                AuthError::InvalidToken
            })?;

        // The library accepts `exp == now`; expiry here is exclusive.
        if claims.exp <= Utc::now().timestamp() {
            warn!("Token verification failed: ExpiredSignature");
            return Err(AuthError::InvalidToken);
        }
        if claims.sub.trim().is_empty() {
            warn!("Token verification failed: empty subject");
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}
