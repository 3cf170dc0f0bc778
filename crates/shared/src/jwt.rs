//! JWT claims and validation.
//!
//! Kasira consumes tokens issued by the identity service; this module
//! only validates them and exposes the tenant scope they carry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying token signatures.
    pub secret: String,
}

/// Claims carried by an access token.
///
/// `organization_id` and `branch_id` describe the caller's tenant
/// scope: a super admin carries neither restriction, an organization
/// admin carries only `organization_id`, and branch staff carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: Uuid,
    /// Organization the user is scoped to, if any.
    pub organization_id: Option<Uuid>,
    /// Branch the user is scoped to, if any.
    pub branch_id: Option<Uuid>,
    /// Whether the user is a super admin.
    #[serde(default)]
    pub super_admin: bool,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
}

impl Claims {
    /// Creates claims expiring at the given time.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        organization_id: Option<Uuid>,
        branch_id: Option<Uuid>,
        super_admin: bool,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id,
            organization_id,
            branch_id,
            super_admin,
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
        }
    }

    /// Returns the user ID.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// JWT service for token validation.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired, or
    /// `JwtError::DecodingError` if it is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    /// Signs claims into a token. Used by tests and tooling; production
    /// tokens come from the identity service with the same secret.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }
}

/// Convenience constructor for short-lived test tokens.
#[must_use]
pub fn claims_for(
    user_id: Uuid,
    organization_id: Option<Uuid>,
    branch_id: Option<Uuid>,
    super_admin: bool,
) -> Claims {
    Claims::new(
        user_id,
        organization_id,
        branch_id,
        super_admin,
        Utc::now() + Duration::minutes(15),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
        })
    }

    #[test]
    fn test_roundtrip_branch_scoped_claims() {
        let service = test_service();
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let branch_id = Uuid::new_v4();

        let claims = claims_for(user_id, Some(org_id), Some(branch_id), false);
        let token = service.sign(&claims).unwrap();

        let decoded = service.validate_token(&token).unwrap();
        assert_eq!(decoded.user_id(), user_id);
        assert_eq!(decoded.organization_id, Some(org_id));
        assert_eq!(decoded.branch_id, Some(branch_id));
        assert!(!decoded.super_admin);
    }

    #[test]
    fn test_roundtrip_super_admin_claims() {
        let service = test_service();
        let claims = claims_for(Uuid::new_v4(), None, None, true);
        let token = service.sign(&claims).unwrap();

        let decoded = service.validate_token(&token).unwrap();
        assert!(decoded.super_admin);
        assert!(decoded.organization_id.is_none());
        assert!(decoded.branch_id.is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let claims = Claims::new(
            Uuid::new_v4(),
            None,
            None,
            false,
            Utc::now() - Duration::hours(1),
        );
        let token = service.sign(&claims).unwrap();

        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, JwtError::Expired));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = test_service();
        let err = service.validate_token("not-a-token").unwrap_err();
        assert!(matches!(err, JwtError::DecodingError(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let other = JwtService::new(&JwtConfig {
            secret: "a-different-secret".to_string(),
        });

        let token = service
            .sign(&claims_for(Uuid::new_v4(), None, None, false))
            .unwrap();
        assert!(other.validate_token(&token).is_err());
    }
}
