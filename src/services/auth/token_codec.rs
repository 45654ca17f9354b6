/*
 * Responsibility
 * - identity token (HS256 JWT) の発行 / 検証
 * - token は stateless: サーバ側に何も持たないので、失効は exp だけ
 * - 検証失敗は AuthError に分類 (ログ用)、レスポンスは一律 401
 */
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::AuthError;

/// Claims written into every issued token.
#[derive(Debug, Serialize)]
struct IssuedClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Claims as read back. `sub` stays optional so an absent subject is reported
/// as `MalformedClaims` rather than a generic decode failure.
#[derive(Debug, Deserialize)]
struct PresentedClaims {
    #[serde(default)]
    sub: Option<String>,
    exp: i64,
}

/// Issued token plus the metadata handlers echo back to clients.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// HS256 token issuer/verifier bound to the process-wide secret.
///
/// - Key material is not printable via Debug.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is checked against the caller-supplied clock in `verify_at`
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        }
    }

    pub fn issue(&self, identity: Uuid) -> Result<IssuedToken, AppError> {
        self.issue_at(identity, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (epoch seconds).
    pub fn issue_at(&self, identity: Uuid, now: i64) -> Result<IssuedToken, AppError> {
        let claims = IssuedClaims {
            sub: identity.to_string(),
            iat: now,
            exp: now.saturating_add(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX)),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign identity token");
            AppError::Internal
        })?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl_seconds,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify `token` against the secret and the clock value `now`.
    ///
    /// Checks run in order: structure, signature, claims shape, expiry.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Uuid, AuthError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(AuthError::MalformedToken);
        }
        jsonwebtoken::decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        let data =
            jsonwebtoken::decode::<PresentedClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|e| classify(e.kind()))?;
        let claims = data.claims;

        let sub = claims.sub.ok_or(AuthError::MalformedClaims)?;
        let identity = Uuid::parse_str(&sub).map_err(|_| AuthError::MalformedClaims)?;

        if now > claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(identity)
    }
}

// The header has already decoded at this point, so anything failing after the
// MAC check is about the claims segment.
fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Json(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Utf8(_) => AuthError::MalformedClaims,
        _ => AuthError::MalformedToken,
    }
}
