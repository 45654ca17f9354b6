pub mod credential;
pub mod password;
pub mod token_codec;

pub use credential::extract_identity;
pub use token_codec::{IssuedToken, TokenCodec};

/// Every way a presented credential can fail.
///
/// All variants collapse to `401 Unauthorized` at the HTTP boundary; the
/// variant itself only reaches the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingCredential,
    #[error("authorization header is not `<scheme> <token>`")]
    MalformedCredential,
    #[error("token is not a compact signed structure")]
    MalformedToken,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token claims missing or invalid subject")]
    MalformedClaims,
}
