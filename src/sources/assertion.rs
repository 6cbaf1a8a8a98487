use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::credential::{Scopes, SigningKey};
use crate::error::{AuthError, Result};
use crate::helpers::time::now_i64;
use crate::utils::constants::ASSERTION_LIFETIME_SECS;

/// Claims of a service-account JWT bearer assertion.
#[derive(Debug, Serialize)]
pub struct AssertionClaims<'a> {
    pub iss: &'a str,
    pub sub: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scope: String,
    pub aud: &'a str,
    pub iat: i64,
    pub exp: i64,
}

/// Parse a PEM private key, rejecting anything that cannot sign RS256.
pub fn encoding_key(signing_key: &SigningKey) -> Result<EncodingKey> {
    EncodingKey::from_rsa_pem(signing_key.pem().as_bytes())
        .map_err(|e| AuthError::MalformedKey(format!("private_key is not a usable RSA key: {}", e)))
}

/// Sign an assertion for `identity` addressed to `token_uri`.
pub fn sign(signing_key: &SigningKey, identity: &str, token_uri: &str, scopes: &Scopes) -> Result<String> {
    let key = encoding_key(signing_key)?;
    let iat = now_i64();
    let claims = AssertionClaims {
        iss: identity,
        sub: identity,
        scope: scopes.joined(),
        aud: token_uri,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };
    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| AuthError::MalformedKey(format!("failed to sign assertion: {}", e)))
}
