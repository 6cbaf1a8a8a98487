use reqwest::{Client, Response};

use crate::credential::{Scopes, SigningKey};
use crate::error::{AuthError, Result};
use crate::sources::{assertion, TokenGrant, TokenResponse};
use crate::utils::constants::{GRANT_TYPE_JWT_BEARER, GRANT_TYPE_REFRESH_TOKEN};

/// Refresh-token grant: form POST to `token_uri`.
pub(crate) async fn refresh(
    client: &Client,
    token_uri: &str,
    refresh_token: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<TokenGrant> {
    let form = [
        ("grant_type", GRANT_TYPE_REFRESH_TOKEN),
        ("refresh_token", refresh_token),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];
    let response = client
        .post(token_uri)
        .form(&form)
        .send()
        .await
        .map_err(|e| AuthError::RefreshRejected(format!("POST {}: {}", token_uri, e)))?;

    parse_token_response(token_uri, response).await
}

/// JWT bearer grant with a locally signed service-account assertion.
pub(crate) async fn exchange_assertion(
    client: &Client,
    signing_key: &SigningKey,
    identity: &str,
    token_uri: &str,
    scopes: &Scopes,
) -> Result<TokenGrant> {
    let jwt = assertion::sign(signing_key, identity, token_uri, scopes)?;
    let form = [("grant_type", GRANT_TYPE_JWT_BEARER), ("assertion", jwt.as_str())];
    let response = client
        .post(token_uri)
        .form(&form)
        .send()
        .await
        .map_err(|e| AuthError::RefreshRejected(format!("POST {}: {}", token_uri, e)))?;

    parse_token_response(token_uri, response).await
}

async fn parse_token_response(token_uri: &str, response: Response) -> Result<TokenGrant> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::RefreshRejected(format!(
            "POST {} failed: {} {}",
            token_uri,
            status,
            body.trim()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AuthError::RefreshRejected(format!("POST {}: {}", token_uri, e)))?;
    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| AuthError::RefreshRejected(format!("malformed token response: {}", e)))?;
    if token.access_token.is_empty() {
        return Err(AuthError::RefreshRejected(format!("POST {} returned an empty access_token", token_uri)));
    }

    let expires_in = token.expires_in;
    token.into_grant().ok_or_else(|| {
        AuthError::RefreshRejected(format!(
            "POST {} returned an unusable expires_in ({})",
            token_uri, expires_in
        ))
    })
}
