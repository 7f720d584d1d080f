//! The resource owner password credentials exchange

use reqwest::{StatusCode, Url};
use ropc_clock::UnixTime;

use crate::{
    provider::Credentials,
    tokens::CachedToken,
    transport::{RequestMethod, TokenRequest, TokenTransport},
    Settings, TokenProviderError,
};

pub(crate) mod dto;

const GRANT_TYPE: &str = "password";

#[tracing::instrument(
    err,
    skip(transport, token_url, method, credentials, settings, now),
    fields(
        token_url = %token_url,
        method = ?method,
        credentials.grant_type = GRANT_TYPE,
        credentials.tenant_id = %credentials.tenant_id,
        credentials.client_id = %credentials.client_id,
        credentials.username = %credentials.username,
        resource = %settings.token_audience,
    ),
)]
pub(crate) async fn request_token(
    transport: &dyn TokenTransport,
    token_url: &Url,
    method: RequestMethod,
    credentials: &Credentials,
    settings: &Settings,
    now: UnixTime,
) -> Result<CachedToken, TokenProviderError> {
    tracing::trace!("requesting token from identity endpoint");

    let form = dto::PasswordGrantForm {
        resource: &settings.token_audience,
        client_id: &credentials.client_id,
        username: &credentials.username,
        password: &credentials.password,
        grant_type: GRANT_TYPE,
    };
    let request = TokenRequest::form(method, token_url.clone(), &form)?;

    let resp = transport
        .send(request)
        .await
        .map_err(TokenProviderError::Transport)?;

    tracing::debug!(
        response.status = resp.status.as_u16(),
        "received token response from identity endpoint"
    );

    if resp.status != StatusCode::OK {
        tracing::debug!(
            body = %String::from_utf8_lossy(&resp.body),
            "identity endpoint rejected credentials"
        );
        return Err(TokenProviderError::AuthenticationFailure {
            status: resp.status,
        });
    }

    let body: dto::TokenResponse = serde_json::from_slice(&resp.body)?;
    let token = CachedToken::new(body.access_token, body.token_type, body.expires_on, now);

    tracing::info!(
        token_type = %token.token_type(),
        expires_on = token.expires_on().0,
        lifetime = token.expires_on().saturating_duration_since(now).as_secs(),
        "received new token"
    );

    Ok(token)
}
