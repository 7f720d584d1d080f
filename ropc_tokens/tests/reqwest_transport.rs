use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ropc_tokens::{Settings, TlsConfig, TokenProvider, TokenProviderError};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPECTED_BODY: &str = "resource=https%3A%2F%2Fvault.azure.net\
    &client_id=my-client\
    &username=alice%40contoso.com\
    &password=a%26b%25c\
    &grant_type=password";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn provider(server: &MockServer) -> TokenProvider {
    TokenProvider::builder()
        .tenant_id("tenant-1")
        .client_id("my-client")
        .username("alice@contoso.com")
        .password("a&b%c")
        .settings(Settings::new(
            format!("{}/", server.uri()),
            "https://vault.azure.net",
        ))
        .tls_config(TlsConfig::default().with_timeout(Duration::from_secs(5)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn acquires_token_with_form_body_over_get() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tenant-1/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(EXPECTED_BODY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_on": (now() + 3600).to_string(),
            "access_token": "T1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server);

    assert_eq!(provider.authentication_header().await.unwrap(), "Bearer T1");
    assert_eq!(provider.authentication_header().await.unwrap(), "Bearer T1");
}

#[tokio::test]
async fn post_is_used_when_requested() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_on": now() + 3600,
            "access_token": "T1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = TokenProvider::builder()
        .tenant_id("tenant-1")
        .client_id("my-client")
        .username("alice@contoso.com")
        .password("a&b%c")
        .settings(Settings::new(server.uri(), "https://vault.azure.net"))
        .using_post()
        .build()
        .unwrap();

    assert_eq!(provider.authentication_header().await.unwrap(), "Bearer T1");
}

#[tokio::test]
async fn rejected_credentials_surface_as_authentication_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tenant-1/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "AADSTS50126: Invalid username or password.",
        })))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server);

    for _ in 0..2 {
        let err = provider.authentication_header().await.unwrap_err();
        assert!(matches!(
            err,
            TokenProviderError::AuthenticationFailure { .. }
        ));
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let provider = TokenProvider::builder()
        .tenant_id("tenant-1")
        .client_id("my-client")
        .username("alice@contoso.com")
        .password("a&b%c")
        .settings(Settings::new("http://127.0.0.1:1/", "https://vault.azure.net"))
        .build()
        .unwrap();

    let err = provider.authentication_header().await.unwrap_err();
    assert!(matches!(err, TokenProviderError::Transport(_)));
}
