//! The HTTP seam between the provider and the identity endpoint

use std::{error, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Certificate, StatusCode, Url};

use crate::TokenProviderError;

/// A boxed error from a transport implementation
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// The content type of every token request
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The HTTP method used to carry the token request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestMethod {
    /// `GET` with a form-encoded body
    #[default]
    Get,
    /// `POST` with a form-encoded body
    Post,
}

impl From<RequestMethod> for reqwest::Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
        }
    }
}

/// A token request ready to be sent
pub struct TokenRequest {
    /// The HTTP method
    pub method: RequestMethod,
    /// The token endpoint
    pub url: Url,
    /// The value of the `content-type` header
    pub content_type: &'static str,
    /// The form-encoded request body
    pub body: String,
}

impl TokenRequest {
    /// Builds a request carrying `payload` as URL-encoded form data
    pub fn form<S: serde::Serialize>(
        method: RequestMethod,
        url: Url,
        payload: &S,
    ) -> Result<Self, serde_urlencoded::ser::Error> {
        Ok(Self {
            method,
            url,
            content_type: FORM_CONTENT_TYPE,
            body: serde_urlencoded::to_string(payload)?,
        })
    }
}

// The body carries the password.
impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// The identity endpoint's answer
#[derive(Clone, Debug)]
pub struct TransportResponse {
    /// The response status
    pub status: StatusCode,
    /// The full response body
    pub body: Bytes,
}

/// Something that can deliver a token request to the identity endpoint
#[async_trait]
pub trait TokenTransport: fmt::Debug + Send + Sync {
    /// Sends the request and reads the whole response
    async fn send(&self, request: TokenRequest) -> Result<TransportResponse, BoxError>;
}

#[async_trait]
impl<T: TokenTransport + ?Sized> TokenTransport for Arc<T> {
    async fn send(&self, request: TokenRequest) -> Result<TransportResponse, BoxError> {
        (**self).send(request).await
    }
}

/// TLS and connection options for the default transport
///
/// Passed explicitly when the provider is built rather than read from
/// process-wide state.
#[derive(Clone, Debug, Default)]
pub struct TlsConfig {
    root_certificates: Vec<Vec<u8>>,
    accept_invalid_certs: bool,
    https_only: bool,
    timeout: Option<Duration>,
}

impl TlsConfig {
    /// Trusts an additional PEM-encoded root certificate
    pub fn with_root_certificate_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root_certificates.push(pem.into());
        self
    }

    /// Disables certificate validation
    ///
    /// Only for development against identity endpoints with self-signed certificates.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Refuses to send credentials over plain HTTP
    pub fn https_only(mut self, https_only: bool) -> Self {
        self.https_only = https_only;
        self
    }

    /// Limits the total time of a token request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds a `reqwest` client configured with these options
    pub fn build_client(&self) -> Result<reqwest::Client, TokenProviderError> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .https_only(self.https_only);

        for pem in &self.root_certificates {
            let cert = Certificate::from_pem(pem)
                .map_err(|e| TokenProviderError::invalid("tls_config", e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| TokenProviderError::invalid("tls_config", e.to_string()))
    }
}

/// A transport backed by a [`reqwest::Client`]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Uses an existing client
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client from the given TLS options
    pub fn from_tls_config(config: &TlsConfig) -> Result<Self, TokenProviderError> {
        Ok(Self::new(config.build_client()?))
    }
}

#[async_trait]
impl TokenTransport for ReqwestTransport {
    async fn send(&self, request: TokenRequest) -> Result<TransportResponse, BoxError> {
        let resp = self
            .client
            .request(request.method.into(), request.url)
            .header(header::CONTENT_TYPE, request.content_type)
            .body(request.body)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        Ok(TransportResponse { status, body })
    }
}
