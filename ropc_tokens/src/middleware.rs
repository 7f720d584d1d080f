//! Middleware to attach the provider's token to outgoing requests
//!
//! Include [`AuthenticationMiddleware`] in a
//! [`ClientWithMiddleware`](reqwest_middleware::ClientWithMiddleware) stack
//! and every request without an `Authorization` header gets one from the
//! shared [`TokenProvider`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ropc_tokens::{middleware::AuthenticationMiddleware, Settings, TokenProvider};
//! use reqwest_middleware::ClientBuilder;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(TokenProvider::new(
//!     "contoso.onmicrosoft.com",
//!     "04b07795-8ddb-461a-bbee-02f9e1bf7b46",
//!     "user@contoso.com",
//!     "hunter2",
//!     Settings::new(
//!         "https://login.microsoftonline.com/",
//!         "https://management.core.windows.net/",
//!     ),
//! )?);
//!
//! let client = ClientBuilder::new(reqwest::Client::new())
//!     .with(AuthenticationMiddleware::new(provider))
//!     .build();
//!
//! client
//!     .get("https://management.azure.com/subscriptions?api-version=2020-01-01")
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use ropc_clock::{Clock, System};

use crate::TokenProvider;

/// A middleware that injects the provider's authorization header into outgoing requests
///
/// A request that already carries an `Authorization` header is left untouched.
#[derive(Debug)]
pub struct AuthenticationMiddleware<C = System> {
    provider: Arc<TokenProvider<C>>,
}

impl<C> AuthenticationMiddleware<C> {
    /// Constructs a new middleware backed by a shared provider
    pub fn new(provider: Arc<TokenProvider<C>>) -> Self {
        Self { provider }
    }
}

impl<C> Clone for AuthenticationMiddleware<C> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

#[async_trait::async_trait]
impl<C> Middleware for AuthenticationMiddleware<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if !req.headers().contains_key(header::AUTHORIZATION) {
            let value = self
                .provider
                .header_value()
                .await
                .map_err(reqwest_middleware::Error::middleware)?;
            req.headers_mut().insert(header::AUTHORIZATION, value);
        }

        next.run(req, extensions).await
    }
}
