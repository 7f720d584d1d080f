//! Bearer tokens from an OAuth2 resource owner password credentials grant
//!
//! A [`TokenProvider`] exchanges a fixed tenant, client, username and
//! password for an access token at an identity endpoint, caches it, and
//! hands out `Authorization` header values. Callers only ever ask for the
//! current header; whether that requires a round trip to the identity
//! endpoint is decided by the provider's [`TokenLifetimeConfig`].
//!
//! ```no_run
//! use ropc_tokens::{Settings, TokenProvider};
//!
//! # async fn run() -> Result<(), ropc_tokens::TokenProviderError> {
//! let settings = Settings::new(
//!     "https://login.microsoftonline.com/",
//!     "https://management.core.windows.net/",
//! );
//!
//! let provider = TokenProvider::new(
//!     "contoso.onmicrosoft.com",
//!     "04b07795-8ddb-461a-bbee-02f9e1bf7b46",
//!     "user@contoso.com",
//!     "hunter2",
//!     settings,
//! )?;
//!
//! // The first call acquires a token; later calls reuse it until it expires.
//! let header = provider.authentication_header().await?;
//! assert!(header.starts_with("Bearer "));
//! # Ok(())
//! # }
//! ```
//!
//! # Token lifetime
//!
//! By default a cached token is re-acquired 300 seconds before the
//! `expires_on` reported by the identity endpoint. The threshold and the
//! direction it is applied in are configurable:
//!
//! ```
//! use std::time::Duration;
//! use ropc_tokens::{ExpiryRule, TokenLifetimeConfig};
//!
//! let lenient = TokenLifetimeConfig::new(Duration::from_secs(300), ExpiryRule::GraceAfterExpiry);
//! assert_eq!(lenient.expiry_rule(), ExpiryRule::GraceAfterExpiry);
//! ```
//!
//! Concurrent callers share a single acquisition: the cache is locked for
//! the whole check-then-acquire-then-store sequence.
//!
//! # Features
//!
//! * `middleware` (default): Provides [`middleware::AuthenticationMiddleware`] for
//!   `reqwest-middleware` client stacks.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
mod error;
#[cfg(feature = "middleware")]
#[cfg_attr(docsrs, doc(cfg(feature = "middleware")))]
pub mod middleware;
mod oauth2;
mod provider;
mod settings;
mod tokens;
pub mod transport;

pub use braids::*;
pub use error::TokenProviderError;
pub use provider::{TokenProvider, TokenProviderBuilder};
pub use settings::Settings;
pub use tokens::{ExpiryRule, TokenLifetimeConfig, DEFAULT_EXPIRATION_THRESHOLD};
pub use transport::{RequestMethod, TlsConfig};
