use std::sync::Arc;

use reqwest::{header::HeaderValue, Url};
use ropc_clock::{Clock, System};
use tokio::sync::Mutex;

use crate::{
    oauth2,
    tokens::CachedToken,
    transport::{ReqwestTransport, RequestMethod, TlsConfig, TokenTransport},
    ClientId, Password, Settings, TenantId, TokenLifetimeConfig, TokenProviderError, Username,
};

/// The resource owner's credentials
#[derive(Clone, Debug)]
pub(crate) struct Credentials {
    /// The directory tenant
    pub tenant_id: TenantId,

    /// The client the token is issued to
    pub client_id: ClientId,

    /// The resource owner's username
    pub username: Username,

    /// The resource owner's password
    pub password: Password,
}

/// Supplies `Authorization` header values backed by a cached password-grant token
///
/// The first call acquires a token. Later calls reuse it until the
/// [`TokenLifetimeConfig`] judges it expired, at which point exactly one
/// caller re-acquires it while the others wait for the result.
#[derive(Debug)]
pub struct TokenProvider<C = System> {
    credentials: Credentials,
    settings: Arc<Settings>,
    token_url: Url,
    transport: Arc<dyn TokenTransport>,
    method: RequestMethod,
    lifetime_config: TokenLifetimeConfig<C>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Constructs a provider using the default `reqwest` transport
    ///
    /// Fails if any credential is empty or the settings are unusable.
    /// No request is made until a header is requested.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        settings: impl Into<Arc<Settings>>,
    ) -> Result<Self, TokenProviderError> {
        Self::builder()
            .tenant_id(tenant_id)
            .client_id(client_id)
            .username(username)
            .password(password)
            .settings(settings)
            .build()
    }

    /// Starts building a provider
    pub fn builder() -> TokenProviderBuilder {
        TokenProviderBuilder::default()
    }
}

impl<C: Clock> TokenProvider<C> {
    /// Returns `"<token_type> <access_token>"`, acquiring a token first if needed
    ///
    /// A failed acquisition leaves the previously cached token in place.
    pub async fn authentication_header(&self) -> Result<String, TokenProviderError> {
        let mut cached = self.cached.lock().await;
        let now = self.lifetime_config.now();

        if let Some(token) = cached
            .as_ref()
            .filter(|t| !self.lifetime_config.is_token_expired_at(Some(*t), now))
        {
            if tracing::enabled!(tracing::Level::TRACE) {
                tracing::trace!(
                    token.status = ?token
                        .token_status_at(now, self.lifetime_config.expiration_threshold()),
                    token.acquired = token.acquired().0,
                    token.expires_on = token.expires_on().0,
                    rule = ?self.lifetime_config.expiry_rule(),
                    "using cached token"
                );
            }
            return Ok(token.authorization());
        }

        tracing::debug!(has_token = cached.is_some(), "cached token expired, acquiring");
        let token = self.acquire_token().await.map_err(|error| {
            tracing::warn!(
                error = (&error as &dyn std::error::Error),
                "unable to acquire token"
            );
            error
        })?;

        Ok(cached.insert(token).authorization())
    }

    /// The current header value, marked sensitive
    pub async fn header_value(&self) -> Result<HeaderValue, TokenProviderError> {
        let mut value = HeaderValue::try_from(self.authentication_header().await?)?;
        value.set_sensitive(true);
        Ok(value)
    }

    async fn acquire_token(&self) -> Result<CachedToken, TokenProviderError> {
        oauth2::request_token(
            &*self.transport,
            &self.token_url,
            self.method,
            &self.credentials,
            &self.settings,
            self.lifetime_config.now(),
        )
        .await
    }
}

/// Builder for a [`TokenProvider`]
#[derive(Debug)]
pub struct TokenProviderBuilder<C = System> {
    tenant_id: Option<String>,
    client_id: Option<String>,
    username: Option<String>,
    password: Option<Password>,
    settings: Option<Arc<Settings>>,
    transport: Option<Arc<dyn TokenTransport>>,
    tls_config: TlsConfig,
    method: RequestMethod,
    lifetime_config: TokenLifetimeConfig<C>,
}

impl Default for TokenProviderBuilder {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            username: None,
            password: None,
            settings: None,
            transport: None,
            tls_config: TlsConfig::default(),
            method: RequestMethod::default(),
            lifetime_config: TokenLifetimeConfig::default(),
        }
    }
}

impl<C> TokenProviderBuilder<C> {
    /// Sets the directory tenant
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the client ID
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the resource owner's username
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the resource owner's password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Password::new(password.into()));
        self
    }

    /// Sets the identity endpoint settings
    pub fn settings(mut self, settings: impl Into<Arc<Settings>>) -> Self {
        self.settings = Some(settings.into());
        self
    }

    /// Uses a custom transport instead of a `reqwest` client built from the TLS config
    pub fn transport(mut self, transport: impl TokenTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the TLS options used to build the default transport
    pub fn tls_config(mut self, tls_config: TlsConfig) -> Self {
        self.tls_config = tls_config;
        self
    }

    /// Sends token requests with `POST` instead of `GET`
    pub fn using_post(mut self) -> Self {
        self.method = RequestMethod::Post;
        self
    }

    /// Sets when cached tokens are considered expired
    pub fn lifetime_config<D>(
        self,
        lifetime_config: TokenLifetimeConfig<D>,
    ) -> TokenProviderBuilder<D> {
        TokenProviderBuilder {
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            username: self.username,
            password: self.password,
            settings: self.settings,
            transport: self.transport,
            tls_config: self.tls_config,
            method: self.method,
            lifetime_config,
        }
    }

    /// Validates the configuration and constructs the provider
    pub fn build(self) -> Result<TokenProvider<C>, TokenProviderError> {
        let credentials = Credentials {
            tenant_id: TenantId::new(required(self.tenant_id, "tenant_id")?),
            client_id: ClientId::new(required(self.client_id, "client_id")?),
            username: Username::new(required(self.username, "username")?),
            password: match self.password {
                None => return Err(TokenProviderError::missing("password")),
                Some(p) if p.as_str().is_empty() => {
                    return Err(TokenProviderError::invalid("password", "must not be empty"))
                }
                Some(p) => p,
            },
        };

        let settings = self
            .settings
            .ok_or_else(|| TokenProviderError::missing("settings"))?;
        settings.validate()?;
        let token_url = settings.token_url(&credentials.tenant_id)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_tls_config(&self.tls_config)?),
        };

        tracing::debug!(
            token_url = %token_url,
            method = ?self.method,
            threshold_secs = self.lifetime_config.expiration_threshold().as_secs(),
            rule = ?self.lifetime_config.expiry_rule(),
            "configured token provider"
        );

        Ok(TokenProvider {
            credentials,
            settings,
            token_url,
            transport,
            method: self.method,
            lifetime_config: self.lifetime_config,
            cached: Mutex::new(None),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, TokenProviderError> {
    match value {
        None => Err(TokenProviderError::missing(field)),
        Some(v) if v.is_empty() => Err(TokenProviderError::invalid(field, "must not be empty")),
        Some(v) => Ok(v),
    }
}
