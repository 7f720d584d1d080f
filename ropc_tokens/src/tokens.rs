use std::time::Duration;

use ropc_clock::{Clock, System, UnixTime};

use super::{AccessToken, TokenType, TokenTypeRef};

/// The default safety margin applied around a token's expiry
pub const DEFAULT_EXPIRATION_THRESHOLD: Duration = Duration::from_secs(300);

/// A token as returned by the identity endpoint
///
/// The token, its scheme and its expiry only ever change together: the
/// provider replaces the whole value after a successful acquisition.
#[derive(Debug)]
pub(crate) struct CachedToken {
    access_token: AccessToken,
    token_type: TokenType,
    expires_on: UnixTime,
    acquired: UnixTime,
}

/// A token's lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenStatus {
    /// The token is valid and outside the threshold window
    Fresh,
    /// The token is valid, but within the threshold window before expiry
    Stale,
    /// The token is no longer valid according to its issuer
    Expired,
}

impl CachedToken {
    pub(crate) fn new(
        access_token: AccessToken,
        token_type: TokenType,
        expires_on: UnixTime,
        acquired: UnixTime,
    ) -> Self {
        Self {
            access_token,
            token_type,
            expires_on,
            acquired,
        }
    }

    #[inline]
    pub(crate) fn token_type(&self) -> &TokenTypeRef {
        &self.token_type
    }

    #[inline]
    pub(crate) fn expires_on(&self) -> UnixTime {
        self.expires_on
    }

    #[inline]
    pub(crate) fn acquired(&self) -> UnixTime {
        self.acquired
    }

    /// `"<token_type> <access_token>"`, suitable for an `Authorization` header
    pub(crate) fn authorization(&self) -> String {
        let token_type = self.token_type.as_str();
        let access_token = self.access_token.as_str();
        let mut value = String::with_capacity(token_type.len() + access_token.len() + 1);
        value.push_str(token_type);
        value.push(' ');
        value.push_str(access_token);
        value
    }

    pub(crate) fn token_status_at(&self, time: UnixTime, threshold: Duration) -> TokenStatus {
        if time >= self.expires_on {
            TokenStatus::Expired
        } else if time >= self.expires_on - threshold {
            TokenStatus::Stale
        } else {
            TokenStatus::Fresh
        }
    }
}

/// When a cached token must be re-acquired
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpiryRule {
    /// Re-acquire once `now >= expires_on - threshold`
    ///
    /// Callers never receive a token that expires within the threshold.
    #[default]
    RefreshEarly,
    /// Re-acquire once `now >= expires_on + threshold`
    ///
    /// Keeps handing out the cached token for `threshold` past its expiry.
    GraceAfterExpiry,
}

/// Configuration for deciding when a cached token is no longer usable
#[derive(Clone, Debug)]
pub struct TokenLifetimeConfig<C = System> {
    expiration_threshold: Duration,
    expiry_rule: ExpiryRule,
    clock: C,
}

impl Default for TokenLifetimeConfig {
    /// Default lifetime configuration
    ///
    /// Refreshes tokens 300 seconds before they expire, using the system clock.
    fn default() -> Self {
        Self {
            expiration_threshold: DEFAULT_EXPIRATION_THRESHOLD,
            expiry_rule: ExpiryRule::RefreshEarly,
            clock: System,
        }
    }
}

impl TokenLifetimeConfig {
    /// Constructs a new lifetime configuration using the system clock
    pub fn new(expiration_threshold: Duration, expiry_rule: ExpiryRule) -> Self {
        Self {
            expiration_threshold,
            expiry_rule,
            clock: System,
        }
    }
}

impl<C> TokenLifetimeConfig<C> {
    /// Sets a custom clock to be used
    ///
    /// Useful for testing purposes
    pub fn with_clock<D>(self, clock: D) -> TokenLifetimeConfig<D> {
        TokenLifetimeConfig {
            expiration_threshold: self.expiration_threshold,
            expiry_rule: self.expiry_rule,
            clock,
        }
    }

    /// The safety margin applied around a token's expiry
    #[inline]
    pub fn expiration_threshold(&self) -> Duration {
        self.expiration_threshold
    }

    /// The rule used to decide whether a token has expired
    #[inline]
    pub fn expiry_rule(&self) -> ExpiryRule {
        self.expiry_rule
    }

    fn refresh_at(&self, expires_on: UnixTime) -> UnixTime {
        match self.expiry_rule {
            ExpiryRule::RefreshEarly => expires_on - self.expiration_threshold,
            ExpiryRule::GraceAfterExpiry => expires_on + self.expiration_threshold,
        }
    }

    pub(crate) fn is_token_expired_at(
        &self,
        token: Option<&CachedToken>,
        time: UnixTime,
    ) -> bool {
        match token {
            None => true,
            Some(token) => time >= self.refresh_at(token.expires_on()),
        }
    }
}

impl<C: Clock> TokenLifetimeConfig<C> {
    /// The current time according to the configured clock
    #[inline]
    pub fn now(&self) -> UnixTime {
        self.clock.now()
    }
}
