//! Settings supplied by the host application

use reqwest::Url;
use serde::Deserialize;

use crate::{TenantIdRef, TokenProviderError};

/// Identity endpoint settings
///
/// The provider only reads these values. Any additional fields present in
/// a larger settings document are ignored when deserializing.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the identity endpoint, such as `https://login.microsoftonline.com/`
    pub authentication_endpoint: String,

    /// The resource the token is requested for
    pub token_audience: String,
}

impl Settings {
    /// Constructs new settings
    pub fn new(
        authentication_endpoint: impl Into<String>,
        token_audience: impl Into<String>,
    ) -> Self {
        Self {
            authentication_endpoint: authentication_endpoint.into(),
            token_audience: token_audience.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), TokenProviderError> {
        if self.authentication_endpoint.is_empty() {
            return Err(TokenProviderError::invalid(
                "authentication_endpoint",
                "must not be empty",
            ));
        }
        if self.token_audience.is_empty() {
            return Err(TokenProviderError::invalid(
                "token_audience",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Builds `{authentication_endpoint}{tenant_id}/oauth2/token`
    ///
    /// The tenant is appended as a path segment, so a trailing slash on the
    /// endpoint is optional and reserved characters in the tenant are escaped.
    pub(crate) fn token_url(&self, tenant_id: &TenantIdRef) -> Result<Url, TokenProviderError> {
        let mut url = Url::parse(&self.authentication_endpoint)
            .map_err(|e| TokenProviderError::invalid("authentication_endpoint", e.to_string()))?;

        url.path_segments_mut()
            .map_err(|()| {
                TokenProviderError::invalid(
                    "authentication_endpoint",
                    "cannot be used as a base URL",
                )
            })?
            .pop_if_empty()
            .push(tenant_id.as_str())
            .push("oauth2")
            .push("token");

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TenantId;

    fn tenant() -> TenantId {
        TenantId::from_static("contoso.onmicrosoft.com")
    }

    #[test]
    fn token_url_with_trailing_slash() {
        let settings = Settings::new("https://login.microsoftonline.com/", "https://vault");
        let url = settings.token_url(&tenant()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/token"
        );
    }

    #[test]
    fn token_url_without_trailing_slash() {
        let settings = Settings::new("https://login.microsoftonline.com", "https://vault");
        let url = settings.token_url(&tenant()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/token"
        );
    }

    #[test]
    fn token_url_keeps_endpoint_path() {
        let settings = Settings::new("https://login.example.com/adfs/", "https://vault");
        let url = settings.token_url(&tenant()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.example.com/adfs/contoso.onmicrosoft.com/oauth2/token"
        );
    }

    #[test]
    fn tenant_cannot_inject_path_segments() {
        let settings = Settings::new("https://login.example.com/", "https://vault");
        let url = settings
            .token_url(&TenantId::from_static("evil/../x"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.example.com/evil%2F..%2Fx/oauth2/token"
        );
    }

    #[test]
    fn unparseable_endpoint_is_rejected() {
        let settings = Settings::new("not a url", "https://vault");
        let err = settings.token_url(&tenant()).unwrap_err();
        assert!(matches!(
            err,
            TokenProviderError::InvalidArgument {
                field: "authentication_endpoint",
                ..
            }
        ));
    }

    #[test]
    fn non_base_endpoint_is_rejected() {
        let settings = Settings::new("mailto:admin@example.com", "https://vault");
        assert!(settings.token_url(&tenant()).is_err());
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(Settings::new("", "https://vault").validate().is_err());
        assert!(Settings::new("https://login.example.com/", "")
            .validate()
            .is_err());
        assert!(Settings::new("https://login.example.com/", "https://vault")
            .validate()
            .is_ok());
    }

    #[test]
    fn deserializes_from_a_larger_document() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "authentication_endpoint": "https://login.microsoftonline.com/",
                "token_audience": "https://management.core.windows.net/",
                "resource_manager": "https://management.azure.com/"
            }"#,
        )
        .unwrap();
        assert_eq!(
            settings,
            Settings::new(
                "https://login.microsoftonline.com/",
                "https://management.core.windows.net/"
            )
        );
    }
}
