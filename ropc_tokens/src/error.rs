use reqwest::{header::InvalidHeaderValue, StatusCode};
use thiserror::Error;

use crate::transport::BoxError;

/// An error while constructing a [`TokenProvider`][crate::TokenProvider] or
/// obtaining a token from the identity endpoint
#[derive(Debug, Error)]
pub enum TokenProviderError {
    /// A required argument was absent or unusable
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument {
        /// The name of the offending argument
        field: &'static str,
        /// Why the argument was rejected
        reason: String,
    },
    /// The identity endpoint refused the credentials
    #[error("could not log in, verify tenant/client/username/password (status {status})")]
    AuthenticationFailure {
        /// The status code returned by the identity endpoint
        status: StatusCode,
    },
    /// The identity endpoint answered successfully, but the body was not a usable token
    #[error("malformed token response from identity endpoint")]
    MalformedResponse(#[from] serde_json::Error),
    /// The credentials could not be encoded into a request body
    #[error("unable to encode token request body")]
    RequestEncoding(#[from] serde_urlencoded::ser::Error),
    /// The token request could not be sent or its response could not be read
    #[error("error sending token request to identity endpoint")]
    Transport(#[source] BoxError),
    /// The token received cannot be carried in an HTTP header
    #[error("token cannot be used as a header value")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

impl TokenProviderError {
    pub(crate) fn missing(field: &'static str) -> Self {
        Self::InvalidArgument {
            field,
            reason: "must be provided".to_owned(),
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}
