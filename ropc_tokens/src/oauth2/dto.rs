//! DTOs for the password grant exchange

use std::fmt;

use ropc_clock::UnixTime;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{AccessToken, ClientIdRef, PasswordRef, TokenType, UsernameRef};

/// The form body of a resource owner password credentials request
///
/// Fields serialize in wire order.
#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrantForm<'a> {
    pub resource: &'a str,
    pub client_id: &'a ClientIdRef,
    pub username: &'a UsernameRef,
    pub password: &'a PasswordRef,
    pub grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(deserialize_with = "non_empty")]
    pub access_token: AccessToken,
    #[serde(deserialize_with = "non_empty")]
    pub token_type: TokenType,
    #[serde(deserialize_with = "epoch_seconds")]
    pub expires_on: UnixTime,
}

fn non_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Err(de::Error::invalid_value(
            de::Unexpected::Str(""),
            &"a non-empty string",
        ));
    }
    Ok(T::from(value))
}

/// Accepts `expires_on` as either a JSON integer or a string of digits
fn epoch_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UnixTime, D::Error> {
    struct EpochSeconds;

    impl<'de> de::Visitor<'de> for EpochSeconds {
        type Value = UnixTime;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("seconds since the Unix epoch")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(UnixTime(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v)
                .map(UnixTime)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.trim()
                .parse::<u64>()
                .map(UnixTime)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(EpochSeconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_on_as_number() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token":"T1","token_type":"Bearer","expires_on":1700000000}"#,
        )
        .unwrap();
        assert_eq!(resp.expires_on, UnixTime(1_700_000_000));
        assert_eq!(resp.access_token.as_str(), "T1");
        assert_eq!(resp.token_type.as_str(), "Bearer");
    }

    #[test]
    fn expires_on_as_string() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token":"T1","token_type":"Bearer","expires_on":"1700000000"}"#,
        )
        .unwrap();
        assert_eq!(resp.expires_on, UnixTime(1_700_000_000));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{
                "token_type":"Bearer",
                "scope":"user_impersonation",
                "expires_in":"3599",
                "expires_on":"1700000000",
                "resource":"https://management.core.windows.net/",
                "access_token":"T1",
                "refresh_token":"R1"
            }"#,
        )
        .unwrap();
        assert_eq!(resp.access_token.as_str(), "T1");
    }

    #[test]
    fn non_numeric_expires_on_is_rejected() {
        let res = serde_json::from_str::<TokenResponse>(
            r#"{"access_token":"T1","token_type":"Bearer","expires_on":"soon"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn negative_or_fractional_expires_on_is_rejected() {
        for expires_on in ["-5", "1700000000.5"] {
            let body = format!(
                r#"{{"access_token":"T1","token_type":"Bearer","expires_on":{}}}"#,
                expires_on
            );
            assert!(serde_json::from_str::<TokenResponse>(&body).is_err());
        }
    }

    #[test]
    fn empty_token_fields_are_rejected() {
        for body in [
            r#"{"access_token":"","token_type":"Bearer","expires_on":1700000000}"#,
            r#"{"access_token":"T1","token_type":"","expires_on":1700000000}"#,
        ] {
            assert!(serde_json::from_str::<TokenResponse>(body).is_err());
        }
    }

    #[test]
    fn missing_token_type_or_expiry_is_rejected() {
        for body in [
            r#"{"access_token":"T1","expires_on":1700000000}"#,
            r#"{"access_token":"T1","token_type":"Bearer"}"#,
        ] {
            assert!(serde_json::from_str::<TokenResponse>(body).is_err());
        }
    }

    #[test]
    fn missing_access_token_is_rejected() {
        let res = serde_json::from_str::<TokenResponse>(
            r#"{"token_type":"Bearer","expires_on":1700000000}"#,
        );
        assert!(res.is_err());
    }
}
