//! `Authorization: Basic ...` parsing and shared-secret comparison.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use subtle::ConstantTimeEq as _;
use thiserror::Error;
use zeroize::Zeroizing;

const BASIC_SCHEME: &str = "Basic";

/// Standard alphabet; padding is optional on decode (browsers always pad, some CLIs don't).
const CREDENTIALS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Credentials carried by a well-formed Basic `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Why a header value was not usable.
///
/// Only unit tests look at the variant. The gate maps every one of these to the same `401`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("authorization scheme is not Basic")]
    NotBasic,
    #[error("credentials payload is not valid base64")]
    Base64,
    #[error("credentials payload is not valid UTF-8")]
    Utf8,
    #[error("credentials payload has no ':' delimiter")]
    MissingDelimiter,
}

/// Parse the value of an `Authorization` header as HTTP Basic credentials.
///
/// The value must be exactly `Basic` + one space + base64. The decoded text is split on the
/// first `:` only, so the password keeps any further colons.
pub fn parse_basic_authorization(value: &str) -> Result<BasicCredentials, CredentialsError> {
    let (scheme, payload) = value.split_once(' ').ok_or(CredentialsError::NotBasic)?;
    if scheme != BASIC_SCHEME {
        return Err(CredentialsError::NotBasic);
    }

    let decoded = Zeroizing::new(
        CREDENTIALS_ENGINE
            .decode(payload)
            .map_err(|_| CredentialsError::Base64)?,
    );
    let text = std::str::from_utf8(&decoded).map_err(|_| CredentialsError::Utf8)?;
    let (username, password) = text
        .split_once(':')
        .ok_or(CredentialsError::MissingDelimiter)?;

    Ok(BasicCredentials {
        username: username.to_string(),
        password: Zeroizing::new(password.to_string()),
    })
}

/// The single shared password guarding the site.
///
/// Injected once at startup. Wiped on drop and never printed.
#[derive(Clone)]
pub struct SharedSecret {
    value: Zeroizing<String>,
}

impl SharedSecret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Zeroizing::new(value.into()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Exact equality, evaluated without an early exit on the first differing byte.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.value.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn basic(raw: &str) -> String {
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }

    #[test]
    fn parses_username_and_password() {
        let creds = parse_basic_authorization(&basic("alice:betrayal")).expect("parse");
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password.as_str(), "betrayal");
    }

    #[test]
    fn only_first_colon_delimits() {
        let creds = parse_basic_authorization(&basic("user:pass:word")).expect("parse");
        assert_eq!(creds.username, "user");
        assert_eq!(creds.password.as_str(), "pass:word");
    }

    #[test]
    fn empty_username_and_password_are_allowed() {
        let creds = parse_basic_authorization(&basic(":")).expect("parse");
        assert_eq!(creds.username, "");
        assert_eq!(creds.password.as_str(), "");
    }

    #[test]
    fn unpadded_payload_is_accepted() {
        // "x:betrayal" encodes with trailing '=' padding.
        let padded = base64::engine::general_purpose::STANDARD.encode("x:betrayal");
        assert!(padded.ends_with('='));
        let unpadded = padded.trim_end_matches('=');
        let creds = parse_basic_authorization(&format!("Basic {unpadded}")).expect("parse");
        assert_eq!(creds.password.as_str(), "betrayal");
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            parse_basic_authorization("Bearer abc.def.ghi"),
            Err(CredentialsError::NotBasic)
        );
        assert_eq!(
            parse_basic_authorization("basic eDpiZXRyYXlhbA=="),
            Err(CredentialsError::NotBasic)
        );
        assert_eq!(
            parse_basic_authorization("Basic"),
            Err(CredentialsError::NotBasic)
        );
    }

    #[test]
    fn rejects_malformed_base64() {
        assert_eq!(
            parse_basic_authorization("Basic !!!notbase64!!!"),
            Err(CredentialsError::Base64)
        );
        assert_eq!(
            parse_basic_authorization("Basic  eDpiZXRyYXlhbA=="),
            Err(CredentialsError::Base64)
        );
    }

    #[test]
    fn rejects_payload_without_colon() {
        assert_eq!(
            parse_basic_authorization(&basic("betrayal")),
            Err(CredentialsError::MissingDelimiter)
        );
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let raw = base64::engine::general_purpose::STANDARD.encode([0xff, b':', 0xfe]);
        assert_eq!(
            parse_basic_authorization(&format!("Basic {raw}")),
            Err(CredentialsError::Utf8)
        );
    }

    #[test]
    fn secret_matching_is_exact() {
        let secret = SharedSecret::new("betrayal");
        assert!(secret.matches("betrayal"));
        assert!(!secret.matches("Betrayal"));
        assert!(!secret.matches("betrayal "));
        assert!(!secret.matches("betray"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let secret = SharedSecret::new("betrayal");
        assert!(!format!("{secret:?}").contains("betrayal"));

        let creds = parse_basic_authorization(&basic("alice:betrayal")).expect("parse");
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("alice"));
        assert!(!dbg.contains("betrayal"));
    }
}
