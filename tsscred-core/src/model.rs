//! Domain model types for credential resolution.
//!
//! This module defines:
//! - [`CredentialParameters`] - The stored credential fields supplied by the host
//! - [`TokenRequest`] - The password-grant form body derived from them
//! - [`ResolutionResult`] - The token and base URL handed back to the host

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::ResolveError;
use crate::secret::Secret;

/// Input field id for the Secret Server base URL.
pub const FIELD_BASE_URL: &str = "base_url";
/// Input field id for the application user name.
pub const FIELD_USERNAME: &str = "username";
/// Input field id for the application user domain.
pub const FIELD_DOMAIN: &str = "domain";
/// Input field id for the application user password.
pub const FIELD_PASSWORD: &str = "password";

/// Metadata field id carrying the resolved token.
pub const METADATA_TOKEN: &str = "tss_token";
/// Metadata field id carrying the base URL.
pub const METADATA_BASE_URL: &str = "tss_base_url";

/// OAuth2 grant type sent to the token endpoint.
pub const GRANT_TYPE_PASSWORD: &str = "password";

/// Credential fields stored by the host platform for one credential.
///
/// The domain is an `Option` so that "not supplied" never turns into an
/// empty `domain=` form field.
#[derive(Clone)]
pub struct CredentialParameters {
    /// Base URL of Secret Server, e.g. `https://myserver/SecretServer`.
    pub base_url: String,

    /// Application user name.
    pub username: String,

    /// Application user password.
    pub password: Secret,

    /// Application user domain, if any.
    pub domain: Option<String>,
}

impl CredentialParameters {
    /// Create parameters without a domain.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<Secret>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            domain: None,
        }
    }

    /// Set the domain. An empty domain is treated as absent.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.domain = if domain.is_empty() { None } else { Some(domain) };
        self
    }

    /// Build parameters from the host's flat field map.
    ///
    /// Required fields must be present and non-empty; `domain` is optional
    /// and an empty value is dropped.
    pub fn from_inputs(inputs: &HashMap<String, String>) -> Result<Self, ResolveError> {
        let required = |field: &'static str| -> Result<String, ResolveError> {
            inputs
                .get(field)
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or(ResolveError::InvalidParameters { field })
        };

        let params = Self {
            base_url: required(FIELD_BASE_URL)?,
            username: required(FIELD_USERNAME)?,
            password: Secret::new(required(FIELD_PASSWORD)?),
            domain: inputs
                .get(FIELD_DOMAIN)
                .filter(|value| !value.is_empty())
                .cloned(),
        };

        Ok(params)
    }

    /// Check that the required fields are non-empty.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.base_url.trim().is_empty() {
            return Err(ResolveError::InvalidParameters {
                field: FIELD_BASE_URL,
            });
        }
        if self.username.is_empty() {
            return Err(ResolveError::InvalidParameters {
                field: FIELD_USERNAME,
            });
        }
        if self.password.is_empty() {
            return Err(ResolveError::InvalidParameters {
                field: FIELD_PASSWORD,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for CredentialParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialParameters")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("domain", &self.domain.as_ref().map(|_| "[SET]"))
            .finish()
    }
}

/// OAuth2 password-grant form body.
///
/// Borrowed from [`CredentialParameters`] for the duration of one request.
pub struct TokenRequest<'a> {
    grant_type: &'static str,
    username: &'a str,
    password: &'a str,
    domain: Option<&'a str>,
}

impl<'a> TokenRequest<'a> {
    /// Derive the form body from credential parameters.
    pub fn from_parameters(params: &'a CredentialParameters) -> Self {
        Self {
            grant_type: GRANT_TYPE_PASSWORD,
            username: &params.username,
            password: params.password.expose(),
            domain: params.domain.as_deref().filter(|d| !d.is_empty()),
        }
    }

    /// Form fields in wire order.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("grant_type", self.grant_type),
            ("username", self.username),
            ("password", self.password),
        ];
        if let Some(domain) = self.domain {
            fields.push(("domain", domain));
        }
        fields
    }

    /// Encode the body as `application/x-www-form-urlencoded`.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form_fields())
            .finish()
    }
}

impl fmt::Debug for TokenRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("domain", &self.domain.map(|_| "[SET]"))
            .finish()
    }
}

/// Token and base URL produced by one resolution.
///
/// Never contains the password or the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// The bearer token issued by Secret Server.
    pub token: Secret,

    /// The base URL exactly as supplied by the caller.
    pub base_url: String,
}

impl ResolutionResult {
    /// Values keyed by metadata field id, as consumed by the injectors.
    pub fn values(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (METADATA_TOKEN.to_string(), self.token.expose().to_string()),
            (METADATA_BASE_URL.to_string(), self.base_url.clone()),
        ])
    }

    /// Consume the result into the metadata value map.
    pub fn into_values(self) -> BTreeMap<String, String> {
        self.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_inputs_with_domain() {
        let params = CredentialParameters::from_inputs(&inputs(&[
            ("base_url", "https://s.example.com/SecretServer"),
            ("username", "appuser"),
            ("password", "s3cret"),
            ("domain", "CORP"),
        ]))
        .unwrap();

        assert_eq!(params.base_url, "https://s.example.com/SecretServer");
        assert_eq!(params.username, "appuser");
        assert_eq!(params.password.expose(), "s3cret");
        assert_eq!(params.domain.as_deref(), Some("CORP"));
    }

    #[test]
    fn test_from_inputs_empty_domain_is_absent() {
        let params = CredentialParameters::from_inputs(&inputs(&[
            ("base_url", "https://s.example.com"),
            ("username", "appuser"),
            ("password", "s3cret"),
            ("domain", ""),
        ]))
        .unwrap();

        assert!(params.domain.is_none());
    }

    #[test]
    fn test_from_inputs_missing_password() {
        let result = CredentialParameters::from_inputs(&inputs(&[
            ("base_url", "https://s.example.com"),
            ("username", "appuser"),
        ]));

        assert!(matches!(
            result,
            Err(ResolveError::InvalidParameters { field: "password" })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_username() {
        let params = CredentialParameters::new("https://s.example.com", "", "s3cret");
        assert!(matches!(
            params.validate(),
            Err(ResolveError::InvalidParameters { field: "username" })
        ));
    }

    #[test]
    fn test_debug_hides_password_and_domain() {
        let params = CredentialParameters::new("https://s.example.com", "appuser", "s3cret")
            .with_domain("CORP");
        let debug = format!("{:?}", params);
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("CORP"));

        let request = TokenRequest::from_parameters(&params);
        assert!(!format!("{:?}", request).contains("s3cret"));
    }

    #[test]
    fn test_request_without_domain_has_no_domain_key() {
        let params = CredentialParameters::new("https://s.example.com", "appuser", "s3cret");
        let body = TokenRequest::from_parameters(&params).encode();

        assert_eq!(body, "grant_type=password&username=appuser&password=s3cret");
        assert!(!body.contains("domain"));
    }

    #[test]
    fn test_request_with_domain() {
        let params = CredentialParameters::new("https://s.example.com", "appuser", "s3cret")
            .with_domain("CORP");
        let body = TokenRequest::from_parameters(&params).encode();

        assert!(body.contains("grant_type=password"));
        assert!(body.contains("username=appuser"));
        assert!(body.ends_with("&domain=CORP"));
    }

    #[test]
    fn test_with_empty_domain_is_absent() {
        let params = CredentialParameters::new("https://s.example.com", "appuser", "s3cret")
            .with_domain("");
        assert!(params.domain.is_none());
    }

    #[test]
    fn test_request_encodes_reserved_characters() {
        let params = CredentialParameters::new("https://s.example.com", "app user", "p&ss=1");
        let body = TokenRequest::from_parameters(&params).encode();
        assert_eq!(body, "grant_type=password&username=app+user&password=p%26ss%3D1");
    }

    #[test]
    fn test_result_values() {
        let result = ResolutionResult {
            token: Secret::new("abc123"),
            base_url: "https://s.example.com/SecretServer".to_string(),
        };
        let values = result.into_values();
        assert_eq!(values.get("tss_token").map(String::as_str), Some("abc123"));
        assert_eq!(
            values.get("tss_base_url").map(String::as_str),
            Some("https://s.example.com/SecretServer")
        );
        assert_eq!(values.len(), 2);
    }
}
