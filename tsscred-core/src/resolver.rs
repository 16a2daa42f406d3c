//! OAuth2 password-grant token resolution against Secret Server.
//!
//! # Flow Overview
//!
//! 1. Normalise the base URL and append `/oauth2/token`
//! 2. Encode `grant_type=password`, `username`, `password` and the optional `domain`
//! 3. POST the form once, with no retry
//! 4. Reject non-2xx statuses, then require a string `access_token` in the JSON body
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), tsscred_core::ResolveError> {
//! use tsscred_core::{CredentialParameters, ResolverConfig, TokenResolver};
//!
//! let resolver = TokenResolver::new(ResolverConfig::default())?;
//! let params = CredentialParameters::new(
//!     "https://myserver/SecretServer",
//!     "appuser",
//!     "s3cret",
//! )
//! .with_domain("CORP");
//!
//! let result = resolver.resolve(params).await?;
//! println!("token issued for {}", result.base_url);
//! # Ok(())
//! # }
//! ```

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, diagnostic_body};
use crate::model::{CredentialParameters, FIELD_BASE_URL, ResolutionResult, TokenRequest};
use crate::secret::Secret;

/// Token endpoint path appended to the base URL.
pub const TOKEN_ENDPOINT: &str = "/oauth2/token";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Exchanges stored credentials for a Secret Server access token.
///
/// The resolver holds no per-call state. The underlying `reqwest::Client`
/// only shares its connection pool between concurrent calls.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    http_client: reqwest::Client,
}

impl TokenResolver {
    /// Create a resolver with an HTTP client built from `config`.
    ///
    /// A zero total or connect timeout is rejected, since reqwest would fail
    /// every request immediately.
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        if config.timeout.is_zero() {
            return Err(ResolveError::Configuration {
                message: "request timeout must be greater than zero".to_string(),
            });
        }
        if config.connect_timeout.is_zero() {
            return Err(ResolveError::Configuration {
                message: "connect timeout must be greater than zero".to_string(),
            });
        }

        if !config.verify_tls {
            tracing::warn!("TLS certificate verification is disabled for Secret Server requests");
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ResolveError::Configuration {
                message: format!("failed to build HTTP client: {}", e.without_url()),
            })?;

        Ok(Self { http_client })
    }

    /// Exchange `params` for an access token.
    ///
    /// Exactly one request is sent. The returned base URL is the caller's
    /// value, not the normalised one.
    pub async fn resolve(
        &self,
        params: CredentialParameters,
    ) -> Result<ResolutionResult, ResolveError> {
        params.validate()?;
        let endpoint = token_endpoint(&params.base_url)?;
        let request = TokenRequest::from_parameters(&params);

        tracing::debug!(
            "Requesting Secret Server token from {} for user {} (domain {})",
            endpoint,
            params.username,
            if params.domain.is_some() { "set" } else { "unset" }
        );

        let response = self
            .http_client
            .post(endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(request.encode())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                "Secret Server rejected token request for {} with HTTP {}",
                params.base_url,
                status.as_u16()
            );
            return Err(ResolveError::RemoteAuth {
                status: status.as_u16(),
                body: diagnostic_body(&body, params.password.expose()),
            });
        }

        let token = parse_token_response(&body)?;

        tracing::info!("Obtained Secret Server token for {}", params.base_url);

        Ok(ResolutionResult {
            token,
            base_url: params.base_url.clone(),
        })
    }
}

/// Build the token endpoint URL for a base URL.
///
/// Surrounding whitespace and trailing slashes are stripped first, so
/// `https://host/SecretServer` and ` https://host/SecretServer/ ` give the
/// same endpoint.
pub fn token_endpoint(base_url: &str) -> Result<Url, ResolveError> {
    let normalized = base_url.trim().trim_end_matches('/');
    if normalized.is_empty() {
        return Err(ResolveError::InvalidParameters {
            field: FIELD_BASE_URL,
        });
    }

    let url = Url::parse(&format!("{normalized}{TOKEN_ENDPOINT}")).map_err(|_| {
        ResolveError::InvalidParameters {
            field: FIELD_BASE_URL,
        }
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ResolveError::InvalidParameters {
            field: FIELD_BASE_URL,
        }),
    }
}

/// Extract the access token from a successful token response body.
pub fn parse_token_response(body: &str) -> Result<Secret, ResolveError> {
    let data: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ResolveError::MalformedResponse {
            message: e.to_string(),
        })?;

    let Some(object) = data.as_object() else {
        return Err(ResolveError::MissingToken { keys: Vec::new() });
    };

    match object.get("access_token") {
        Some(serde_json::Value::String(token)) => Ok(Secret::new(token.as_str())),
        Some(other) => Err(ResolveError::InvalidTokenType {
            found: json_type_name(other),
        }),
        None => {
            let mut keys: Vec<String> = object.keys().cloned().collect();
            keys.sort();
            Err(ResolveError::MissingToken { keys })
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
