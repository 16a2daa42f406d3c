//! Error taxonomy for token resolution.

use thiserror::Error;

/// Maximum number of bytes of a rejected response body kept for diagnostics.
pub(crate) const MAX_DIAGNOSTIC_BODY: usize = 512;

/// Error type for every failure `resolve` can produce.
///
/// No variant ever carries the password or the access token.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The token endpoint answered with a non-2xx status.
    #[error("Secret Server rejected the token request with HTTP {status}: {body}")]
    RemoteAuth { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("Secret Server token response is not valid JSON: {message}")]
    MalformedResponse { message: String },

    /// The JSON response has no `access_token` field.
    #[error(
        "Secret Server token response did not contain 'access_token'. Response keys: {keys:?}"
    )]
    MissingToken { keys: Vec<String> },

    /// `access_token` is present but is not a string.
    #[error("Secret Server token response 'access_token' must be a string, got {found}")]
    InvalidTokenType { found: &'static str },

    /// The request did not complete within the configured timeout.
    #[error("timed out contacting Secret Server: {message}")]
    Timeout { message: String },

    /// The service could not be reached.
    #[error("could not connect to Secret Server: {message}")]
    Connection { message: String },

    /// A credential field is missing, empty, or malformed.
    #[error("invalid credential parameter: {field}")]
    InvalidParameters { field: &'static str },

    /// The resolver could not be configured.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// An injector template references a value the backend did not produce.
    #[error("injector template references unknown value '{placeholder}'")]
    Template { placeholder: String },
}

impl ResolveError {
    /// The resolution stage that failed, for host-side diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } => "network",
            Self::RemoteAuth { .. } => "http-status",
            Self::MalformedResponse { .. }
            | Self::MissingToken { .. }
            | Self::InvalidTokenType { .. } => "response-shape",
            Self::InvalidParameters { .. } => "parameters",
            Self::Configuration { .. } => "configuration",
            Self::Template { .. } => "injection",
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        // The URL may embed userinfo; keep it out of messages.
        let err = err.without_url();
        if err.is_timeout() {
            ResolveError::Timeout {
                message: err.to_string(),
            }
        } else {
            ResolveError::Connection {
                message: err.to_string(),
            }
        }
    }
}

/// Prepare a rejected response body for inclusion in an error message.
///
/// Any echo of `secret` is masked, whether raw, form-encoded (`+` or `%20`
/// for spaces) or JSON-escaped, and the result is truncated on a character
/// boundary.
pub(crate) fn diagnostic_body(body: &str, secret: &str) -> String {
    let mut scrubbed = body.trim().to_string();
    for variant in secret_variants(secret) {
        scrubbed = scrubbed.replace(&variant, "[REDACTED]");
    }

    if scrubbed.len() <= MAX_DIAGNOSTIC_BODY {
        return scrubbed;
    }

    let mut end = MAX_DIAGNOSTIC_BODY;
    while !scrubbed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &scrubbed[..end])
}

/// Encodings under which a server may echo the password back, longest first
/// so a shorter form never splits a longer one before it is masked.
fn secret_variants(secret: &str) -> Vec<String> {
    if secret.is_empty() {
        return Vec::new();
    }

    let form: String = url::form_urlencoded::byte_serialize(secret.as_bytes()).collect();
    let percent_space = form.replace('+', "%20");
    let json = serde_json::to_string(secret)
        .map(|quoted| quoted[1..quoted.len() - 1].to_string())
        .unwrap_or_default();

    let mut variants = vec![secret.to_string(), form, percent_space, json];
    variants.retain(|v| !v.is_empty());
    variants.sort_by(|a, b| b.len().cmp(&a.len()));
    variants.dedup();
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let err = ResolveError::RemoteAuth {
            status: 401,
            body: String::new(),
        };
        assert_eq!(err.stage(), "http-status");

        let err = ResolveError::MissingToken { keys: vec![] };
        assert_eq!(err.stage(), "response-shape");

        let err = ResolveError::Timeout {
            message: "deadline".to_string(),
        };
        assert_eq!(err.stage(), "network");
    }

    #[test]
    fn test_missing_token_message_lists_keys() {
        let err = ResolveError::MissingToken {
            keys: vec!["expires_in".to_string(), "token_type".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("access_token"));
        assert!(message.contains("token_type"));
        assert!(message.contains("expires_in"));
    }

    #[test]
    fn test_diagnostic_body_masks_secret() {
        let body = r#"{"error":"invalid_grant","password":"s3cret"}"#;
        let cleaned = diagnostic_body(body, "s3cret");
        assert!(!cleaned.contains("s3cret"));
        assert!(cleaned.contains("invalid_grant"));
    }

    #[test]
    fn test_diagnostic_body_masks_encoded_secret() {
        let body = "invalid_grant: grant_type=password&username=appuser&password=p%26ss%3D1";
        let cleaned = diagnostic_body(body, "p&ss=1");
        assert!(!cleaned.contains("p%26ss%3D1"));
        assert!(cleaned.contains("username=appuser"));

        let cleaned = diagnostic_body("password=a+b%21 or a%20b%21", "a b!");
        assert!(!cleaned.contains("a+b%21"));
        assert!(!cleaned.contains("a%20b%21"));

        let cleaned = diagnostic_body(r#"{"password":"q\"x"}"#, r#"q"x"#);
        assert!(!cleaned.contains(r#"q\"x"#));
        assert!(cleaned.contains("[REDACTED]"));
    }

    #[test]
    fn test_diagnostic_body_truncates_on_char_boundary() {
        let body = "é".repeat(MAX_DIAGNOSTIC_BODY);
        let cleaned = diagnostic_body(&body, "");
        assert!(cleaned.ends_with("..."));
        assert!(cleaned.len() <= MAX_DIAGNOSTIC_BODY + 3);
    }
}
