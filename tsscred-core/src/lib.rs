//! # tsscred Core
//!
//! Credential resolution for Delinea (Thycotic) Secret Server.
//!
//! At job launch the host platform hands over the stored credential fields
//! (base URL, username, password, optional domain). This crate exchanges
//! them for a short-lived OAuth2 bearer token and returns the token and
//! base URL for injection into the job, without ever exposing the password.
//!
//! This crate provides:
//! - [`TokenResolver`] - The OAuth2 password-grant exchange
//! - [`CredentialParameters`] and [`ResolutionResult`] - Input and output records
//! - [`plugin`] - The static registration record, input schema and injectors
//! - [`Secret`] - A redacting, zeroizing wrapper for passwords and tokens
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tsscred_core::{CredentialParameters, ResolverConfig, TokenResolver};
//!
//! async fn launch() -> Result<(), tsscred_core::ResolveError> {
//!     let resolver = TokenResolver::new(ResolverConfig::default())?;
//!     let params = CredentialParameters::new("https://s.example.com/SecretServer", "appuser", "s3cret");
//!     let result = resolver.resolve(params).await?;
//!     let injected = tsscred_core::plugin::INJECTORS.render(&result.values())?;
//!     assert!(injected.env.contains_key("TSS_TOKEN"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod plugin;
pub mod resolver;
pub mod secret;

// Re-export commonly used types at crate root
pub use config::ResolverConfig;

pub use error::ResolveError;

pub use model::{
    CredentialParameters,
    ResolutionResult,
    TokenRequest,
};

pub use plugin::{
    CredentialPlugin,
    InjectedValues,
    DELINEA_SECRET_SERVER,
};

pub use resolver::{
    TokenResolver,
    TOKEN_ENDPOINT,
    parse_token_response,
    token_endpoint,
};

pub use secret::Secret;
