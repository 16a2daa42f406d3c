//! Library half of the `tsscred` binary.
//!
//! Split out so the parameter merging and output rendering can be tested
//! without spawning the binary.

pub mod config;
pub mod output;

use anyhow::{Result, anyhow};
use tsscred_core::{CredentialParameters, Secret};

use crate::config::CliConfig;

/// Environment variable holding the password.
pub const PASSWORD_ENV: &str = "TSS_PASSWORD";

/// Credential fields given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ParameterOverrides {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub domain: Option<String>,
}

/// Merge overrides with config file defaults into resolver parameters.
///
/// Overrides win over the config file. An empty domain counts as unset.
pub fn build_parameters(
    overrides: ParameterOverrides,
    config: &CliConfig,
    password: Secret,
) -> Result<CredentialParameters> {
    let base_url = overrides
        .base_url
        .or_else(|| config.base_url.clone())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("missing base URL (use --base-url, TSS_BASE_URL or base_url in the config file)"))?;

    let username = overrides
        .username
        .or_else(|| config.username.clone())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("missing username (use --username, TSS_USERNAME or username in the config file)"))?;

    if password.is_empty() {
        return Err(anyhow!(
            "missing password (set {} or pass --password-stdin)",
            PASSWORD_ENV
        ));
    }

    let mut params = CredentialParameters::new(base_url, username, password);
    if let Some(domain) = overrides.domain.or_else(|| config.domain.clone()) {
        params = params.with_domain(domain);
    }

    Ok(params)
}

/// Read the password from the first line of `reader`.
pub fn read_password(reader: &mut impl std::io::BufRead) -> Result<Secret> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    Ok(Secret::new(password))
}
