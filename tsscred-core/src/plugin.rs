//! Credential plugin registration record.
//!
//! The host platform discovers the plugin through [`lookup`] with the fixed
//! entry point [`ENTRY_POINT`]. Everything here is static data except the
//! backend, which is a plain function pointer to the token resolver.
//!
//! # Example
//!
//! ```
//! use tsscred_core::plugin::{self, ENTRY_POINT};
//!
//! let plugin = plugin::lookup(ENTRY_POINT).unwrap();
//! assert_eq!(plugin.name, "Delinea Secret Server");
//! assert_eq!(plugin.inputs.required, &["base_url", "username", "password"]);
//! ```

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::model::{
    CredentialParameters, FIELD_BASE_URL, FIELD_DOMAIN, FIELD_PASSWORD, FIELD_USERNAME,
    METADATA_BASE_URL, METADATA_TOKEN, ResolutionResult,
};
use crate::resolver::TokenResolver;

/// Entry point name under which the host registers this plugin.
pub const ENTRY_POINT: &str = "delinea_secret_server";

/// Display name of the plugin.
pub const PLUGIN_NAME: &str = "Delinea Secret Server";

/// One field of the credential form or its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputField {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<&'static str>,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    #[serde(skip_serializing_if = "is_false")]
    pub secret: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Declarative input schema rendered by the host as a credential form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSchema {
    pub fields: &'static [InputField],
    pub required: &'static [&'static str],
    pub metadata: &'static [InputField],
}

impl InputSchema {
    /// Find a form or metadata field by id.
    pub fn field(&self, id: &str) -> Option<&'static InputField> {
        self.fields
            .iter()
            .chain(self.metadata.iter())
            .find(|field| field.id == id)
    }
}

/// Mapping from injected names to `{{ value }}` templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Injectors {
    /// Environment variables set on the job process.
    #[serde(serialize_with = "serialize_pairs")]
    pub env: &'static [(&'static str, &'static str)],

    /// Extra variables exposed to job templates.
    #[serde(serialize_with = "serialize_pairs")]
    pub extra_vars: &'static [(&'static str, &'static str)],
}

fn serialize_pairs<S: Serializer>(
    pairs: &&'static [(&'static str, &'static str)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (name, template) in pairs.iter() {
        map.serialize_entry(name, template)?;
    }
    map.end()
}

/// Injector output after templates are filled with backend values.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct InjectedValues {
    pub env: BTreeMap<String, String>,
    pub extra_vars: BTreeMap<String, String>,
}

// Values carry the token, so only names are printed.
impl fmt::Debug for InjectedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedValues")
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("extra_vars", &self.extra_vars.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Injectors {
    /// Fill every template with `values` (keyed by metadata field id).
    pub fn render(
        &self,
        values: &BTreeMap<String, String>,
    ) -> Result<InjectedValues, ResolveError> {
        let render_all = |pairs: &[(&str, &str)]| -> Result<BTreeMap<String, String>, ResolveError> {
            pairs
                .iter()
                .map(|(name, template)| Ok((name.to_string(), render_template(template, values)?)))
                .collect()
        };

        Ok(InjectedValues {
            env: render_all(self.env)?,
            extra_vars: render_all(self.extra_vars)?,
        })
    }
}

/// Substitute `{{ name }}` placeholders in `template`.
///
/// Text outside placeholders is copied verbatim; an unterminated `{{` is
/// kept as literal text.
pub fn render_template(
    template: &str,
    values: &BTreeMap<String, String>,
) -> Result<String, ResolveError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        output.push_str(&rest[..start]);

        let name = rest[start + 2..start + 2 + len].trim();
        let value = values.get(name).ok_or_else(|| ResolveError::Template {
            placeholder: name.to_string(),
        })?;
        output.push_str(value);

        rest = &rest[start + 2 + len + 2..];
    }

    output.push_str(rest);
    Ok(output)
}

/// Future returned by a plugin backend.
pub type BackendFuture =
    Pin<Box<dyn Future<Output = Result<ResolutionResult, ResolveError>> + Send>>;

/// Backend invoked by the host at job launch.
pub type Backend = fn(CredentialParameters, ResolverConfig) -> BackendFuture;

/// Registration record discovered by the host's plugin loader.
#[derive(Serialize)]
pub struct CredentialPlugin {
    pub name: &'static str,
    pub entry_point: &'static str,
    pub inputs: &'static InputSchema,
    pub injectors: &'static Injectors,
    #[serde(skip)]
    pub backend: Backend,
}

impl fmt::Debug for CredentialPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPlugin")
            .field("name", &self.name)
            .field("entry_point", &self.entry_point)
            .field("inputs", self.inputs)
            .field("injectors", self.injectors)
            .finish_non_exhaustive()
    }
}

impl CredentialPlugin {
    /// Run the backend for typed parameters.
    pub async fn resolve(
        &self,
        params: CredentialParameters,
        config: ResolverConfig,
    ) -> Result<ResolutionResult, ResolveError> {
        (self.backend)(params, config).await
    }

    /// Run the backend for the host's flat field map.
    ///
    /// Returns the metadata values (`tss_token`, `tss_base_url`) the host
    /// feeds into the injectors.
    pub async fn resolve_inputs(
        &self,
        inputs: &HashMap<String, String>,
        config: ResolverConfig,
    ) -> Result<BTreeMap<String, String>, ResolveError> {
        let params = CredentialParameters::from_inputs(inputs)?;
        Ok(self.resolve(params, config).await?.into_values())
    }
}

fn resolve_backend(params: CredentialParameters, config: ResolverConfig) -> BackendFuture {
    Box::pin(async move {
        let resolver = TokenResolver::new(config)?;
        resolver.resolve(params).await
    })
}

/// Credential form and metadata fields.
pub static INPUTS: InputSchema = InputSchema {
    fields: &[
        InputField {
            id: FIELD_BASE_URL,
            label: "Secret Server URL",
            help_text: Some(
                "The Base URL of Secret Server e.g. https://myserver/SecretServer or \
                 https://mytenant.secretservercloud.com",
            ),
            field_type: "string",
            secret: false,
        },
        InputField {
            id: FIELD_USERNAME,
            label: "Username",
            help_text: Some("The (Application) user username"),
            field_type: "string",
            secret: false,
        },
        InputField {
            id: FIELD_DOMAIN,
            label: "Domain",
            help_text: Some("The (Application) user domain (optional)"),
            field_type: "string",
            secret: false,
        },
        InputField {
            id: FIELD_PASSWORD,
            label: "Password",
            help_text: Some("The corresponding password"),
            field_type: "string",
            secret: true,
        },
    ],
    required: &[FIELD_BASE_URL, FIELD_USERNAME, FIELD_PASSWORD],
    metadata: &[
        InputField {
            id: METADATA_TOKEN,
            label: "OAuth2 Token",
            help_text: None,
            field_type: "string",
            secret: true,
        },
        InputField {
            id: METADATA_BASE_URL,
            label: "Secret Server Base URL",
            help_text: None,
            field_type: "string",
            secret: false,
        },
    ],
};

/// Injected environment variables and extra vars.
pub static INJECTORS: Injectors = Injectors {
    env: &[
        ("TSS_TOKEN", "{{tss_token}}"),
        ("TSS_BASE_URL", "{{tss_base_url}}"),
    ],
    extra_vars: &[
        ("tss_token", "{{tss_token}}"),
        ("tss_base_url", "{{tss_base_url}}"),
    ],
};

/// The Delinea Secret Server credential plugin.
pub static DELINEA_SECRET_SERVER: CredentialPlugin = CredentialPlugin {
    name: PLUGIN_NAME,
    entry_point: ENTRY_POINT,
    inputs: &INPUTS,
    injectors: &INJECTORS,
    backend: resolve_backend,
};

static REGISTRY: [&CredentialPlugin; 1] = [&DELINEA_SECRET_SERVER];

/// All plugins this crate registers.
pub fn registry() -> &'static [&'static CredentialPlugin] {
    &REGISTRY
}

/// Find a plugin by entry point name.
pub fn lookup(entry_point: &str) -> Option<&'static CredentialPlugin> {
    registry()
        .iter()
        .copied()
        .find(|plugin| plugin.entry_point == entry_point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::Secret;

    fn values() -> BTreeMap<String, String> {
        ResolutionResult {
            token: Secret::new("abc123"),
            base_url: "https://s.example.com/SecretServer".to_string(),
        }
        .into_values()
    }

    #[test]
    fn test_lookup_by_entry_point() {
        let plugin = lookup(ENTRY_POINT).unwrap();
        assert_eq!(plugin.name, "Delinea Secret Server");
        assert!(std::ptr::eq(plugin.injectors, &INJECTORS));
        assert!(lookup("hashivault_kv").is_none());
    }

    #[test]
    fn test_input_schema_matches_form() {
        let password = INPUTS.field("password").unwrap();
        assert!(password.secret);

        let domain = INPUTS.field("domain").unwrap();
        assert!(!domain.secret);
        assert!(!INPUTS.required.contains(&"domain"));

        let token = INPUTS.field("tss_token").unwrap();
        assert!(token.secret);
        assert!(INPUTS.field("tss_base_url").is_some());
    }

    #[test]
    fn test_injectors_define_env_and_extra_vars() {
        let json = serde_json::to_value(&INJECTORS).unwrap();
        assert_eq!(json["env"]["TSS_TOKEN"], "{{tss_token}}");
        assert_eq!(json["env"]["TSS_BASE_URL"], "{{tss_base_url}}");
        assert_eq!(json["extra_vars"]["tss_token"], "{{tss_token}}");
        assert_eq!(json["extra_vars"]["tss_base_url"], "{{tss_base_url}}");
    }

    #[test]
    fn test_injectors_never_reference_password() {
        let json = serde_json::to_string(&INJECTORS).unwrap();
        assert!(!json.contains("password"));

        for (name, template) in INJECTORS.env.iter().chain(INJECTORS.extra_vars.iter()) {
            assert!(["TSS_TOKEN", "TSS_BASE_URL", "tss_token", "tss_base_url"].contains(name));
            assert!(["{{tss_token}}", "{{tss_base_url}}"].contains(template));
        }
    }

    #[test]
    fn test_plugin_serializes_registration_record() {
        let json = serde_json::to_value(&DELINEA_SECRET_SERVER).unwrap();
        assert_eq!(json["name"], "Delinea Secret Server");
        assert_eq!(json["inputs"]["fields"][3]["id"], "password");
        assert_eq!(json["inputs"]["fields"][3]["secret"], true);
        assert!(json["inputs"]["fields"][0].get("secret").is_none());
        assert_eq!(json["inputs"]["fields"][0]["type"], "string");
        assert!(json.get("backend").is_none());
    }

    #[test]
    fn test_render_injectors() {
        let injected = INJECTORS.render(&values()).unwrap();
        assert_eq!(injected.env["TSS_TOKEN"], "abc123");
        assert_eq!(injected.env["TSS_BASE_URL"], "https://s.example.com/SecretServer");
        assert_eq!(injected.extra_vars["tss_token"], "abc123");
        assert_eq!(
            injected.extra_vars["tss_base_url"],
            "https://s.example.com/SecretServer"
        );
        assert!(!format!("{:?}", injected).contains("abc123"));
    }

    #[test]
    fn test_render_template_whitespace_and_literals() {
        let rendered = render_template("Bearer {{ tss_token }}!", &values()).unwrap();
        assert_eq!(rendered, "Bearer abc123!");

        let rendered = render_template("no placeholders {{ here", &values()).unwrap();
        assert_eq!(rendered, "no placeholders {{ here");
    }

    #[test]
    fn test_render_template_unknown_placeholder() {
        let err = render_template("{{password}}", &values()).unwrap_err();
        assert!(matches!(err, ResolveError::Template { ref placeholder } if placeholder == "password"));
    }
}
