//! Rendering of resolution results for the host.

use anyhow::Result;
use clap::ValueEnum;
use tsscred_core::{ResolutionResult, plugin::INJECTORS};

/// Output format for `tsscred resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `export NAME='value'` lines for the injected environment
    #[default]
    Env,
    /// The backend values (`tss_token`, `tss_base_url`) as JSON
    Json,
    /// The injected extra vars as JSON
    ExtraVars,
}

/// Render `result` in the requested format.
pub fn render(format: OutputFormat, result: &ResolutionResult) -> Result<String> {
    let values = result.values();

    let output: String = match format {
        OutputFormat::Env => {
            let injected = INJECTORS.render(&values)?;
            injected
                .env
                .iter()
                .map(|(name, value)| format!("export {}={}\n", name, shell_quote(value)))
                .collect()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&values)? + "\n",
        OutputFormat::ExtraVars => {
            let injected = INJECTORS.render(&values)?;
            serde_json::to_string_pretty(&injected.extra_vars)? + "\n"
        }
    };

    Ok(output)
}

/// Quote a value for POSIX shells.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
