//! tsscred CLI
//!
//! Host-facing entry point for Delinea Secret Server credential resolution.
//!
//! # Usage
//!
//! ```bash
//! # Print the registration record the host plugin loader reads
//! tsscred plugin
//!
//! # Exchange credentials for a token and print the injected environment
//! TSS_PASSWORD=s3cret tsscred resolve --base-url https://myserver/SecretServer --username appuser
//!
//! # Read the password from stdin and print extra vars
//! tsscred resolve --username appuser --password-stdin --format extra-vars < password.txt
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use tsscred_cli::{
    PASSWORD_ENV, ParameterOverrides, build_parameters,
    config::load_config,
    output::{OutputFormat, render},
    read_password,
};
use tsscred_core::{DELINEA_SECRET_SERVER, Secret, plugin::ENTRY_POINT};

#[derive(Parser)]
#[command(name = "tsscred")]
#[command(about = "Resolve Delinea Secret Server credentials into short-lived tokens")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the plugin registration record as JSON
    Plugin,

    /// Exchange credentials for an access token
    Resolve {
        /// Secret Server base URL (e.g., https://myserver/SecretServer)
        #[arg(long, env = "TSS_BASE_URL")]
        base_url: Option<String>,

        /// Application user name
        #[arg(long, env = "TSS_USERNAME")]
        username: Option<String>,

        /// Application user domain
        #[arg(long, env = "TSS_DOMAIN")]
        domain: Option<String>,

        /// Read the password from the first line of stdin instead of TSS_PASSWORD
        #[arg(long)]
        password_stdin: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Env)]
        format: OutputFormat,

        /// Disable TLS certificate verification
        #[arg(long)]
        insecure: bool,

        /// Request timeout in seconds (fractions allowed, e.g. 0.5)
        #[arg(long)]
        timeout: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Plugin => print_plugin(),
        Commands::Resolve {
            base_url,
            username,
            domain,
            password_stdin,
            format,
            insecure,
            timeout,
        } => {
            let overrides = ParameterOverrides {
                base_url,
                username,
                domain,
            };
            resolve(cli.config, overrides, password_stdin, format, insecure, timeout).await
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_plugin() -> Result<()> {
    let record = serde_json::to_string_pretty(&DELINEA_SECRET_SERVER)
        .context("Failed to serialize plugin registration record")?;
    println!("{}", record);
    Ok(())
}

async fn resolve(
    config_path: Option<PathBuf>,
    overrides: ParameterOverrides,
    password_stdin: bool,
    format: OutputFormat,
    insecure: bool,
    timeout: Option<f64>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    debug!("Using configuration from {:?}", config.config_path);

    if insecure {
        config.resolver = config.resolver.with_verify_tls(false);
    }
    if let Some(secs) = timeout {
        let timeout = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("Invalid --timeout value: {}", secs))?;
        config.resolver = config.resolver.with_timeout(timeout);
    }

    let password = if password_stdin {
        read_password(&mut std::io::stdin().lock()).context("Failed to read password from stdin")?
    } else {
        Secret::new(std::env::var(PASSWORD_ENV).unwrap_or_default())
    };

    let params = build_parameters(overrides, &config, password)?;

    info!("Resolving {} credential for {}", ENTRY_POINT, params.base_url);

    let result = DELINEA_SECRET_SERVER
        .resolve(params, config.resolver)
        .await
        .map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e)
                .context(format!("credential resolution failed at the {} stage", stage))
        })?;

    print!("{}", render(format, &result)?);
    Ok(())
}
