use anyhow::{Context, Result};
use clap::Parser;
use std::env;

use crate::services::{chunk_source::DEFAULT_SOURCE_URL, transfer_pipeline::DEFAULT_MAX_IN_FLIGHT};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// AWS region for the destination bucket.
    pub region: String,
    /// Bucket name template; the environment name is appended.
    pub bucket_template: String,
    /// Deployment environment. Valid values are "development", "staging",
    /// and "production".
    pub environment: String,
    /// URL of the source product CSV.
    pub source_url: String,
    /// Cap on concurrently in-flight part uploads.
    pub max_in_flight: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Product CSV to object storage sync job")]
pub struct Args {
    /// Host to bind to (overrides PRODUCT_SYNC_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PRODUCT_SYNC_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// AWS region (overrides PRODUCT_SYNC_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Bucket name template (overrides PRODUCT_SYNC_BUCKET_TEMPLATE)
    #[arg(long)]
    pub bucket_template: Option<String>,

    /// Environment name (overrides PRODUCT_SYNC_ENVIRONMENT)
    #[arg(long)]
    pub environment: Option<String>,

    /// Source CSV URL (overrides PRODUCT_SYNC_SOURCE_URL)
    #[arg(long)]
    pub source_url: Option<String>,

    /// Max concurrent part uploads (overrides PRODUCT_SYNC_MAX_IN_FLIGHT)
    #[arg(long)]
    pub max_in_flight: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("PRODUCT_SYNC_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("PRODUCT_SYNC_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PRODUCT_SYNC_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading PRODUCT_SYNC_PORT"),
        };
        let env_source =
            env::var("PRODUCT_SYNC_SOURCE_URL").unwrap_or_else(|_| DEFAULT_SOURCE_URL.into());
        let env_max_in_flight = match env::var("PRODUCT_SYNC_MAX_IN_FLIGHT") {
            Ok(value) => value.parse::<usize>().with_context(|| {
                format!("parsing PRODUCT_SYNC_MAX_IN_FLIGHT value `{}`", value)
            })?,
            Err(env::VarError::NotPresent) => DEFAULT_MAX_IN_FLIGHT,
            Err(err) => return Err(err).context("reading PRODUCT_SYNC_MAX_IN_FLIGHT"),
        };
        // No sensible defaults for these; they must come from somewhere.
        let env_region = env::var("PRODUCT_SYNC_REGION").ok();
        let env_bucket_template = env::var("PRODUCT_SYNC_BUCKET_TEMPLATE").ok();
        let env_environment = env::var("PRODUCT_SYNC_ENVIRONMENT").ok();

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            region: require("PRODUCT_SYNC_REGION", args.region, env_region)?,
            bucket_template: require(
                "PRODUCT_SYNC_BUCKET_TEMPLATE",
                args.bucket_template,
                env_bucket_template,
            )?,
            environment: require("PRODUCT_SYNC_ENVIRONMENT", args.environment, env_environment)?,
            source_url: args.source_url.unwrap_or(env_source),
            max_in_flight: args.max_in_flight.unwrap_or(env_max_in_flight),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Destination bucket for this environment.
    pub fn bucket(&self) -> String {
        format!("{}-{}", self.bucket_template, self.environment)
    }
}

/// Merge one required setting: CLI override first, env fallback second,
/// error if neither is present.
fn require(name: &str, cli: Option<String>, env_value: Option<String>) -> Result<String> {
    cli.or(env_value)
        .with_context(|| format!("{} is not set", name))
}
