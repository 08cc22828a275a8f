//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use s3sign_auth::target::make_target_url;
use s3sign_core::{AwsRegion, SignerConfig};

/// Sign requests to S3-compatible endpoints with AWS Signature Version 4.
#[derive(Debug, Parser)]
#[command(name = "s3sign", version, about)]
pub struct Cli {
    /// What to do with the request.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the signed request line and headers without sending it.
    Sign(RequestArgs),
    /// Sign the request, send it, and print the response.
    Send(RequestArgs),
}

/// The request to sign and the credentials to sign it with.
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// HTTP method. An empty method means POST.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Absolute target URL. Built from the endpoint, bucket and key when omitted.
    #[arg(long)]
    pub url: Option<String>,

    /// Bucket name, used when `--url` is not given.
    #[arg(short, long, default_value = "")]
    pub bucket: String,

    /// Object key, used when `--url` is not given.
    #[arg(short, long, default_value = "")]
    pub key: String,

    /// File whose content becomes the request body.
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// Extra header as `name:value`. May be repeated.
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// S3 endpoint, overriding `S3_ENDPOINT_URL`.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Signing region, overriding `DEFAULT_REGION` / `AWS_REGION`.
    #[arg(long)]
    pub region: Option<String>,

    /// Access key ID, overriding `AWS_ACCESS_KEY_ID`.
    #[arg(long)]
    pub access_key: Option<String>,

    /// Secret access key, overriding `AWS_SECRET_ACCESS_KEY`.
    #[arg(long)]
    pub secret_key: Option<String>,
}

impl RequestArgs {
    /// Environment configuration with the command-line overrides applied.
    pub fn config(&self) -> Result<SignerConfig> {
        let mut config = SignerConfig::from_env();
        if let Some(endpoint) = &self.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if let Some(region) = &self.region {
            config.default_region = AwsRegion::parse(region.as_str())?;
        }
        if let Some(access_key) = &self.access_key {
            config.access_key_id.clone_from(access_key);
        }
        if let Some(secret_key) = &self.secret_key {
            config.secret_access_key.clone_from(secret_key);
        }
        config.validate()?;
        Ok(config)
    }

    /// The URL to sign.
    pub fn target_url(&self, config: &SignerConfig) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => make_target_url(&config.endpoint, &self.bucket, &self.key, &[]),
        }
    }

    /// Parsed `--header` values.
    pub fn header_pairs(&self) -> Result<Vec<(&str, &str)>> {
        self.headers
            .iter()
            .map(|raw| {
                let (name, value) = raw
                    .split_once(':')
                    .with_context(|| format!("header {raw:?} is not in name:value form"))?;
                let name = name.trim();
                if name.is_empty() {
                    bail!("header {raw:?} has an empty name");
                }
                Ok((name, value.trim()))
            })
            .collect()
    }
}
