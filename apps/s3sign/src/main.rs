//! s3sign - sign and send AWS Signature Version 4 requests.
//!
//! # Usage
//!
//! ```text
//! s3sign sign -X PUT --bucket photos --key "cat pic.jpg" --body ./cat.jpg
//! s3sign send --url http://localhost:9000/photos/
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3_ENDPOINT_URL` | `http://localhost:9000` | Endpoint used with `--bucket`/`--key` |
//! | `AWS_ACCESS_KEY_ID` | `minioadmin` | Access key |
//! | `AWS_SECRET_ACCESS_KEY` | `minioadmin` | Secret key |
//! | `DEFAULT_REGION` / `AWS_REGION` | `us-east-1` | Signing region |
//! | `S3SIGN_SERVICE` | `s3` | Signing service |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod cli;

use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use s3sign_auth::{RequestDescriptor, RequestSigner, SignedRequest};
use s3sign_core::SignerConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, RequestArgs};

/// Initialize the tracing subscriber on stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Sign the request described by `args`, returning it with an owned body.
fn sign_request(args: &RequestArgs) -> Result<http::Request<Bytes>> {
    let config = args.config()?;
    let signer = RequestSigner::from_config(&config);
    let url = args.target_url(&config);

    let mut desc = RequestDescriptor::new(&args.method, &url)?;
    for (name, value) in args.header_pairs()? {
        desc = desc.with_header(name, value)?;
    }

    info!(
        method = %desc.method(),
        url = %url,
        access_key_id = %signer.access_key_id(),
        region = %signer.region(),
        "signing request"
    );

    match &args.body {
        Some(path) => {
            let body = std::fs::read(path)
                .with_context(|| format!("failed to read body from {}", path.display()))?;
            buffered(signer.sign(desc.with_body(Cursor::new(body)))?)
        }
        None => buffered(signer.sign(desc)?),
    }
}

fn buffered<R: Read>(signed: SignedRequest<R>) -> Result<http::Request<Bytes>> {
    debug!(canonical_request = %signed.canonical_request, "canonical request");
    debug!(string_to_sign = %signed.string_to_sign, "string to sign");
    Ok(signed.into_buffered()?)
}

fn print_request(request: &http::Request<Bytes>) {
    println!("{} {}", request.method(), request.uri());
    for (name, value) in request.headers() {
        println!("{name}: {}", String::from_utf8_lossy(value.as_bytes()));
    }
}

async fn send(request: http::Request<Bytes>) -> Result<()> {
    let (parts, body) = request.into_parts();
    let client = reqwest::Client::new();

    let response = client
        .request(parts.method, parts.uri.to_string())
        .headers(parts.headers)
        .body(body)
        .send()
        .await
        .context("failed to send request")?;

    let status = response.status();
    info!(status = %status, "received response");
    println!("{status}");
    for (name, value) in response.headers() {
        println!("{name}: {}", String::from_utf8_lossy(value.as_bytes()));
    }
    let text = response
        .text()
        .await
        .context("failed to read response body")?;
    if !text.is_empty() {
        println!();
        println!("{text}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&SignerConfig::from_env().log_level)?;

    match cli.command {
        Command::Sign(args) => {
            let request = sign_request(&args)?;
            print_request(&request);
        }
        Command::Send(args) => {
            let request = sign_request(&args)?;
            send(request).await?;
        }
    }

    Ok(())
}
