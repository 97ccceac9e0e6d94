//! CLI entry point for http_action.
//!
//! Runs one request described on the command line and prints the result.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use http_action::{
    Auth, CallContext, CertConfig, HttpRequest, TransportConfig, build_client_pair_with,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "http_action")]
#[command(about = "Send an HTTP request and validate the response", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send the request, check the status, and print the decoded JSON body
    Call(RequestArgs),
    /// Send the request and print the raw status and body size, without checks
    Probe(RequestArgs),
}

#[derive(Args)]
struct RequestArgs {
    /// Full URL to call
    #[arg(value_name = "URL")]
    url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request body, sent as-is
    #[arg(short, long)]
    data: Option<String>,

    /// Extra header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Content-Type header value
    #[arg(long, default_value = "application/json")]
    content_type: String,

    /// Basic auth username
    #[arg(short, long)]
    user: Option<String>,

    /// Basic auth password (or HTTP_ACTION_PASSWORD)
    #[arg(long, env = "HTTP_ACTION_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Accepted status code (repeatable, default 200)
    #[arg(short, long = "expect")]
    expect: Vec<u16>,

    /// PEM CA bundle to trust; enables the TLS client pair
    #[arg(long)]
    ca_bundle: Option<PathBuf>,

    /// PEM client certificate for mutual TLS
    #[arg(long, requires = "key")]
    cert: Option<PathBuf>,

    /// PKCS#8 PEM private key for mutual TLS
    #[arg(long, requires = "cert")]
    key: Option<PathBuf>,

    /// Retry count for this call (0 = client default)
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Longest wait between retries in milliseconds (0 = client default)
    #[arg(long, default_value_t = 0)]
    max_wait_ms: u64,

    /// Per-request timeout in milliseconds (0 = none)
    #[arg(long, default_value_t = 0)]
    timeout_ms: u64,

    /// Give up on the whole call after this many milliseconds, retries included
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// JSON transport config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME:VALUE, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/http_action.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("http_action.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Call(args) => {
            let req = build_request(&args)?;
            info!(request = %req, "Calling");
            let body = req.get_body_value().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Probe(args) => {
            let req = build_request(&args)?;
            info!(request = %req, "Probing");
            let response = req.do_http_action().await?;
            let accepted = req.accepts(response.status);
            info!(
                status = response.status,
                bytes = response.body.len(),
                accepted,
                "Probe finished"
            );
            println!("{} ({} bytes)", response.status, response.body.len());
        }
    }

    Ok(())
}

/// Turns command-line arguments into a request descriptor.
fn build_request(args: &RequestArgs) -> Result<HttpRequest> {
    let config = match &args.config {
        Some(path) => TransportConfig::load(path)?,
        None => TransportConfig::default(),
    }
    .with_env()?;

    let mut req = HttpRequest::new(&args.url);
    if args.ca_bundle.is_some() || args.cert.is_some() {
        let certs = CertConfig {
            ca_bundle_path: args.ca_bundle.clone(),
            client_cert_path: args.cert.clone(),
            client_key_path: args.key.clone(),
            timeout: None,
        };
        let pair = build_client_pair_with(&certs, config.client_builder())
            .context("failed to set up TLS clients")?;
        req.tls_client_pair = Some(pair);
    } else {
        req.client = Some(Arc::new(config.build_client()?));
    }

    req.method = args.method.clone();
    req.payload = args.data.as_ref().map(|d| d.as_bytes().to_vec());
    req.content_type = args.content_type.clone();
    req.custom_headers = args.headers.iter().cloned().collect();
    req.expected_status_codes = args.expect.clone();
    req.max_retry_count = args.retries;
    req.max_retry_wait = Duration::from_millis(args.max_wait_ms);
    req.timeout = Duration::from_millis(args.timeout_ms);
    req.context = args
        .deadline_ms
        .map(|ms| CallContext::with_timeout(Duration::from_millis(ms)));

    req.auth = match (&args.user, &args.password) {
        (Some(user), password) => Some(Auth::new(user, password.clone().unwrap_or_default())),
        (None, Some(_)) => bail!("--password needs --user"),
        (None, None) => None,
    };

    Ok(req)
}
