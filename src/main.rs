// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! fedlink CLI
//!
//! Runs single requests through the fedlink pipeline.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use url::Url;

use fedlink::{
    Anonymous, ApiRoutine, Connection, ConnectionConfig, Credentials, HttpConnection, OAuth,
    ReadResult, Request, SslMode, TransportConfig,
};

/// Bearer token for authenticated requests
const TOKEN_ENV: &str = "FEDLINK_TOKEN";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fedlink=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "get" => {
            if args.len() < 3 {
                eprintln!("Usage: fedlink get <url>");
                return ExitCode::from(1);
            }
            get_url(&args[2]).await
        }
        "post" => {
            if args.len() < 3 {
                eprintln!("Usage: fedlink post <url> [key=value]...");
                return ExitCode::from(1);
            }
            post_url(&args[2], &args[3..]).await
        }
        "file" => {
            if args.len() < 3 {
                eprintln!("Usage: fedlink file <path>");
                return ExitCode::from(1);
            }
            read_file(&args[2]).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("fedlink {}", fedlink::VERSION);
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"fedlink - HTTP transport for social-network clients

USAGE:
    fedlink <COMMAND> [OPTIONS]

COMMANDS:
    get <url>                  GET a URL and print the response
    post <url> [key=value]...  POST form parameters to a URL
    file <path>                Read a local file through the pipeline
    help                       Show this help message
    version                    Show version information

ENVIRONMENT:
    FEDLINK_TOKEN   Bearer token sent with get and post
    RUST_LOG        Log filter, e.g. fedlink=debug

EXAMPLES:
    fedlink get https://example.social/api/v1/instance
    fedlink post https://example.social/api/v1/statuses status=hello
    fedlink file ./avatar.png
"#
    );
}

/// Connection rooted at the URL's origin
fn connect(url: &str) -> fedlink::Result<(Connection, String)> {
    let url = Url::parse(url)?;
    let ssl_mode = if url.scheme() == "http" {
        SslMode::None
    } else {
        SslMode::Secure
    };
    let config = ConnectionConfig::new(url.origin().ascii_serialization(), ssl_mode)?
        .transport(TransportConfig::new().verbose(true));

    let credentials: Box<dyn Credentials> = match env::var(TOKEN_ENV) {
        Ok(token) if !token.is_empty() => Box::new(OAuth::new(token, "")),
        _ => Box::new(Anonymous),
    };
    let transport = std::sync::Arc::new(fedlink::ReqwestTransport::new(&config)?);
    Ok((
        Connection::with_transport(config, transport, credentials),
        url.to_string(),
    ))
}

async fn get_url(url: &str) -> ExitCode {
    tracing::info!(%url, "GET");

    let (connection, url) = match connect(url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create connection: {}", e);
            return ExitCode::from(1);
        }
    };

    match connection.execute(Request::get(url).log_name("cli")).await {
        Ok(result) => {
            print_result(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            ExitCode::from(1)
        }
    }
}

async fn post_url(url: &str, params: &[String]) -> ExitCode {
    tracing::info!(%url, "POST");

    let (connection, url) = match connect(url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create connection: {}", e);
            return ExitCode::from(1);
        }
    };

    let mut request = Request::post(url).log_name("cli");
    for param in params {
        match param.split_once('=') {
            Some((key, value)) => request = request.param(key, value),
            None => {
                eprintln!("Expected key=value, got '{}'", param);
                return ExitCode::from(1);
            }
        }
    }

    match connection.execute(request).await {
        Ok(result) => {
            print_result(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            ExitCode::from(1)
        }
    }
}

async fn read_file(path: &str) -> ExitCode {
    let path = match std::fs::canonicalize(Path::new(path)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Cannot open {}: {}", path, e);
            return ExitCode::from(1);
        }
    };
    let Ok(file_url) = Url::from_file_path(&path) else {
        eprintln!("Not a file path: {}", path.display());
        return ExitCode::from(1);
    };

    let config = match ConnectionConfig::new("localhost", SslMode::None) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create connection: {}", e);
            return ExitCode::from(1);
        }
    };
    let connection = Connection::local_only(config);
    let request = Request::get(file_url.as_str())
        .api_routine(ApiRoutine::DownloadFile)
        .log_name("cli");

    match connection.execute(request).await {
        Ok(result) => {
            println!("URL: {}", result.url());
            println!("Size: {} bytes", result.body().len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Read failed: {}", e);
            ExitCode::from(1)
        }
    }
}

fn print_result(result: &ReadResult) {
    println!("\n=== Response ===");
    println!("Status: {}", result.status_line());
    println!("URL: {}", result.url());
    println!("Redirected: {}", result.redirected());
    println!("Legacy protocol: {}", result.request.legacy_protocol);
    println!("Size: {} bytes", result.body().len());

    match result.parsed() {
        Some(json) => match serde_json::to_string_pretty(json) {
            Ok(pretty) => println!("\n{}", pretty),
            Err(_) => println!("\n{}", json),
        },
        None => println!("\n{}", result.text_lossy()),
    }
}
