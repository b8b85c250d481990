//! Basic usage example for the x-ui panel client
//!
//! This example demonstrates how to:
//! - Create a client with default settings
//! - Create a client with a custom HTTP configuration
//! - List inbounds and look up a client by email
//! - Read the server status
//!
//! Note: This example needs a reachable panel. Pass its URL and credentials in
//! `XUI_HOST`, `XUI_USERNAME` and `XUI_PASSWORD`, and set `RUST_LOG=debug` to
//! see the client's diagnostics.

use std::time::Duration;
use xui_client::{XuiClient, XuiError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let host = std::env::var("XUI_HOST").expect("XUI_HOST environment variable not set");
    let username = std::env::var("XUI_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("XUI_PASSWORD").unwrap_or_else(|_| "admin".to_string());

    // Example 1: Create a client with default settings and logging on
    println!("=== Example 1: Default Client ===");
    let client = XuiClient::new(&host, &username, &password, true)?;
    println!("✓ Client created for {}", client.host_name()?);

    // Example 2: Create a client with custom HTTP configuration
    println!("\n=== Example 2: Custom HTTP Configuration ===");
    let _configured_client = XuiClient::builder()
        .host(host.as_str())?
        .credentials(&username, &password)
        .client_builder(
            reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .use_rustls_tls(),
        )
        .build()?;
    println!("✓ Client created with custom timeout (30s)");

    println!("\n=== Using Default Client ===");

    println!("\nLogging in...");
    match client.login() {
        Ok(()) => println!("✓ Logged in"),
        Err(e) => {
            println!("✗ Login failed: {}", e);
            return Ok(());
        }
    }

    println!("\nListing inbounds...");
    let inbounds = client.inbounds()?;
    for inbound in &inbounds {
        println!(
            "  #{} {} ({} on port {}, {} clients)",
            inbound.id,
            inbound.remark,
            inbound.protocol,
            inbound.port,
            inbound.clients().len()
        );
    }

    if let Some(email) = inbounds
        .iter()
        .flat_map(|inbound| inbound.clients())
        .map(|client| client.email.clone())
        .next()
    {
        println!("\nLooking up client {}...", email);
        match client.client_by_email(&email) {
            Ok(found) => println!("✓ Found client {} (enabled: {})", found.id, found.enable),
            Err(XuiError::ClientNotFound { email }) => println!("✗ {} not found", email),
            Err(e) => println!("✗ Lookup failed: {}", e),
        }
    }

    println!("\nFetching server status...");
    match client.server_status() {
        Ok(status) => {
            println!("✓ CPU {:.1}% on {} cores", status.cpu, status.cpu_cores);
            println!("  Memory {}/{} bytes", status.mem.current, status.mem.total);
            println!("  Xray {} ({})", status.xray.version, status.xray.state);
        }
        Err(e) => println!("✗ Failed to fetch status: {}", e),
    }

    Ok(())
}
