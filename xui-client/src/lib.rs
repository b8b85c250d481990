//! x-ui Panel HTTP Client Library
//!
//! This library provides a blocking client for the management API of x-ui style
//! proxy panels: listing and inspecting inbounds, provisioning clients, and
//! reading the server status.
//!
//! # Features
//!
//! - Lazy login with cookie-based session reuse
//! - One automatic re-login and retry when the panel reports an expired session
//! - Typed inbound, client and server status models, including fields the panel
//!   sends as JSON-encoded strings
//! - Secure TLS using rustls (no OpenSSL dependencies)
//! - Optional `tracing` diagnostics
//! - Well-typed errors using thiserror
//!
//! # Example
//!
//! ```no_run
//! use xui_client::{InboundClient, XuiClient, XuiError};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = XuiClient::new("https://panel.example.com:2053", "admin", "admin", false)?;
//!
//! // The first call logs in
//! let status = client.server_status()?;
//! println!("xray {} is {}", status.xray.version, status.xray.state);
//!
//! // Provision a client on inbound 1
//! let user = InboundClient {
//!     id: "0b9c3f4e-8d6b-4b7a-9a3b-2f1c5d8e7a6b".to_string(),
//!     email: "alice@example.com".to_string(),
//!     enable: true,
//!     ..Default::default()
//! };
//! client.add_client(1, &user)?;
//!
//! match client.client_by_email("alice@example.com") {
//!     Ok(found) => println!("found {}", found.id),
//!     Err(XuiError::ClientNotFound { email }) => println!("{} is gone", email),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;
mod nested;
mod session;

pub use client::{XuiClient, XuiClientBuilder};
pub use error::{AuthError, XuiError};
pub use models::{
    Allocate, AppStats, ClientTraffic, Envelope, Inbound, InboundClient, NetIo, NetTraffic,
    PublicIp, RealityClientSettings, RealitySettings, ServerStatus, Settings, Sniffing,
    StreamSettings, TcpHeader, TcpSettings, Usage, XrayStatus,
};
