//! x-ui panel API client implementation

use crate::error::XuiError;
use crate::models::{Envelope, Inbound, InboundClient, ServerStatus};
use crate::session::{
    Credentials, DEFAULT_SESSION_COOKIE, DEFAULT_SESSION_EXPIRED_STATUS, SessionTransport,
};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroizing;

const LIST_INBOUNDS: &str = "/panel/api/inbounds/list";
const GET_INBOUND: &str = "/panel/api/inbounds/get/{id}";
const ADD_CLIENT: &str = "/panel/api/inbounds/addClient";
const DELETE_CLIENT: &str = "/panel/api/inbounds/{inboundId}/delClient/{uuid}";
const UPDATE_CLIENT: &str = "/panel/api/inbounds/updateClient/{uuid}";
const SERVER_STATUS: &str = "/server/status";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const NO_BODY: Option<&()> = None;

/// Substitute `{name}` placeholders in an endpoint pattern
fn endpoint(pattern: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(pattern.to_string(), |path, (name, value)| {
            path.replacen(&format!("{{{name}}}"), value, 1)
        })
}

/// Body shared by the add and update client endpoints
///
/// The panel expects `settings` as a JSON string holding `{"clients": [...]}`.
#[derive(Debug, Serialize)]
struct ClientRequest {
    id: i64,
    settings: String,
}

#[derive(Serialize)]
struct ClientSettings<'a> {
    clients: [&'a InboundClient; 1],
}

impl ClientRequest {
    fn new(inbound_id: i64, client: &InboundClient) -> Result<Self, XuiError> {
        let settings = serde_json::to_string(&ClientSettings { clients: [client] })?;
        Ok(Self {
            id: inbound_id,
            settings,
        })
    }
}

/// Client for the x-ui panel management API
///
/// Logs in on first use and keeps the session cookie for later calls. When the
/// panel reports the session as expired it logs in again and retries the call
/// once. Clones share the same session.
///
/// # Example
///
/// ```no_run
/// use xui_client::XuiClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = XuiClient::new("https://panel.example.com:2053", "admin", "admin", false)?;
///
/// for inbound in client.inbounds()? {
///     println!("{} ({}) on port {}", inbound.remark, inbound.protocol, inbound.port);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct XuiClient {
    transport: Arc<SessionTransport>,
}

impl XuiClient {
    /// Create a client with default settings
    ///
    /// No request is sent until the first API call.
    ///
    /// # Errors
    ///
    /// * `XuiError::InvalidHost` - `host` is not an absolute http(s) URL
    /// * `XuiError::ClientInit` - the HTTP client cannot be initialized
    pub fn new(
        host: &str,
        username: &str,
        password: &str,
        enable_logging: bool,
    ) -> Result<Self, XuiError> {
        Self::builder()
            .host(host)?
            .credentials(username, password)
            .logging(enable_logging)
            .build()
    }

    /// Create a builder for configuring the client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use xui_client::XuiClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = XuiClient::builder()
    ///     .host("http://127.0.0.1:2053/secret-path")?
    ///     .credentials("admin", "admin")
    ///     .logging(true)
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> XuiClientBuilder {
        XuiClientBuilder::new()
    }

    /// Log in now instead of on the first API call
    ///
    /// Useful to check credentials up front. Replaces any session already held.
    ///
    /// # Errors
    ///
    /// * `XuiError::Authentication` - wrong credentials or no session cookie
    /// * `XuiError::Request` - network error
    pub fn login(&self) -> Result<(), XuiError> {
        self.transport.login()
    }

    /// Whether a session cookie is currently held
    pub fn is_logged_in(&self) -> bool {
        self.transport.has_session()
    }

    /// Send a request and return the envelope payload decoded as `T`
    fn call<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, XuiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (_, envelope): (StatusCode, Envelope) =
            self.transport.request_json(method, path, body)?;
        envelope.into_payload(path)
    }

    /// Send a request whose outcome is judged only by the envelope's `success`
    fn call_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), XuiError>
    where
        B: Serialize + ?Sized,
    {
        let (_, envelope): (StatusCode, Envelope) =
            self.transport.request_json(method, path, body)?;
        envelope.check(path).map(drop)
    }

    /// List all inbounds
    ///
    /// # Errors
    ///
    /// * `XuiError::Api` - the panel answered with `success: false`
    /// * `XuiError::MalformedResponse` / `XuiError::Decode` - unexpected body
    /// * `XuiError::Authentication` / `XuiError::Request` - login or network failure
    pub fn inbounds(&self) -> Result<Vec<Inbound>, XuiError> {
        let inbounds: Option<Vec<Inbound>> = self.call(Method::GET, LIST_INBOUNDS, NO_BODY)?;
        Ok(inbounds.unwrap_or_default())
    }

    /// Fetch a single inbound by id
    pub fn inbound(&self, inbound_id: i64) -> Result<Inbound, XuiError> {
        let id = inbound_id.to_string();
        let path = endpoint(GET_INBOUND, &[("id", id.as_str())]);
        self.call(Method::GET, &path, NO_BODY)
    }

    /// Add a client to an inbound
    ///
    /// # Example
    ///
    /// ```no_run
    /// use xui_client::{InboundClient, XuiClient};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = XuiClient::new("http://127.0.0.1:2053", "admin", "admin", false)?;
    ///
    /// let user = InboundClient {
    ///     id: "0b9c3f4e-8d6b-4b7a-9a3b-2f1c5d8e7a6b".to_string(),
    ///     email: "alice@example.com".to_string(),
    ///     enable: true,
    ///     ..Default::default()
    /// };
    /// client.add_client(1, &user)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_client(&self, inbound_id: i64, client: &InboundClient) -> Result<(), XuiError> {
        let body = ClientRequest::new(inbound_id, client)?;
        self.call_unit(Method::POST, ADD_CLIENT, Some(&body))
    }

    /// Remove a client from an inbound
    ///
    /// `client_id` is the client's UUID (or password for trojan inbounds).
    pub fn delete_client(&self, inbound_id: i64, client_id: &str) -> Result<(), XuiError> {
        let id = inbound_id.to_string();
        let path = endpoint(DELETE_CLIENT, &[("inboundId", id.as_str()), ("uuid", client_id)]);
        self.call_unit(Method::POST, &path, NO_BODY)
    }

    /// Replace the client identified by `client_id` on an inbound
    pub fn update_client(
        &self,
        inbound_id: i64,
        client_id: &str,
        client: &InboundClient,
    ) -> Result<(), XuiError> {
        let path = endpoint(UPDATE_CLIENT, &[("uuid", client_id)]);
        let body = ClientRequest::new(inbound_id, client)?;
        self.call_unit(Method::POST, &path, Some(&body))
    }

    /// Find a client by email across all inbounds
    ///
    /// Scans the inbound list in order and returns the first match.
    ///
    /// # Errors
    ///
    /// * `XuiError::ClientNotFound` - no inbound has a client with this email
    /// * any error from [`XuiClient::inbounds`]
    pub fn client_by_email(&self, email: &str) -> Result<InboundClient, XuiError> {
        self.inbounds()?
            .iter()
            .flat_map(Inbound::clients)
            .find(|client| client.email == email)
            .cloned()
            .ok_or_else(|| XuiError::ClientNotFound {
                email: email.to_string(),
            })
    }

    /// Fetch the server status snapshot
    pub fn server_status(&self) -> Result<ServerStatus, XuiError> {
        self.call(Method::POST, SERVER_STATUS, NO_BODY)
    }

    /// Bare host name of the configured panel URL, without scheme, port or path
    ///
    /// IPv6 addresses are returned without brackets.
    pub fn host_name(&self) -> Result<String, XuiError> {
        let url = self.transport.base_url();
        url.host_str()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
            .ok_or_else(|| XuiError::InvalidHost(url.to_string()))
    }
}

/// Builder for configuring an x-ui panel client
///
/// The redirect policy of the underlying HTTP client is always forced to
/// `Policy::none()`: the panel signals an expired session with a redirect,
/// which must reach the session transport instead of being followed.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use xui_client::XuiClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = XuiClient::builder()
///     .host("https://panel.example.com:2053")?
///     .credentials("admin", "admin")
///     .session_cookie("x-ui")
///     .session_expired_status(reqwest::StatusCode::UNAUTHORIZED)
///     .client_builder(
///         reqwest::blocking::Client::builder()
///             .timeout(Duration::from_secs(30))
///     )
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct XuiClientBuilder {
    base_url: Option<reqwest::Url>,
    credentials: Option<Credentials>,
    logging: bool,
    session_cookie: String,
    session_expired_status: StatusCode,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl XuiClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            logging: false,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            session_expired_status: DEFAULT_SESSION_EXPIRED_STATUS,
            client_builder: None,
        }
    }

    /// Set the panel URL, including the web base path if the panel has one
    ///
    /// # Errors
    ///
    /// Returns `XuiError::InvalidHost` if the URL cannot be parsed or has no host.
    pub fn host(mut self, url: impl reqwest::IntoUrl) -> Result<Self, XuiError> {
        let url = url
            .into_url()
            .map_err(|e| XuiError::InvalidHost(e.to_string()))?;
        self.base_url = Some(url);
        Ok(self)
    }

    /// Set the panel login credentials
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials {
            username: username.to_string(),
            password: Zeroizing::new(password.to_string()),
        });
        self
    }

    /// Emit `tracing` events for logins and responses (off by default)
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Name of the session cookie set by `/login` (default `3x-ui`)
    pub fn session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    /// Status the panel uses to signal an expired session (default 307)
    pub fn session_expired_status(mut self, status: StatusCode) -> Self {
        self.session_expired_status = status;
        self
    }

    /// Set a custom HTTP client builder
    ///
    /// Replaces the default timeouts. The redirect policy is overridden to
    /// `Policy::none()` regardless of the provided configuration.
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the client with the configured settings
    ///
    /// # Errors
    ///
    /// * `XuiError::ClientInit` - host or credentials missing, or the HTTP client
    ///   cannot be initialized
    pub fn build(self) -> Result<XuiClient, XuiError> {
        let base_url = self
            .base_url
            .ok_or_else(|| XuiError::ClientInit("Panel host is not set".to_string()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| XuiError::ClientInit("Panel credentials are not set".to_string()))?;

        let builder = self.client_builder.unwrap_or_else(|| {
            reqwest::blocking::Client::builder()
                .use_rustls_tls()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
        });

        let client = builder
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| XuiError::ClientInit(e.to_string()))?;

        let transport = SessionTransport::new(
            client,
            base_url,
            credentials,
            self.session_cookie,
            self.session_expired_status,
            self.logging,
        );

        Ok(XuiClient {
            transport: Arc::new(transport),
        })
    }
}

impl Default for XuiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
