//! Cookie session transport
//!
//! Every panel endpoint except `/login` needs the session cookie. The
//! transport logs in lazily on first use and, when the panel answers with
//! its session-expired status, logs in again and replays the request once.

use crate::error::{AuthError, XuiError};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, COOKIE, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use zeroize::{Zeroize, Zeroizing};

/// Path of the login endpoint
pub(crate) const LOGIN_PATH: &str = "/login";

/// Cookie the panel keeps its session in
pub(crate) const DEFAULT_SESSION_COOKIE: &str = "3x-ui";

/// Status the panel answers with once the session is gone (redirect to login)
pub(crate) const DEFAULT_SESSION_EXPIRED_STATUS: StatusCode = StatusCode::TEMPORARY_REDIRECT;

/// Panel login credentials
pub(crate) struct Credentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Status and body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Holds the session token and issues authenticated requests
pub(crate) struct SessionTransport {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    cookie_name: String,
    expired_status: StatusCode,
    logging: bool,
    /// `name=value` of the session cookie, `None` until the first login
    token: Mutex<Option<Zeroizing<String>>>,
}

impl fmt::Debug for SessionTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTransport")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .field("cookie_name", &self.cookie_name)
            .field("expired_status", &self.expired_status)
            .field("logging", &self.logging)
            .field("logged_in", &self.lock_token().is_some())
            .finish()
    }
}

impl SessionTransport {
    pub(crate) fn new(
        client: Client,
        base_url: Url,
        credentials: Credentials,
        cookie_name: String,
        expired_status: StatusCode,
        logging: bool,
    ) -> Self {
        Self {
            client,
            base_url,
            credentials,
            cookie_name,
            expired_status,
            logging,
            token: Mutex::new(None),
        }
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a session token is currently held
    pub(crate) fn has_session(&self) -> bool {
        self.lock_token().is_some()
    }

    /// The token is always left whole, so a poisoned lock is still usable
    fn lock_token(&self) -> MutexGuard<'_, Option<Zeroizing<String>>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log in and store the new session token, replacing any previous one
    pub(crate) fn login(&self) -> Result<(), XuiError> {
        let mut token = self.lock_token();
        *token = Some(self.authenticate()?);
        Ok(())
    }

    /// Perform the login exchange and return the `name=value` session cookie
    fn authenticate(&self) -> Result<Zeroizing<String>, XuiError> {
        let body = LoginRequest {
            username: &self.credentials.username,
            password: &self.credentials.password,
        };

        let request = self.client.post(self.url(LOGIN_PATH)?);
        let response = with_json_body(request, &body)?.send()?;

        let status = response.status();
        if status != StatusCode::OK {
            if self.logging {
                tracing::warn!(%status, "Panel rejected login");
            }
            return Err(AuthError::Rejected { status }.into());
        }

        let token = response
            .cookies()
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| Zeroizing::new(format!("{}={}", cookie.name(), cookie.value())))
            .ok_or_else(|| AuthError::MissingCookie {
                name: self.cookie_name.clone(),
            })?;

        if self.logging {
            tracing::info!(host = %self.base_url, "Logged in to panel");
        }

        Ok(token)
    }

    /// Return the current token, logging in first if there is none
    fn current_token(&self, path: &str) -> Result<Option<Zeroizing<String>>, XuiError> {
        let mut token = self.lock_token();
        if token.is_none() && path != LOGIN_PATH {
            *token = Some(self.authenticate()?);
        }
        Ok(token.clone())
    }

    /// Replace a token the panel reported as expired
    ///
    /// If another caller already replaced `stale` while our request was in
    /// flight, its token is reused instead of logging in again.
    fn refresh_token(
        &self,
        stale: Option<&Zeroizing<String>>,
    ) -> Result<Zeroizing<String>, XuiError> {
        let mut token = self.lock_token();
        match (token.as_ref(), stale) {
            (Some(current), Some(stale)) if current.as_str() != stale.as_str() => {
                Ok(current.clone())
            }
            _ => {
                let fresh = self.authenticate()?;
                *token = Some(fresh.clone());
                Ok(fresh)
            }
        }
    }

    /// Issue a request, logging in lazily and re-logging once on session expiry
    pub(crate) fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<RawResponse, XuiError> {
        let token = self.current_token(path)?;
        let response = self.execute(
            method.clone(),
            path,
            body,
            token.as_ref().map(|token| token.as_str()),
        )?;

        if response.status != self.expired_status {
            return Ok(response);
        }

        if self.logging {
            tracing::warn!(%method, path, "Session expired, logging in again");
        }

        let fresh = self.refresh_token(token.as_ref())?;
        let retried = self.execute(method, path, body, Some(fresh.as_str()))?;

        if retried.status == self.expired_status {
            return Err(XuiError::SessionExpired {
                endpoint: path.to_string(),
            });
        }

        Ok(retried)
    }

    /// Issue a request and decode its JSON body into `T`
    ///
    /// The body must be non-empty and start with `{` or `[`; anything else
    /// (HTML error pages, plain text) is reported as a malformed response
    /// rather than decoded into an empty value.
    pub(crate) fn request_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(StatusCode, T), XuiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(method, path, body)?;
        let value = decode_body(path, &response.body)?;
        Ok((response.status, value))
    }

    /// Single HTTP exchange with the given token, no session handling
    fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<RawResponse, XuiError> {
        let mut request = self.client.request(method.clone(), self.url(path)?);

        if method == Method::GET {
            request = request.header(ACCEPT, "application/json");
        }
        if let Some(token) = token {
            request = request.header(COOKIE, Self::create_cookie_header(token)?);
        }
        if let Some(body) = body {
            request = with_json_body(request, body)?;
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if self.logging {
            tracing::debug!(%method, path, %status, body = %body, "Panel response");
        }

        Ok(RawResponse { status, body })
    }

    /// Create a sensitive cookie header value from the session token
    fn create_cookie_header(token: &str) -> Result<HeaderValue, XuiError> {
        let mut cookie_string = token.to_string();
        let mut header_value = HeaderValue::from_str(&cookie_string)
            .map_err(|_| XuiError::ClientInit("Invalid session cookie format".to_string()))?;

        header_value.set_sensitive(true);
        cookie_string.zeroize();

        Ok(header_value)
    }

    /// Join an endpoint path onto the base URL, keeping any base path prefix
    fn url(&self, path: &str) -> Result<Url, XuiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).map_err(|e| XuiError::InvalidHost(e.to_string()))
    }
}

/// Serialize the body up front so encoding failures surface as [`XuiError::Encode`]
fn with_json_body<B: Serialize + ?Sized>(
    request: RequestBuilder,
    body: &B,
) -> Result<RequestBuilder, XuiError> {
    let bytes = serde_json::to_vec(body)?;
    Ok(request
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(bytes))
}

/// Decode a JSON document, rejecting empty and non-JSON bodies
pub(crate) fn decode_body<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, XuiError> {
    let Some(first) = body.chars().next() else {
        return Err(XuiError::MalformedResponse {
            endpoint: path.to_string(),
            reason: "empty response body".to_string(),
        });
    };

    if first != '{' && first != '[' {
        return Err(XuiError::MalformedResponse {
            endpoint: path.to_string(),
            reason: format!("response is not JSON: {}", excerpt(body)),
        });
    }

    serde_json::from_str(body).map_err(|source| XuiError::Decode {
        endpoint: path.to_string(),
        source,
    })
}

/// First line of a body, shortened for error messages
fn excerpt(body: &str) -> String {
    const MAX_CHARS: usize = 80;
    let line = body.lines().next().unwrap_or_default();
    if line.chars().count() > MAX_CHARS {
        format!("{}...", line.chars().take(MAX_CHARS).collect::<String>())
    } else {
        line.to_string()
    }
}
