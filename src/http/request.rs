//! Fezz HTTP Request type providing a fetch-like API.

use crate::handler::FezzError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Base used to resolve relative request URLs such as `/api/users?page=2`.
const RELATIVE_BASE: &str = "http://localhost";

/// HTTP method enumeration.
///
/// Methods outside the common set are kept as [`Method::Other`] with their
/// upper-cased name, so they still reach routing and the not-found hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    /// Any other valid method token, e.g. `TRACE` or `PURGE`.
    Other(String),
}

impl Method {
    /// Get the canonical upper-case method name.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Other(name) => name,
        }
    }
}

/// RFC 9110 `tchar`.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = FezzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other if !other.is_empty() && other.chars().all(is_token_char) => {
                Ok(Method::Other(other.to_string()))
            }
            other => Err(FezzError::new(format!("invalid HTTP method: {:?}", other))),
        }
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        match method {
            Method::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = FezzError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<&hyper::Method> for Method {
    fn from(method: &hyper::Method) -> Self {
        // hyper only admits valid tokens, so parsing cannot fail here.
        method
            .as_str()
            .parse()
            .unwrap_or_else(|_| Method::Other(method.as_str().to_ascii_uppercase()))
    }
}

/// Fetch-like HTTP request handed to every hook and handler.
///
/// The pipeline only ever borrows the request; handlers cannot mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FezzRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URL, absolute (`https://host/path?q`) or origin-relative (`/path?q`).
    pub url: String,
    /// HTTP headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Bytes>,
}

impl FezzRequest {
    /// Create a new FezzRequest.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a header value. Header names are compared case-insensitively.
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    /// Parse the request URL.
    pub fn parsed_url(&self) -> Result<Url, FezzError> {
        match Url::parse(&self.url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
                .and_then(|base| base.join(&self.url))
                .map_err(|e| FezzError::InvalidUrl(format!("{}: {}", self.url, e))),
            Err(e) => Err(FezzError::InvalidUrl(format!("{}: {}", self.url, e))),
        }
    }

    /// Get the URL path component.
    pub fn path(&self) -> Result<String, FezzError> {
        Ok(self.parsed_url()?.path().to_string())
    }

    /// Get the decoded query string parameters. Repeated keys keep the last value.
    pub fn query(&self) -> Result<HashMap<String, String>, FezzError> {
        Ok(self
            .parsed_url()?
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect())
    }

    /// Get the body as text if present.
    pub fn text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
    }

    /// Parse the body as JSON if present.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.body
            .as_ref()
            .map(|b| serde_json::from_slice(b))
    }
}

impl Default for FezzRequest {
    fn default() -> Self {
        Self::new(Method::Get, "/")
    }
}
