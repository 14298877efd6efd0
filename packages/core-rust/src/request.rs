//! Pending and realized request descriptions.
//!
//! A [`PendingRequest`] is what a capability operation produces: a method,
//! a path relative to the API root, query pairs, headers, and an optional
//! body. Nothing about it is bound to a host yet. Realizing it against a
//! base URL and the client's default headers yields a [`RealizedRequest`],
//! whose `Display` output (plus its headers) is the canonical form used for
//! fingerprinting.

use std::fmt;

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use url::Url;

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Ordered header list. Names compare case-insensitively; insertion order is
/// preserved so the rendered form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any existing values for that name.
    /// A replaced header keeps the position of its first occurrence.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(idx) => {
                self.entries[idx].1 = value;
                let mut seen = false;
                self.entries.retain(|(n, _)| {
                    if !n.eq_ignore_ascii_case(&name) {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Appends a value without touching existing entries of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// One `Name: value` line per header, each terminated by `\n`.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}

// ---------------------------------------------------------------------------
// PendingRequest
// ---------------------------------------------------------------------------

/// An immutable, not-yet-executed description of one remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Headers,
    body: Option<Bytes>,
}

impl PendingRequest {
    /// Creates a request for `method` on `path` (relative to the API root).
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Adds a query pair. Pairs are kept in insertion order.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Sets a request header, replacing earlier values for the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attaches a raw body with the given content type.
    #[must_use]
    pub fn body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.headers.insert("Content-Type", content_type);
        self.body = Some(body.into());
        self
    }

    /// Attaches `value` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `value` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_vec(value)?;
        Ok(self.body("application/json", encoded))
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    #[must_use]
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Binds this request to `base_url`, layering its own headers over
    /// `default_headers`.
    ///
    /// # Errors
    ///
    /// Returns [`RealizeError::InvalidUrl`] if the joined URL does not parse.
    pub fn realize(
        &self,
        base_url: &str,
        default_headers: &Headers,
    ) -> Result<RealizedRequest, RealizeError> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|source| RealizeError::InvalidUrl {
            url: joined.clone(),
            source,
        })?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }

        let mut headers = default_headers.clone();
        for (name, value) in self.headers.iter() {
            headers.insert(name, value);
        }

        Ok(RealizedRequest {
            method: self.method.clone(),
            url,
            headers,
            body: self.body.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// RealizedRequest
// ---------------------------------------------------------------------------

/// A request bound to a concrete URL with its final header set.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl RealizedRequest {
    /// The string the fingerprint is computed over: the request line
    /// followed by the rendered headers.
    #[must_use]
    pub fn canonical_form(&self) -> String {
        format!("{self}{}", self.headers)
    }
}

impl fmt::Display for RealizedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request{{method={}, url={}}}", self.method, self.url)
    }
}

/// Errors from binding a pending request to a concrete URL.
#[derive(Debug, thiserror::Error)]
pub enum RealizeError {
    #[error("invalid request url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("executor cannot describe the realized request: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8080/api/v1/";

    #[test]
    fn headers_insert_replaces_case_insensitively() {
        let mut h = Headers::new();
        h.insert("Accept", "text/plain");
        h.insert("X-Trace", "1");
        h.insert("accept", "application/json");
        assert_eq!(h.len(), 2);
        assert_eq!(h.get("ACCEPT"), Some("application/json"));
        assert_eq!(h.to_string(), "Accept: application/json\nX-Trace: 1\n");
    }

    #[test]
    fn headers_append_keeps_duplicates() {
        let mut h = Headers::new();
        h.append("X-Tag", "a");
        h.append("X-Tag", "b");
        assert_eq!(h.len(), 2);
        assert_eq!(h.get("x-tag"), Some("a"));
    }

    #[test]
    fn headers_insert_collapses_appended_duplicates() {
        let mut h: Headers = [("X-Tag", "a"), ("Other", "o"), ("X-Tag", "b")]
            .into_iter()
            .collect();
        h.insert("x-tag", "c");
        assert_eq!(h.to_string(), "X-Tag: c\nOther: o\n");
    }

    #[test]
    fn realize_joins_base_and_path() {
        let req = PendingRequest::get("/id/doc-123");
        let realized = req.realize(BASE, &Headers::new()).unwrap();
        assert_eq!(
            realized.url.as_str(),
            "http://localhost:8080/api/v1/id/doc-123"
        );
        assert_eq!(
            realized.to_string(),
            "Request{method=GET, url=http://localhost:8080/api/v1/id/doc-123}"
        );
    }

    #[test]
    fn realize_encodes_query_in_order() {
        let req = PendingRequest::get("query")
            .query("q", "SELECT * FROM Document")
            .query("pageSize", 10);
        let realized = req.realize(BASE, &Headers::new()).unwrap();
        assert_eq!(
            realized.url.query(),
            Some("q=SELECT+*+FROM+Document&pageSize=10")
        );
    }

    #[test]
    fn request_headers_override_defaults() {
        let defaults: Headers = [("Accept", "application/json"), ("User-Agent", "relaycall")]
            .into_iter()
            .collect();
        let req = PendingRequest::get("path").header("accept", "text/plain");
        let realized = req.realize(BASE, &defaults).unwrap();
        assert_eq!(realized.headers.get("Accept"), Some("text/plain"));
        assert_eq!(realized.headers.get("User-Agent"), Some("relaycall"));
        assert_eq!(realized.headers.len(), 2);
    }

    #[test]
    fn canonical_form_is_request_line_then_headers() {
        let req = PendingRequest::delete("id/x").header("X-Repo", "default");
        let realized = req.realize(BASE, &Headers::new()).unwrap();
        assert_eq!(
            realized.canonical_form(),
            "Request{method=DELETE, url=http://localhost:8080/api/v1/id/x}X-Repo: default\n"
        );
    }

    #[test]
    fn json_body_sets_content_type() {
        let req = PendingRequest::post("path")
            .json(&serde_json::json!({"title": "t"}))
            .unwrap();
        assert_eq!(req.headers().get("content-type"), Some("application/json"));
        assert_eq!(req.body_bytes().unwrap().as_ref(), br#"{"title":"t"}"#);
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let req = PendingRequest::get("path");
        let err = req.realize("not a url", &Headers::new()).unwrap_err();
        assert!(matches!(err, RealizeError::InvalidUrl { .. }));
    }
}
