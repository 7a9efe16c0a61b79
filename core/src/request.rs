use std::mem;
use std::str::FromStr;

use http::header::HeaderName;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::Method;
use http::Uri;

use crate::{Error, Result};

/// Signing context for request.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path.
    pub path: String,
    /// HTTP query parameters.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),

            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the context.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        // Return headers back.
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let paq = if self.query.is_empty() {
                    self.path
                } else {
                    let query = form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(self.query.iter())
                        .finish();
                    format!("{}?{}", self.path, query)
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Convert sorted query to percent decoded string.
    ///
    /// Query pairs are already decoded by [`SigningRequest::build`].
    ///
    /// ```shell
    /// [(c, d), (a, b)] => "a=b&c=d"
    /// ```
    pub fn query_to_decoded_string(mut query: Vec<(String, String)>, sep: &str, join: &str) -> String {
        let mut s = String::with_capacity(16);

        // Sort via query name.
        query.sort();

        for (idx, (k, v)) in query.into_iter().enumerate() {
            if idx != 0 {
                s.push_str(join);
            }

            s.push_str(&k);
            s.push_str(sep);
            s.push_str(&v);
        }

        s
    }

    /// Get header value by name.
    ///
    /// Returns `None` if header not found.
    #[inline]
    pub fn header_get(&self, key: &HeaderName) -> Result<Option<&str>> {
        match self.headers.get(key) {
            Some(v) => Ok(Some(v.to_str()?)),
            None => Ok(None),
        }
    }

    /// Convert sorted headers to string.
    ///
    /// ```shell
    /// [(c, d), (a, b)] => "a: b\nc: d\n"
    /// ```
    pub fn header_to_string(mut headers: Vec<(String, String)>, sep: &str, join: &str) -> String {
        let mut s = String::with_capacity(16);

        // Sort via header name.
        headers.sort();

        for (k, v) in headers {
            s.push_str(&k);
            s.push_str(sep);
            s.push_str(&v);
            s.push_str(join);
        }

        s
    }
}
