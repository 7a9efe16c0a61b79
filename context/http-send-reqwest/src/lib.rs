//! Reqwest-based http transport for docpost.
//!
//! Timeouts, proxies and connection pooling are configured on the
//! `reqwest::Client` handed to [`ReqwestHttpSend::new`].
//!
//! ```no_run
//! use std::time::Duration;
//! use docpost_core::Context;
//! use docpost_http_send_reqwest::ReqwestHttpSend;
//!
//! # fn example() -> Result<(), reqwest::Error> {
//! let client = reqwest::Client::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use docpost_core::{ByteStream, Error, HttpSend, Result};
use futures::{StreamExt, TryStreamExt};
use log::debug;
use reqwest::{Client, Request, Response};

#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn execute(&self, req: http::Request<Bytes>) -> Result<Response> {
        let uri = req.uri().to_string();
        let req = Request::try_from(req).map_err(|e| {
            Error::request_invalid("failed to build http request")
                .with_context("uri", &uri)
                .with_source(e)
        })?;

        debug!("sending {} {}", req.method(), uri);
        self.client.execute(req).await.map_err(|e| {
            let message = if e.is_timeout() {
                "http request timed out"
            } else {
                "http request failed"
            };
            Error::transport(message).with_context("uri", &uri).with_source(e)
        })
    }
}

fn response_parts(resp: &Response) -> http::response::Builder {
    let mut builder = http::Response::builder()
        .status(resp.status())
        .version(resp.version());
    for (name, value) in resp.headers() {
        builder = builder.header(name, value);
    }
    builder
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let resp = self.execute(req).await?;
        let builder = response_parts(&resp);
        let uri = resp.url().to_string();

        let body = resp.bytes().await.map_err(|e| {
            Error::transport("failed to read response body")
                .with_context("uri", &uri)
                .with_source(e)
        })?;
        Ok(builder.body(body)?)
    }

    async fn http_send_stream(
        &self,
        req: http::Request<Bytes>,
    ) -> Result<http::Response<ByteStream>> {
        let resp = self.execute(req).await?;
        let builder = response_parts(&resp);
        let uri = resp.url().to_string();

        let stream = resp
            .bytes_stream()
            .map_err(move |e| {
                Error::transport("failed to read response body")
                    .with_context("uri", &uri)
                    .with_source(e)
            })
            .boxed();
        Ok(builder.body(stream)?)
    }
}
