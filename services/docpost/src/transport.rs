use bytes::Bytes;
use futures::TryStreamExt;
use http::header::{ACCEPT, CONTENT_TYPE, DATE};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use docpost_core::hash::base64_sha256;
use docpost_core::time::{format_http_date, now};
use docpost_core::{ByteStream, Error, Result, Signer, SigningKey};

use crate::constants::*;
use crate::model::{ErrorMessage, SenderId};
use crate::Config;

/// Authenticated transport shared by every capability of the client.
///
/// Each request gets the date, sender, content digest, product and
/// signature headers before it is handed to the context's `HttpSend`.
#[derive(Clone, Debug)]
pub struct Transport {
    signer: Signer<SigningKey>,
    sender: SenderId,
    endpoint: String,
}

impl Transport {
    /// Create a transport for the sender configured in `config`.
    pub fn new(config: &Config, signer: Signer<SigningKey>) -> Result<Self> {
        Ok(Self {
            signer,
            sender: config.sender()?,
            endpoint: config.endpoint().to_string(),
        })
    }

    /// The sender that authenticates requests.
    pub fn sender(&self) -> &SenderId {
        &self.sender
    }

    /// Absolute uri of `path` below the resources of `sender`.
    ///
    /// `path` must already be percent encoded.
    pub fn sender_uri(&self, sender: &SenderId, path: &str) -> String {
        let sender = percent_encoding::utf8_percent_encode(
            sender.as_str(),
            percent_encoding::NON_ALPHANUMERIC,
        );
        format!("{}/{}/{}", self.endpoint, sender, path.trim_start_matches('/'))
    }

    async fn prepare(
        &self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Request<Bytes>> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(DATE, format_http_date(now()))
            .header(X_DOCPOST_USERID, self.sender.as_str())
            .header(X_DOCPOST_USER_AGENT, USER_AGENT)
            .header(ACCEPT, DOCPOST_MEDIA_TYPE);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if !body.is_empty() {
            builder = builder.header(X_CONTENT_SHA256, base64_sha256(&body));
        }

        let (mut parts, body) = builder
            .body(body)
            .map_err(|e| Error::from(e).with_context("uri", uri))?
            .into_parts();
        self.signer.sign(&mut parts).await?;

        Ok(Request::from_parts(parts, body))
    }

    /// Send a signed request and return the successful response.
    ///
    /// Non 2xx answers become errors: `404` is [`ErrorKind::NotFound`],
    /// anything else [`ErrorKind::Transport`], both carrying the uri and status.
    ///
    /// [`ErrorKind::NotFound`]: docpost_core::ErrorKind::NotFound
    /// [`ErrorKind::Transport`]: docpost_core::ErrorKind::Transport
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Response<Bytes>> {
        let req = self.prepare(method, uri, content_type, body).await?;
        debug!("sending {} {}", req.method(), uri);

        let resp = self
            .signer
            .context()
            .http_send(req)
            .await
            .map_err(|e| e.with_context("uri", uri))?;
        if !resp.status().is_success() {
            return Err(response_error(uri, resp.status(), resp.body()));
        }

        Ok(resp)
    }

    /// Same as [`Transport::send`] but keeps the response body as a stream.
    pub async fn send_stream(&self, method: Method, uri: &str) -> Result<Response<ByteStream>> {
        let req = self.prepare(method, uri, None, Bytes::new()).await?;
        debug!("streaming {} {}", req.method(), uri);

        let resp = self
            .signer
            .context()
            .http_send_stream(req)
            .await
            .map_err(|e| e.with_context("uri", uri))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body: Vec<u8> = resp
                .into_body()
                .map_ok(|chunk| chunk.to_vec())
                .try_concat()
                .await
                .unwrap_or_default();
            return Err(response_error(uri, status, &body));
        }

        Ok(resp)
    }

    /// GET `uri` and decode the json answer.
    pub async fn get_json<T: DeserializeOwned>(&self, uri: &str) -> Result<T> {
        let resp = self.send(Method::GET, uri, None, Bytes::new()).await?;
        decode_json(uri, resp.body())
    }

    /// Send `body` as json, or an empty body, and decode the json answer.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        uri: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T> {
        let resp = match body {
            Some(body) => {
                let bs = serde_json::to_vec(body).map_err(|e| {
                    Error::request_invalid("failed to encode request body").with_source(e)
                })?;
                self.send(method, uri, Some(DOCPOST_MEDIA_TYPE), Bytes::from(bs))
                    .await?
            }
            None => self.send(method, uri, None, Bytes::new()).await?,
        };
        decode_json(uri, resp.body())
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(uri: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        Error::unexpected("failed to decode response body")
            .with_context("uri", uri)
            .with_source(e)
    })
}

pub(crate) fn content_type(resp: &Response<impl Sized>) -> Option<String> {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .map(|v| v.to_string())
}

fn response_error(uri: &str, status: StatusCode, body: &[u8]) -> Error {
    let detail = serde_json::from_slice::<ErrorMessage>(body)
        .ok()
        .filter(|m| !m.error_message.is_empty());

    let message = match &detail {
        Some(m) => format!("server rejected request: {}", m.error_message),
        None => format!(
            "server rejected request: {}",
            status.canonical_reason().unwrap_or("unknown status")
        ),
    };
    let mut err = if status == StatusCode::NOT_FOUND {
        Error::not_found(message)
    } else {
        Error::transport(message)
    };
    err = err.with_status(status).with_context("uri", uri);
    if let Some(code) = detail.and_then(|m| m.error_code) {
        err = err.with_context("error_code", code);
    }
    err
}
