use async_trait::async_trait;
use http::header::DATE;
use http::request::Parts;
use http::{HeaderName, HeaderValue};
use log::debug;

use docpost_core::{signature, Context, Error, Result, SignRequest, SigningKey, SigningRequest};

use crate::constants::{X_CONTENT_SHA256, X_DOCPOST_SIGNATURE, X_DOCPOST_USERID};

/// RequestSigner computes the docpost request signature.
///
/// The canonical representation is, each line terminated by `\n`:
///
/// ```text
/// {METHOD}
/// {path, lower case}
/// date: {Date}
/// x-content-sha256: {X-Content-SHA256}      (only when present)
/// x-docpost-userid: {X-Docpost-UserId}
/// {sorted decoded query k=v joined by &, lower case}
/// ```
///
/// The base64 RSA-SHA256 signature of these bytes goes into `X-Docpost-Signature`.
#[derive(Debug, Default)]
pub struct RequestSigner {}

impl RequestSigner {
    /// Create a new request signer.
    pub fn new() -> Self {
        Self {}
    }
}

/// Build the canonical request representation that is signed.
pub fn canonical_request_string(req: &SigningRequest) -> Result<String> {
    let mut s = String::with_capacity(256);
    s.push_str(req.method.as_str());
    s.push('\n');
    s.push_str(&req.path.to_lowercase());
    s.push('\n');

    let mut headers = Vec::with_capacity(3);
    for (name, required) in [
        (DATE, true),
        (HeaderName::from_static(X_CONTENT_SHA256), false),
        (HeaderName::from_static(X_DOCPOST_USERID), true),
    ] {
        match req.header_get(&name)? {
            Some(v) => headers.push((name.as_str().to_string(), v.to_string())),
            None if required => {
                return Err(Error::request_invalid(format!(
                    "header {name} is required for signing"
                )))
            }
            None => {}
        }
    }
    s.push_str(&SigningRequest::header_to_string(headers, ": ", "\n"));

    s.push_str(&SigningRequest::query_to_decoded_string(req.query.clone(), "=", "&").to_lowercase());
    s.push('\n');

    Ok(s)
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = SigningKey;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(key) = credential else {
            return Err(Error::request_invalid("no signing key available"));
        };

        let mut signing_req = SigningRequest::build(req)?;

        let canonical = canonical_request_string(&signing_req)?;
        debug!("canonical request: {:?}", &canonical);

        let signature = signature::sign_base64(key, canonical.as_bytes())?;
        signing_req
            .headers
            .insert(X_DOCPOST_SIGNATURE, HeaderValue::from_str(&signature)?);

        signing_req.apply(req)
    }
}
