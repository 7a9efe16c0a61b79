//! `multipart/mixed` request bodies.

use bytes::{BufMut, Bytes, BytesMut};
use http::HeaderValue;
use uuid::Uuid;

use docpost_core::{Error, Result};

/// Builder of a `multipart/mixed` body whose parts are all attachments.
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<Part>,
}

#[derive(Debug)]
struct Part {
    filename: String,
    content_type: String,
    body: Bytes,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    /// Create an empty body with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("docpost-{}", Uuid::new_v4().simple()))
    }

    /// Create an empty body with the given boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Append an attachment part.
    ///
    /// Fails with `RequestInvalid` when the filename or content type would
    /// not fit in a part header line.
    pub fn attachment(
        mut self,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Result<Self> {
        let filename = filename.into();
        let content_type = content_type.into();
        check_content_type(&content_type)?;
        if filename.chars().any(char::is_control) {
            return Err(Error::request_invalid(
                "attachment filename contains control characters",
            ));
        }

        self.parts.push(Part {
            filename,
            content_type,
            body: body.into(),
        });
        Ok(self)
    }

    /// Value of the `Content-Type` header for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    /// Encode all parts.
    pub fn build(self) -> Bytes {
        let size = self
            .parts
            .iter()
            .map(|p| p.body.len() + p.filename.len() + p.content_type.len() + 128)
            .sum::<usize>();
        let mut buf = BytesMut::with_capacity(size + self.boundary.len() + 8);

        for part in self.parts {
            buf.put_slice(b"--");
            buf.put_slice(self.boundary.as_bytes());
            buf.put_slice(b"\r\n");
            buf.put_slice(
                format!(
                    "Content-Disposition: attachment; filename=\"{}\"\r\n",
                    part.filename.replace('"', "\\\"")
                )
                .as_bytes(),
            );
            buf.put_slice(format!("Content-Type: {}\r\n", part.content_type).as_bytes());
            buf.put_slice(b"\r\n");
            buf.put_slice(&part.body);
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        buf.freeze()
    }
}

/// Reject content types that are not a valid header value, such as ones
/// carrying CR or LF.
pub(crate) fn check_content_type(content_type: &str) -> Result<()> {
    HeaderValue::from_str(content_type).map_err(|e| {
        Error::request_invalid("content type is not a valid header value").with_source(e)
    })?;
    Ok(())
}
