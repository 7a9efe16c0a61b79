use bytes::Bytes;
use http::Method;
use log::warn;

use docpost_core::{Error, ErrorKind, Result};

use crate::constants::{REL_DELETE, REL_GET_CONTENT, REL_GET_CONTENT_STREAM};
use crate::content::{ContentStream, DocumentBytes};
use crate::model::{Inbox as InboxPage, InboxDocument};
use crate::transport::{content_type, Transport};

/// Documents delivered to the sender's own inbox.
#[derive(Debug, Clone)]
pub struct Inbox {
    transport: Transport,
}

impl Inbox {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List one page of inbox documents, oldest first.
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<InboxDocument>> {
        let uri = self.transport.sender_uri(
            self.transport.sender(),
            &format!("inbox?offset={offset}&limit={limit}"),
        );
        let page: InboxPage = self
            .transport
            .get_json(&uri)
            .await
            .map_err(|e| e.with_operation("inbox.list"))?;
        Ok(page.documents)
    }

    /// Download the content of an inbox document into memory.
    pub async fn content(&self, document: &InboxDocument) -> Result<DocumentBytes> {
        let uri = link(document, REL_GET_CONTENT, "inbox.content")?;
        let resp = self
            .transport
            .send(Method::GET, uri, None, Bytes::new())
            .await
            .map_err(|e| {
                e.with_operation("inbox.content")
                    .with_context("document", &document.id)
            })?;

        Ok(DocumentBytes {
            content_type: content_type(&resp),
            bytes: resp.into_body(),
        })
    }

    /// Stream the content of an inbox document.
    pub async fn content_stream(&self, document: &InboxDocument) -> Result<ContentStream> {
        let uri = match document.link(REL_GET_CONTENT_STREAM) {
            Some(uri) => uri,
            None => link(document, REL_GET_CONTENT, "inbox.content_stream")?,
        };
        let resp = self
            .transport
            .send_stream(Method::GET, uri)
            .await
            .map_err(|e| {
                e.with_operation("inbox.content_stream")
                    .with_context("document", &document.id)
            })?;

        let content_type = content_type(&resp);
        Ok(ContentStream::new(content_type, resp.into_body()))
    }

    /// Remove a document from the inbox. A document that is already gone
    /// counts as deleted.
    pub async fn delete(&self, document: &InboxDocument) -> Result<()> {
        let uri = link(document, REL_DELETE, "inbox.delete")?;
        match self
            .transport
            .send(Method::DELETE, uri, None, Bytes::new())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("inbox document {} is already deleted", document.id);
                Ok(())
            }
            Err(e) => Err(e
                .with_operation("inbox.delete")
                .with_context("document", &document.id)),
        }
    }
}

fn link<'a>(document: &'a InboxDocument, rel: &str, operation: &'static str) -> Result<&'a str> {
    document.link(rel).ok_or_else(|| {
        Error::request_invalid(format!("inbox document has no {rel} link"))
            .with_operation(operation)
            .with_context("document", &document.id)
    })
}
