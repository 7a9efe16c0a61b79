use bytes::Bytes;
use http::Method;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use uuid::Uuid;

use docpost_core::{Error, Result};

use crate::constants::{REL_GET_CONTENT, REL_GET_CONTENT_STREAM};
use crate::content::{ContentStream, DocumentBytes};
use crate::model::{Archive, ArchiveDocument, Archives, SenderId};
use crate::transport::{content_type, Transport};

/// Read access to submitted archives.
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    transport: Transport,
}

impl ArchiveReader {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Fetch an archive by its server assigned uri.
    pub async fn get(&self, uri: &str) -> Result<Archive> {
        self.transport
            .get_json(uri)
            .await
            .map_err(|e| e.with_operation("archive.get"))
    }

    /// Fetch the archive holding the document with `uuid`.
    pub async fn get_by_uuid(&self, sender: &SenderId, uuid: Uuid) -> Result<Archive> {
        let uri = self
            .transport
            .sender_uri(sender, &format!("archives/documents/{uuid}"));
        self.transport.get_json(&uri).await.map_err(|e| {
            e.with_operation("archive.get_by_uuid")
                .with_context("document", uuid)
        })
    }

    /// Fetch every archive sharing `reference_id`.
    pub async fn get_by_reference(
        &self,
        sender: &SenderId,
        reference_id: &str,
    ) -> Result<Vec<Archive>> {
        let uri = self.transport.sender_uri(
            sender,
            &format!(
                "archives/by-reference/{}",
                utf8_percent_encode(reference_id, NON_ALPHANUMERIC)
            ),
        );
        let archives: Archives = self.transport.get_json(&uri).await.map_err(|e| {
            e.with_operation("archive.get_by_reference")
                .with_context("reference", reference_id)
        })?;
        Ok(archives.archives)
    }

    /// List the archives of `sender`.
    pub async fn list(&self, sender: &SenderId) -> Result<Vec<Archive>> {
        let uri = self.transport.sender_uri(sender, "archives");
        let archives: Archives = self
            .transport
            .get_json(&uri)
            .await
            .map_err(|e| e.with_operation("archive.list"))?;
        Ok(archives.archives)
    }

    /// Download the content of `document` into memory.
    pub async fn content(&self, document: &ArchiveDocument) -> Result<DocumentBytes> {
        let uri = document_link(document, &[REL_GET_CONTENT])?;
        let resp = self
            .transport
            .send(Method::GET, uri, None, Bytes::new())
            .await
            .map_err(|e| {
                e.with_operation("archive.content")
                    .with_context("document", document.uuid)
            })?;

        Ok(DocumentBytes {
            content_type: content_type(&resp),
            bytes: resp.into_body(),
        })
    }

    /// Stream the content of `document`.
    ///
    /// The returned stream must be read to the end, closed or dropped to
    /// release its connection.
    pub async fn content_stream(&self, document: &ArchiveDocument) -> Result<ContentStream> {
        let uri = document_link(document, &[REL_GET_CONTENT_STREAM, REL_GET_CONTENT])?;
        let resp = self
            .transport
            .send_stream(Method::GET, uri)
            .await
            .map_err(|e| {
                e.with_operation("archive.content_stream")
                    .with_context("document", document.uuid)
            })?;

        let content_type = content_type(&resp);
        Ok(ContentStream::new(content_type, resp.into_body()))
    }
}

fn document_link<'a>(document: &'a ArchiveDocument, rels: &[&str]) -> Result<&'a str> {
    rels.iter()
        .find_map(|rel| document.link(rel))
        .ok_or_else(|| {
            Error::request_invalid(format!(
                "document has no {} link, fetch it from the server first",
                rels[0]
            ))
            .with_context("document", document.uuid)
        })
}
