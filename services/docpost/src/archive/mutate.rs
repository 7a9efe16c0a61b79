use bytes::Bytes;
use http::Method;
use log::warn;
use serde::Serialize;
use uuid::Uuid;

use docpost_core::{Error, ErrorKind, Result};

use crate::constants::{REL_ADD_UNIQUE_UUID, REL_DELETE};
use crate::model::{Archive, ArchiveDocument};
use crate::transport::Transport;

#[derive(Serialize)]
struct AddUuid {
    uuid: Uuid,
}

/// Mutations on submitted archives.
#[derive(Debug, Clone)]
pub struct ArchiveMutator {
    transport: Transport,
}

impl ArchiveMutator {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Reference the content of `document` under a second identity.
    ///
    /// No bytes are uploaded; returns the updated archive.
    pub async fn add_uuid(&self, document: &ArchiveDocument, new_uuid: Uuid) -> Result<Archive> {
        let annotate = |e: Error| {
            e.with_operation("archive.add_uuid")
                .with_context("document", document.uuid)
                .with_context("new_uuid", new_uuid)
        };
        let uri = document.link(REL_ADD_UNIQUE_UUID).ok_or_else(|| {
            annotate(Error::request_invalid(
                "document has no add_unique_uuid link, fetch it from the server first",
            ))
        })?;

        self.transport
            .send_json(Method::POST, uri, Some(&AddUuid { uuid: new_uuid }))
            .await
            .map_err(annotate)
    }

    /// Delete a document by its delete uri.
    ///
    /// Deleting a document that does not exist (`404 Not Found`) succeeds.
    pub async fn delete_document(&self, delete_uri: &str) -> Result<()> {
        match self
            .transport
            .send(Method::DELETE, delete_uri, None, Bytes::new())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("document at {delete_uri} is already deleted");
                Ok(())
            }
            Err(e) => Err(e.with_operation("archive.delete_document")),
        }
    }

    /// Delete `document` through its `delete` link.
    pub async fn delete(&self, document: &ArchiveDocument) -> Result<()> {
        let uri = document.link(REL_DELETE).ok_or_else(|| {
            Error::request_invalid("document has no delete link, fetch it from the server first")
                .with_operation("archive.delete_document")
                .with_context("document", document.uuid)
        })?;
        self.delete_document(uri).await
    }
}
