use std::collections::HashSet;

use bytes::Bytes;
use http::Method;
use log::debug;

use docpost_core::{Error, ErrorKind, Result};

use crate::constants::{ARCHIVE_PART_NAME, DOCPOST_MEDIA_TYPE};
use crate::content::DocumentContent;
use crate::model::{Archive, ArchiveDocument, SenderId};
use crate::multipart::{check_content_type, MultipartBody};
use crate::transport::{decode_json, Transport};

/// Accumulates documents and commits them as one archive.
///
/// The builder is a move-only value: [`ArchiveBuilder::add_file`] hands it
/// back and [`ArchiveBuilder::send`] consumes it, so a builder can never be
/// used after it was sent, successfully or not.
///
/// ```compile_fail
/// # async fn example(client: docpost::Client, doc: docpost::ArchiveDocument) -> docpost::Result<()> {
/// let builder = client.archive_builder(docpost::Archive::new());
/// let builder = builder.add_file(doc, "content");
/// let archive = builder.send().await?;
/// // The builder moved into `send`.
/// let again = builder.send().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArchiveBuilder {
    transport: Transport,
    sender: SenderId,
    archive: Archive,
    files: Vec<(ArchiveDocument, DocumentContent)>,
}

impl ArchiveBuilder {
    pub(crate) fn new(transport: Transport, sender: SenderId, archive: Archive) -> Self {
        Self {
            transport,
            sender,
            archive,
            files: Vec::new(),
        }
    }

    /// Add one document with its content.
    pub fn add_file(
        mut self,
        document: ArchiveDocument,
        content: impl Into<DocumentContent>,
    ) -> Self {
        self.files.push((document, content.into()));
        self
    }

    /// Number of documents added so far.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no document was added yet.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Commit all documents as one multipart request.
    ///
    /// The archive handed to the builder must not list documents of its
    /// own; only documents added with [`ArchiveBuilder::add_file`] are sent.
    /// Every content reader is read to the end or dropped before this
    /// returns. Any failure is [`ErrorKind::ArchiveSend`] unless the request
    /// could not be built or signed at all; either way the builder is gone
    /// and a new one must be created to retry.
    pub async fn send(self) -> Result<Archive> {
        let Self {
            transport,
            sender,
            mut archive,
            files,
        } = self;
        let reference = archive.reference_id.clone();
        let annotate = |e: Error| {
            let e = e.with_operation("archive.send");
            match &reference {
                Some(reference) => e.with_context("reference", reference),
                None => e,
            }
        };

        // Validation happens before any content is read.
        if files.is_empty() {
            return Err(annotate(Error::request_invalid(
                "archive must contain at least one document",
            )));
        }
        if !archive.documents.is_empty() {
            return Err(annotate(
                Error::request_invalid("archive already lists documents, use add_file instead")
                    .with_context("documents", archive.documents.len()),
            ));
        }
        let mut seen = HashSet::with_capacity(files.len());
        for (document, _) in &files {
            if !seen.insert(document.uuid) {
                return Err(annotate(
                    Error::request_invalid("document uuid added twice")
                        .with_context("document", document.uuid),
                ));
            }
            check_content_type(&document.content_type)
                .map_err(|e| annotate(e.with_context("document", document.uuid)))?;
        }

        let mut documents = Vec::with_capacity(files.len());
        let mut parts: Vec<(String, String, Bytes)> = Vec::with_capacity(files.len());
        // Readers still in `files` are dropped on early return.
        for (mut document, content) in files {
            let bytes = content.read_all().await.map_err(|e| {
                annotate(
                    e.with_kind(ErrorKind::ArchiveSend)
                        .with_context("document", document.uuid),
                )
            })?;
            document.content_length = Some(bytes.len() as u64);
            parts.push((
                document.uuid.to_string(),
                document.content_type.clone(),
                bytes,
            ));
            documents.push(document);
        }
        archive.documents = documents;

        let metadata = serde_json::to_vec(&archive).map_err(|e| {
            annotate(Error::request_invalid("failed to encode archive").with_source(e))
        })?;
        let mut body = MultipartBody::new()
            .attachment(ARCHIVE_PART_NAME, DOCPOST_MEDIA_TYPE, metadata)
            .map_err(annotate)?;
        for (filename, content_type, bytes) in parts {
            body = body
                .attachment(filename, content_type, bytes)
                .map_err(annotate)?;
        }

        let uri = transport.sender_uri(&sender, "archives");
        debug!(
            "sending archive with {} documents to {}",
            archive.documents.len(),
            uri
        );
        let resp = transport
            .send(
                Method::POST,
                &uri,
                Some(&body.content_type()),
                body.build(),
            )
            .await
            .map_err(|e| annotate(as_archive_send(e)))?;

        decode_json(&uri, resp.body()).map_err(|e| annotate(as_archive_send(e)))
    }
}

fn as_archive_send(err: Error) -> Error {
    match err.kind() {
        ErrorKind::Transport | ErrorKind::NotFound | ErrorKind::Unexpected => {
            err.with_kind(ErrorKind::ArchiveSend)
        }
        _ => err,
    }
}
