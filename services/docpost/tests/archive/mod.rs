use std::collections::BTreeMap;

use bytes::Bytes;
use docpost::{Archive, ArchiveDocument, DocumentContent, ErrorKind, SenderId};
use futures::io::Cursor;
use futures::TryStreamExt;
use http::StatusCode;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::support::{is_dropped, setup, TrackedReader, SENDER};

fn invoice() -> ArchiveDocument {
    ArchiveDocument::new("invoice.pdf", "application/pdf")
        .with_reference_id("INV-1")
        .with_attribute("customer", "42")
}

fn letter() -> ArchiveDocument {
    ArchiveDocument::new("letter.txt", "text/plain")
}

#[tokio::test]
async fn test_send_two_documents() {
    let (server, client) = setup();
    let (invoice, letter) = (invoice(), letter());

    let archive = client
        .archive_builder(Archive::new().with_name("march").with_reference_id("ref-1"))
        .add_file(invoice.clone(), "%PDF-1.7 invoice")
        .add_file(
            letter.clone(),
            DocumentContent::from_reader(Cursor::new(b"dear customer".to_vec())),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(archive.documents.len(), 2);
    assert_eq!(archive.name.as_deref(), Some("march"));
    assert_eq!(archive.reference_id.as_deref(), Some("ref-1"));
    assert!(archive.uri().is_some());

    let stored = archive.document(&invoice.uuid).unwrap();
    assert_eq!(stored.file_name, "invoice.pdf");
    assert_eq!(stored.file_type, "pdf");
    assert_eq!(stored.reference_id.as_deref(), Some("INV-1"));
    assert_eq!(stored.attributes.get("customer").map(String::as_str), Some("42"));
    assert_eq!(stored.content_length, Some(16));

    let stored = archive.document(&letter.uuid).unwrap();
    assert_eq!(stored.content_type, "text/plain");
    assert_eq!(stored.content_length, Some(13));

    assert_eq!(
        server.content_of(&letter.uuid),
        Some(Bytes::from_static(b"dear customer"))
    );
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, format!("/{SENDER}/archives"));
    assert!(requests[0].verified);
}

#[tokio::test]
async fn test_add_order_does_not_matter() {
    let docs = [
        (invoice(), Bytes::from_static(b"%PDF-1.7 invoice")),
        (letter(), Bytes::from_static(b"dear customer")),
        (
            ArchiveDocument::new("scan.png", "image/png"),
            Bytes::from_static(&[0x89, b'P', b'N', b'G']),
        ),
    ];

    let mut committed = Vec::new();
    for order in [[0, 1, 2], [2, 0, 1]] {
        let (server, client) = setup();
        let builder = order.iter().fold(
            client.archive_builder(Archive::new()),
            |builder, &i| builder.add_file(docs[i].0.clone(), docs[i].1.clone()),
        );
        let archive = builder.send().await.unwrap();

        let set: BTreeMap<Uuid, (String, Option<Bytes>)> = archive
            .documents
            .iter()
            .map(|d| (d.uuid, (d.file_name.clone(), server.content_of(&d.uuid))))
            .collect();
        committed.push(set);
    }

    assert_eq!(committed[0], committed[1]);
    for (document, content) in &docs {
        assert_eq!(
            committed[0][&document.uuid],
            (document.file_name.clone(), Some(content.clone()))
        );
    }
}

#[tokio::test]
async fn test_send_without_documents() {
    let (server, client) = setup();

    let err = client
        .archive_builder(Archive::new())
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_send_same_document_twice() {
    let (server, client) = setup();
    let doc = letter();

    let err = client
        .archive_builder(Archive::new())
        .add_file(doc.clone(), "a")
        .add_file(doc, "b")
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_send_server_failure() {
    let (server, client) = setup();
    server.fail_next(StatusCode::INTERNAL_SERVER_ERROR);

    let err = client
        .archive_builder(Archive::new().with_reference_id("ref-500"))
        .add_file(letter(), "hello")
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ArchiveSend);
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(err.is_server_error());
    assert_eq!(err.context("operation"), Some("archive.send"));
    assert_eq!(err.context("reference"), Some("ref-500"));

    // A new builder succeeds once the server recovers.
    let archive = client
        .archive_builder(Archive::new().with_reference_id("ref-500"))
        .add_file(letter(), "hello")
        .send()
        .await
        .unwrap();
    assert_eq!(archive.documents.len(), 1);
}

#[tokio::test]
async fn test_send_failure_without_reference() {
    let (server, client) = setup();
    server.fail_next(StatusCode::INTERNAL_SERVER_ERROR);

    let err = client
        .archive_builder(Archive::new())
        .add_file(letter(), "hello")
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ArchiveSend);
    assert_eq!(err.context("operation"), Some("archive.send"));
    assert_eq!(err.context("reference"), None);
    assert!(!err.to_string().contains("reference"));
}

#[tokio::test]
async fn test_send_rejects_archive_with_listed_documents() {
    let (server, client) = setup();
    let mut archive = Archive::new();
    archive
        .documents
        .push(ArchiveDocument::new("stale.pdf", "application/pdf"));
    let reader = TrackedReader::new(b"fresh");
    let dropped = reader.dropped();

    let err = client
        .archive_builder(archive)
        .add_file(letter(), DocumentContent::from_reader(reader))
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert_eq!(err.context("documents"), Some("1"));
    assert!(is_dropped(&dropped));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_send_rejects_content_type_with_line_break() {
    let (server, client) = setup();
    let doc = ArchiveDocument::new("a.txt", "text/plain\r\nX-Injected: 1");

    let err = client
        .archive_builder(Archive::new())
        .add_file(doc.clone(), "hello")
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert_eq!(err.context("document"), Some(doc.uuid.to_string().as_str()));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_readers_released_when_document_added_twice() {
    let (server, client) = setup();
    let doc = letter();
    let (first, second) = (TrackedReader::new(b"a"), TrackedReader::new(b"b"));
    let dropped = [first.dropped(), second.dropped()];

    let err = client
        .archive_builder(Archive::new())
        .add_file(doc.clone(), DocumentContent::from_reader(first))
        .add_file(doc, DocumentContent::from_reader(second))
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(dropped.iter().all(|d| is_dropped(d)));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_readers_released_when_read_fails() {
    let (server, client) = setup();
    let broken = letter();
    let readers = [
        TrackedReader::new(b"first"),
        TrackedReader::failing(b"partial"),
        TrackedReader::new(b"never read"),
    ];
    let dropped: Vec<_> = readers.iter().map(TrackedReader::dropped).collect();
    let [first, second, third] = readers;

    let err = client
        .archive_builder(Archive::new())
        .add_file(invoice(), DocumentContent::from_reader(first))
        .add_file(broken.clone(), DocumentContent::from_reader(second))
        .add_file(
            ArchiveDocument::new("scan.png", "image/png"),
            DocumentContent::from_reader(third),
        )
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ArchiveSend);
    assert_eq!(err.context("document"), Some(broken.uuid.to_string().as_str()));
    assert!(dropped.iter().all(|d| is_dropped(d)));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_readers_released_when_server_fails() {
    let (server, client) = setup();
    server.fail_next(StatusCode::INTERNAL_SERVER_ERROR);
    let (first, second) = (TrackedReader::new(b"one"), TrackedReader::new(b"two"));
    let dropped = [first.dropped(), second.dropped()];

    let err = client
        .archive_builder(Archive::new().with_reference_id("ref-drop"))
        .add_file(invoice(), DocumentContent::from_reader(first))
        .add_file(letter(), DocumentContent::from_reader(second))
        .send()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ArchiveSend);
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(dropped.iter().all(|d| is_dropped(d)));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_lookup() {
    let (_server, client) = setup();
    let doc = invoice();
    client
        .archive_builder(Archive::new().with_reference_id("ref-a"))
        .add_file(doc.clone(), "first")
        .send()
        .await
        .unwrap();
    client
        .archive_builder(Archive::new().with_reference_id("ref-a"))
        .add_file(letter(), "second")
        .send()
        .await
        .unwrap();
    client
        .archive_builder(Archive::new().with_reference_id("ref b"))
        .add_file(letter(), "third")
        .send()
        .await
        .unwrap();

    let reader = client.archives();
    let sender = SenderId::new(SENDER);

    let archive = reader.get_by_uuid(&sender, doc.uuid).await.unwrap();
    assert!(archive.document(&doc.uuid).is_some());
    let again = reader.get(archive.uri().unwrap()).await.unwrap();
    assert_eq!(again, archive);

    assert_eq!(reader.get_by_reference(&sender, "ref-a").await.unwrap().len(), 2);
    assert_eq!(reader.get_by_reference(&sender, "ref b").await.unwrap().len(), 1);
    assert_eq!(reader.list(&sender).await.unwrap().len(), 3);

    let err = reader
        .get_by_uuid(&sender, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.context("operation"), Some("archive.get_by_uuid"));
}

#[tokio::test]
async fn test_download_content() {
    let (_server, client) = setup();
    let doc = invoice();
    let archive = client
        .archive_builder(Archive::new())
        .add_file(doc.clone(), "%PDF-1.7 invoice")
        .send()
        .await
        .unwrap();
    let stored = archive.document(&doc.uuid).unwrap();

    let content = client.archives().content(stored).await.unwrap();
    assert_eq!(content.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(content.bytes, Bytes::from_static(b"%PDF-1.7 invoice"));

    let stream = client.archives().content_stream(stored).await.unwrap();
    assert_eq!(stream.content_type(), Some("application/pdf"));
    let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"%PDF-1.7 invoice".to_vec());

    // Local metadata carries no server links yet.
    let err = client.archives().content(&doc).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
}

#[tokio::test]
async fn test_add_uuid_reuses_content() {
    let (server, client) = setup();
    let doc = invoice();
    let archive = client
        .archive_builder(Archive::new())
        .add_file(doc.clone(), "shared bytes")
        .send()
        .await
        .unwrap();
    let new_uuid = Uuid::new_v4();

    let updated = client
        .archive_mutations()
        .add_uuid(archive.document(&doc.uuid).unwrap(), new_uuid)
        .await
        .unwrap();

    assert_eq!(updated.documents.len(), 2);
    let copy = updated.document(&new_uuid).unwrap();
    assert_eq!(copy.file_name, "invoice.pdf");
    assert_eq!(
        server.content_of(&new_uuid),
        Some(Bytes::from_static(b"shared bytes"))
    );
    // Content bytes were uploaded once.
    let uploads = server
        .requests()
        .iter()
        .filter(|r| r.path.ends_with("/archives"))
        .count();
    assert_eq!(uploads, 1);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (server, client) = setup();
    let doc = letter();
    let archive = client
        .archive_builder(Archive::new())
        .add_file(doc.clone(), "bye")
        .send()
        .await
        .unwrap();
    let stored = archive.document(&doc.uuid).unwrap();

    let mutations = client.archive_mutations();
    mutations.delete(stored).await.unwrap();
    assert_eq!(server.content_of(&doc.uuid), None);

    // The document is already gone: 404 counts as deleted.
    mutations.delete(stored).await.unwrap();
    mutations
        .delete_document(stored.link("delete").unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_other_failure_surfaces() {
    let (server, client) = setup();
    let doc = letter();
    let archive = client
        .archive_builder(Archive::new())
        .add_file(doc.clone(), "bye")
        .send()
        .await
        .unwrap();

    server.fail_next(StatusCode::SERVICE_UNAVAILABLE);
    let err = client
        .archive_mutations()
        .delete(archive.document(&doc.uuid).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
}
