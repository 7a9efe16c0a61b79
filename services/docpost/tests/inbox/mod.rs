use bytes::Bytes;
use pretty_assertions::assert_eq;

use crate::support::setup;

#[tokio::test]
async fn test_list_pages() {
    let (server, client) = setup();
    for i in 0..5 {
        server.deliver(&format!("letter {i}"), "text/plain", "hello");
    }

    let inbox = client.inbox();
    let first = inbox.list(0, 2).await.unwrap();
    let rest = inbox.list(2, 10).await.unwrap();

    assert_eq!(
        first.iter().map(|d| d.subject.as_str()).collect::<Vec<_>>(),
        vec!["letter 0", "letter 1"]
    );
    assert_eq!(rest.len(), 3);
    assert_eq!(rest[0].sender, "Acme Corp");

    let request = server.requests().pop().unwrap();
    assert_eq!(request.path, "/1001/inbox");
    assert!(request.verified);
}

#[tokio::test]
async fn test_content_and_delete() {
    let (server, client) = setup();
    let delivered = server.deliver("payslip", "application/pdf", "%PDF-1.4 payslip");

    let inbox = client.inbox();
    let document = inbox.list(0, 10).await.unwrap().remove(0);
    assert_eq!(document, delivered);

    let content = inbox.content(&document).await.unwrap();
    assert_eq!(content.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(content.bytes, Bytes::from_static(b"%PDF-1.4 payslip"));

    let streamed = inbox
        .content_stream(&document)
        .await
        .unwrap()
        .read_to_end()
        .await
        .unwrap();
    assert_eq!(streamed, content);

    inbox.delete(&document).await.unwrap();
    assert!(inbox.list(0, 10).await.unwrap().is_empty());

    // Deleting twice succeeds.
    inbox.delete(&document).await.unwrap();
}
