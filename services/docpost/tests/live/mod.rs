use std::env;

use docpost::{Archive, ArchiveDocument, BatchStatus, Client, Config, Context};
use docpost_core::OsEnv;
use docpost_file_read_tokio::TokioFileRead;
use docpost_http_send_reqwest::ReqwestHttpSend;
use log::warn;
use uuid::Uuid;

fn init_client() -> Option<Client> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("DOCPOST_TEST").is_err() || env::var("DOCPOST_TEST").unwrap() != "on" {
        return None;
    }

    let ctx = Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let config = Config::new().from_env(&ctx);
    Some(Client::new(ctx, config).expect("DOCPOST_SENDER_ID must be set"))
}

#[tokio::test]
async fn test_live_batch_and_archive() {
    let Some(client) = init_client() else {
        warn!("DOCPOST_TEST is not set, skipped");
        return;
    };

    let batches = client.batches();
    let batch = batches
        .create(Uuid::new_v4())
        .await
        .expect("create batch must succeed");
    batches.cancel(&batch).await.expect("cancel must succeed");
    let batch = batches.get(batch.uuid).await.expect("get must succeed");
    assert_eq!(batch.status, BatchStatus::Cancelled);

    let document = ArchiveDocument::new("live.txt", "text/plain");
    let archive = client
        .archive_builder(Archive::new().with_reference_id(format!("live-{}", Uuid::new_v4())))
        .add_file(document.clone(), "docpost live test")
        .send()
        .await
        .expect("archive send must succeed");
    let stored = archive
        .document(&document.uuid)
        .expect("document must be stored");

    let content = client
        .archives()
        .content(stored)
        .await
        .expect("content must be readable");
    assert_eq!(&content.bytes[..], b"docpost live test");

    client
        .archive_mutations()
        .delete(stored)
        .await
        .expect("delete must succeed");
}

#[tokio::test]
async fn test_live_inbox() {
    let Some(client) = init_client() else {
        warn!("DOCPOST_TEST is not set, skipped");
        return;
    };

    let documents = client.inbox().list(0, 10).await.expect("list must succeed");
    assert!(documents.len() <= 10);
}
