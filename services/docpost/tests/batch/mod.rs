use docpost::{BatchStatus, ErrorKind};
use http::StatusCode;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::support::setup;

#[tokio::test]
async fn test_batch_lifecycle() {
    let (server, client) = setup();
    let batches = client.batches();
    let id = Uuid::new_v4();

    let batch = batches.create(id).await.unwrap();
    assert_eq!(batch.uuid, id);
    assert_eq!(batch.status, BatchStatus::Created);
    assert_eq!(batch.items.get("count"), Some(&serde_json::json!(0)));

    let completed = batches.complete(&batch).await.unwrap();
    assert_eq!(completed.status, BatchStatus::Completed);
    assert_eq!(server.batch_status(&id), Some(BatchStatus::Completed));

    let fetched = batches.get(id).await.unwrap();
    assert_eq!(fetched.status, BatchStatus::Completed);
}

#[tokio::test]
async fn test_create_duplicate_batch() {
    let (_server, client) = setup();
    let batches = client.batches();
    let id = Uuid::new_v4();

    batches.create(id).await.unwrap();
    let err = batches.create(id).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateBatch);
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    assert_eq!(err.context("batch"), Some(id.to_string().as_str()));
    assert_eq!(err.context("error_code"), Some("DUPLICATE_BATCH"));
}

#[tokio::test]
async fn test_complete_after_cancel() {
    let (server, client) = setup();
    let batches = client.batches();
    let batch = batches.create(Uuid::new_v4()).await.unwrap();

    batches.cancel(&batch).await.unwrap();
    assert_eq!(server.batch_status(&batch.uuid), Some(BatchStatus::Cancelled));

    // The local value still says CREATED, so the server rejects the transition.
    let err = batches.complete(&batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBatchState);
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    assert_eq!(err.context("operation"), Some("batch.complete"));
    assert_eq!(server.batch_status(&batch.uuid), Some(BatchStatus::Cancelled));
}

#[tokio::test]
async fn test_terminal_batch_is_rejected_locally() {
    let (server, client) = setup();
    let batches = client.batches();
    let batch = batches.create(Uuid::new_v4()).await.unwrap();
    batches.cancel(&batch).await.unwrap();

    let cancelled = batches.get(batch.uuid).await.unwrap();
    let sent = server.requests().len();

    let err = batches.complete(&cancelled).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBatchState);
    let err = batches.cancel(&cancelled).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBatchState);

    assert_eq!(server.requests().len(), sent);
}

#[tokio::test]
async fn test_get_unknown_batch() {
    let (_server, client) = setup();

    let err = client.batches().get(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.context("operation"), Some("batch.get"));
}

#[tokio::test]
async fn test_concurrent_batches() {
    let (server, client) = setup();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                let batches = client.batches();
                let batch = batches.create(Uuid::new_v4()).await?;
                batches.complete(&batch).await
            })
        })
        .collect();

    for task in tasks {
        let batch = task.await.unwrap().unwrap();
        assert_eq!(batch.status, BatchStatus::Completed);
    }
    assert!(server.requests().iter().all(|r| r.verified));
}
