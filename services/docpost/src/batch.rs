//! Batch lifecycle: `CREATED -> COMPLETED` or `CREATED -> CANCELLED`.

use bytes::Bytes;
use http::{Method, StatusCode};
use log::debug;
use uuid::Uuid;

use docpost_core::{Error, ErrorKind, Result};

use crate::constants::{REL_CANCEL, REL_COMPLETE};
use crate::model::Batch;
use crate::transport::Transport;

/// Batch operations for the client's sender.
///
/// Completing and cancelling the same batch from several tasks at once is
/// left to the server to arbitrate; the loser gets
/// [`ErrorKind::InvalidBatchState`].
#[derive(Debug, Clone)]
pub struct Batches {
    transport: Transport,
}

impl Batches {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    fn batch_uri(&self, id: &Uuid) -> String {
        self.transport
            .sender_uri(self.transport.sender(), &format!("batches/{id}"))
    }

    /// Create a batch with a caller generated uuid.
    ///
    /// Fails with [`ErrorKind::DuplicateBatch`] when the uuid is taken.
    pub async fn create(&self, id: Uuid) -> Result<Batch> {
        let uri = self.batch_uri(&id);
        self.transport
            .send_json(Method::POST, &uri, None::<&()>)
            .await
            .map_err(|e| {
                let e = if e.status() == Some(StatusCode::CONFLICT) {
                    e.with_kind(ErrorKind::DuplicateBatch)
                } else {
                    e
                };
                e.with_operation("batch.create").with_context("batch", id)
            })
    }

    /// Fetch the current state of a batch.
    pub async fn get(&self, id: Uuid) -> Result<Batch> {
        let uri = self.batch_uri(&id);
        self.transport
            .get_json(&uri)
            .await
            .map_err(|e| e.with_operation("batch.get").with_context("batch", id))
    }

    /// Complete an open batch and return its new state.
    pub async fn complete(&self, batch: &Batch) -> Result<Batch> {
        ensure_open(batch, "batch.complete")?;

        let uri = match batch.link(REL_COMPLETE) {
            Some(uri) => uri.to_string(),
            None => format!("{}/complete", self.batch_uri(&batch.uuid)),
        };
        debug!("completing batch {}", batch.uuid);
        self.transport
            .send_json(Method::POST, &uri, None::<&()>)
            .await
            .map_err(|e| transition_error(e, batch, "batch.complete"))
    }

    /// Cancel an open batch.
    pub async fn cancel(&self, batch: &Batch) -> Result<()> {
        ensure_open(batch, "batch.cancel")?;

        let uri = match batch.link(REL_CANCEL) {
            Some(uri) => uri.to_string(),
            None => self.batch_uri(&batch.uuid),
        };
        debug!("cancelling batch {}", batch.uuid);
        self.transport
            .send(Method::DELETE, &uri, None, Bytes::new())
            .await
            .map_err(|e| transition_error(e, batch, "batch.cancel"))?;
        Ok(())
    }
}

fn ensure_open(batch: &Batch, operation: &'static str) -> Result<()> {
    if batch.status.is_terminal() {
        return Err(Error::invalid_batch_state(format!(
            "batch is already {}",
            batch.status
        ))
        .with_operation(operation)
        .with_context("batch", batch.uuid));
    }
    Ok(())
}

fn transition_error(err: Error, batch: &Batch, operation: &'static str) -> Error {
    let err = if err.status() == Some(StatusCode::CONFLICT) {
        err.with_kind(ErrorKind::InvalidBatchState)
    } else {
        err
    };
    err.with_operation(operation).with_context("batch", batch.uuid)
}
