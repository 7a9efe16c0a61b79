//! Signed-request client for the docpost document-delivery platform.
//!
//! Every request is signed with the sender's RSA key, extracted once from a
//! PKCS#12 certificate. On top of that authenticated [`Transport`] the
//! [`Client`] exposes one capability per resource lifecycle:
//!
//! - [`ArchiveBuilder`]: upload documents as one archive
//! - [`ArchiveReader`] and [`ArchiveMutator`]: look up, download, de-duplicate and delete
//! - [`Batches`]: create, complete and cancel batches
//! - [`Inbox`]: read documents delivered to the sender

pub mod constants;

mod config;
pub use config::Config;

mod model;
pub use model::{
    Archive, ArchiveDocument, Archives, Batch, BatchStatus, ErrorMessage, InboxDocument, Link,
    SenderId,
};

mod content;
pub use content::{ContentStream, DocumentBytes, DocumentContent};

mod multipart;
pub use multipart::MultipartBody;

mod sign_request;
pub use sign_request::{canonical_request_string, RequestSigner};

mod transport;
pub use transport::Transport;

mod provide_credential;
pub use provide_credential::{CertificateCredentialProvider, StaticCredentialProvider};

mod archive;
pub use archive::{ArchiveBuilder, ArchiveMutator, ArchiveReader};

mod batch;
pub use batch::Batches;

mod inbox;
pub use inbox::Inbox;

mod client;
pub use client::Client;

pub use docpost_core::{Context, Error, ErrorKind, Result, SigningKey};
