use docpost_core::{Context, ProvideCredential, Result, Signer, SigningKey};

use crate::archive::{ArchiveBuilder, ArchiveMutator, ArchiveReader};
use crate::batch::Batches;
use crate::inbox::Inbox;
use crate::model::{Archive, SenderId};
use crate::provide_credential::CertificateCredentialProvider;
use crate::sign_request::RequestSigner;
use crate::transport::Transport;
use crate::Config;

/// Entry point of the docpost API.
///
/// A client is cheap to clone; clones share the transport and the loaded
/// signing key, so operations on different archives or batches can run
/// concurrently.
///
/// ```no_run
/// use docpost::{Archive, ArchiveDocument, Client, Config, Context};
///
/// # async fn example(ctx: Context) -> docpost::Result<()> {
/// let config = Config::new().from_env(&ctx);
/// let client = Client::new(ctx, config)?;
///
/// let archive = client
///     .archive_builder(Archive::new().with_reference_id("invoices-2024"))
///     .add_file(ArchiveDocument::new("invoice.pdf", "application/pdf"), "%PDF-1.7")
///     .send()
///     .await?;
/// println!("stored {} documents", archive.documents.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
}

impl Client {
    /// Create a client that loads its key from the configured certificate.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        let provider = CertificateCredentialProvider::new(config.clone());
        Self::with_credential_provider(ctx, config, provider)
    }

    /// Create a client with a custom source for the signing key.
    pub fn with_credential_provider(
        ctx: Context,
        config: Config,
        provider: impl ProvideCredential<Credential = SigningKey>,
    ) -> Result<Self> {
        let signer = Signer::new(ctx, provider, RequestSigner::new());
        Ok(Self {
            transport: Transport::new(&config, signer)?,
        })
    }

    /// The sender every request is issued for.
    pub fn sender(&self) -> &SenderId {
        self.transport.sender()
    }

    /// The authenticated transport, for requests this client has no
    /// operation for.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Start building an archive owned by the client's sender.
    pub fn archive_builder(&self, archive: Archive) -> ArchiveBuilder {
        self.archive_builder_for(self.sender().clone(), archive)
    }

    /// Start building an archive owned by `sender`, typically a broker's
    /// client organization.
    pub fn archive_builder_for(&self, sender: SenderId, archive: Archive) -> ArchiveBuilder {
        ArchiveBuilder::new(self.transport.clone(), sender, archive)
    }

    /// Lookup of submitted archives.
    pub fn archives(&self) -> ArchiveReader {
        ArchiveReader::new(self.transport.clone())
    }

    /// Deletion and de-duplication of submitted documents.
    pub fn archive_mutations(&self) -> ArchiveMutator {
        ArchiveMutator::new(self.transport.clone())
    }

    /// Batch lifecycle.
    pub fn batches(&self) -> Batches {
        Batches::new(self.transport.clone())
    }

    /// The sender's inbox.
    pub fn inbox(&self) -> Inbox {
        Inbox::new(self.transport.clone())
    }
}
