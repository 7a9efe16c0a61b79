use crate::{
    Context, Error, ErrorKind, ProvideCredential, Result, SignRequest, SigningCredential,
};
use log::warn;
use std::sync::{Arc, OnceLock};

/// Signer is the main struct used to sign the request.
///
/// The credential is loaded lazily on first use and then shared read-only
/// by every clone of the signer; signing never takes a lock. A
/// [`ErrorKind::KeyLoad`] failure is remembered as well: later requests fail
/// with it without asking the provider again, so retrying means creating a
/// new signer.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    loader: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<OnceLock<std::result::Result<K, String>>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,

            loader: Arc::new(loader),
            builder: Arc::new(builder),
            credential: Arc::new(OnceLock::new()),
        }
    }

    /// Get the context used by this signer.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Load the credential now instead of on first request.
    ///
    /// Other failures, such as a missing configuration, are returned as is
    /// and the provider is asked again on the next call.
    pub async fn credential(&self) -> Result<&K> {
        if let Some(loaded) = self.credential.get() {
            return cached(loaded);
        }

        let cred = match self.loader.provide_credential(&self.ctx).await {
            Ok(Some(cred)) if cred.is_valid() => cred,
            Ok(Some(_)) => {
                let err = Error::key_load("loaded signing credential is not valid");
                return Err(self.remember(err));
            }
            Ok(None) => return Err(Error::config_invalid("no signing credential configured")),
            Err(err) if err.kind() == ErrorKind::KeyLoad => return Err(self.remember(err)),
            Err(err) => return Err(err),
        };

        // Concurrent first loads race here; the first stored outcome wins.
        cached(self.credential.get_or_init(|| Ok(cred)))
    }

    fn remember(&self, err: Error) -> Error {
        warn!("signing key cannot be loaded, later requests will fail too: {err}");
        let _ = self.credential.set(Err(err.to_string()));
        err
    }

    /// Signing request.
    pub async fn sign(&self, req: &mut http::request::Parts) -> Result<()> {
        let cred = self.credential().await?;

        self.builder.sign_request(&self.ctx, req, Some(cred)).await
    }
}

fn cached<K>(loaded: &std::result::Result<K, String>) -> Result<&K> {
    match loaded {
        Ok(cred) => Ok(cred),
        Err(cause) => Err(Error::key_load(
            "signing key failed to load earlier, create a new client to retry",
        )
        .with_source(anyhow::anyhow!("{cause}"))),
    }
}
