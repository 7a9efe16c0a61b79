use async_trait::async_trait;
use log::debug;

use docpost_core::{Context, Error, ProvideCredential, Result, SigningKey};

use crate::Config;

/// CertificateCredentialProvider loads the signing key from the PKCS#12
/// container at [`Config::certificate_path`].
///
/// Returns `Ok(None)` when no path is configured. A malformed container or
/// wrong passphrase is reported once as [`ErrorKind::KeyLoad`] and never
/// retried.
///
/// [`ErrorKind::KeyLoad`]: docpost_core::ErrorKind::KeyLoad
#[derive(Debug, Clone)]
pub struct CertificateCredentialProvider {
    config: Config,
}

impl CertificateCredentialProvider {
    /// Create a provider reading the certificate configured in `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for CertificateCredentialProvider {
    type Credential = SigningKey;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let Some(path) = self.config.certificate_path.as_deref() else {
            return Ok(None);
        };
        let Some(passphrase) = self.config.certificate_passphrase.as_deref() else {
            return Err(Error::config_invalid(
                "certificate_passphrase is required when certificate_path is set",
            ));
        };

        let path = ctx.expand_home_dir(path).ok_or_else(|| {
            Error::config_invalid("certificate_path refers to home dir but it is unknown")
                .with_context("path", path)
        })?;
        let container = ctx.file_read(&path).await.map_err(|e| {
            Error::key_load("certificate container cannot be read")
                .with_context("path", &path)
                .with_source(e)
        })?;

        let key = SigningKey::from_pkcs12(&container, passphrase)
            .map_err(|e| e.with_context("path", &path))?;
        debug!("signing key loaded from {path}");

        Ok(Some(key))
    }
}
