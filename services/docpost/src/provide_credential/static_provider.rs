use async_trait::async_trait;
use docpost_core::{Context, ProvideCredential, Result, SigningKey};

/// StaticCredentialProvider hands out a key that was loaded by the caller.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    key: SigningKey,
}

impl StaticCredentialProvider {
    /// Create a provider for an already loaded key.
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = SigningKey;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.key.clone()))
    }
}
