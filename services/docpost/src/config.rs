use std::fmt::{Debug, Formatter};

use docpost_core::utils::Redact;
use docpost_core::{Context, Error, Result};

use crate::constants::*;
use crate::model::SenderId;

/// Config carries all the configuration for the docpost client.
#[derive(Clone, Default)]
pub struct Config {
    /// `sender_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`DOCPOST_SENDER_ID`]
    pub sender_id: Option<String>,
    /// `base_url` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`DOCPOST_BASE_URL`]
    /// - default value: [`DEFAULT_BASE_URL`]
    pub base_url: Option<String>,
    /// `certificate_path` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`DOCPOST_CERTIFICATE_PATH`]
    pub certificate_path: Option<String>,
    /// `certificate_passphrase` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`DOCPOST_CERTIFICATE_PASSPHRASE`]
    pub certificate_passphrase: Option<String>,
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sender_id
    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Set base_url
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set certificate_path
    pub fn with_certificate_path(mut self, path: impl Into<String>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    /// Set certificate_passphrase
    pub fn with_certificate_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.certificate_passphrase = Some(passphrase.into());
        self
    }

    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(DOCPOST_SENDER_ID) {
            self.sender_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(DOCPOST_BASE_URL) {
            self.base_url.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(DOCPOST_CERTIFICATE_PATH) {
            self.certificate_path.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(DOCPOST_CERTIFICATE_PASSPHRASE) {
            self.certificate_passphrase.get_or_insert(v);
        }

        self
    }

    /// The sender all requests are issued for.
    pub fn sender(&self) -> Result<SenderId> {
        match self.sender_id.as_deref() {
            Some(v) if !v.is_empty() => Ok(SenderId::new(v)),
            _ => Err(Error::config_invalid("sender_id is required")),
        }
    }

    /// The api endpoint without trailing slash.
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("sender_id", &self.sender_id)
            .field("base_url", &self.base_url)
            .field("certificate_path", &self.certificate_path)
            .field(
                "certificate_passphrase",
                &Redact::from(&self.certificate_passphrase),
            )
            .finish()
    }
}
