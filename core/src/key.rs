// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Loading the sender's private signing key.

use std::fmt::{Debug, Formatter};

use futures::io::{AsyncRead, AsyncReadExt};
use log::debug;
use rsa::pkcs1v15;
use rsa::pkcs8::DecodePrivateKey;
use rsa::sha2::Sha256;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::{pkcs12, Error, Result, SigningCredential};

/// RSA private key used to sign every request issued on behalf of a sender.
///
/// The key is never serialized and its `Debug` output is redacted.
#[derive(Clone)]
pub struct SigningKey {
    inner: pkcs1v15::SigningKey<Sha256>,
    public: RsaPublicKey,
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl SigningCredential for SigningKey {
    fn is_valid(&self) -> bool {
        true
    }
}

impl SigningKey {
    /// Wrap an already decoded RSA private key.
    pub fn from_rsa(private_key: RsaPrivateKey) -> Result<Self> {
        private_key
            .validate()
            .map_err(|e| Error::key_load("private key is not a valid RSA key").with_source(e))?;

        let public = RsaPublicKey::from(&private_key);
        Ok(Self {
            inner: pkcs1v15::SigningKey::<Sha256>::new(private_key),
            public,
        })
    }

    /// Extract the private key from a PKCS#12 container.
    ///
    /// Containers written by OpenSSL 3 (PBES2, SHA-256 MAC) and legacy ones
    /// (3DES, SHA-1 MAC) are both accepted. When the container holds more
    /// than one key entry, the first key bag in container order is used.
    pub fn from_pkcs12(container: &[u8], passphrase: &str) -> Result<Self> {
        let keys = pkcs12::private_keys(container, passphrase)?;
        if keys.len() > 1 {
            debug!(
                "certificate container holds {} key entries, using the first one",
                keys.len()
            );
        }
        let Some(der) = keys.into_iter().next() else {
            return Err(Error::key_load(
                "certificate container does not hold a private key",
            ));
        };

        let private_key = RsaPrivateKey::from_pkcs8_der(&der).map_err(|e| {
            Error::key_load("private key entry is not an RSA PKCS#8 key").with_source(e)
        })?;

        debug!("private key loaded from certificate container");
        Self::from_rsa(private_key)
    }

    /// Read a PKCS#12 container from `reader` until EOF and extract its key.
    ///
    /// The reader is consumed and dropped before this function returns.
    pub async fn from_pkcs12_reader<R>(mut reader: R, passphrase: &str) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut container = Vec::new();
        reader.read_to_end(&mut container).await.map_err(|e| {
            Error::key_load("certificate container cannot be read").with_source(e)
        })?;
        drop(reader);

        Self::from_pkcs12(&container, passphrase)
    }

    /// Load an unencrypted PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::key_load("failed to read private key").with_source(e))?;
        Self::from_rsa(private_key)
    }

    /// The public half of this key, used by the server to verify signatures.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub(crate) fn pkcs1v15(&self) -> &pkcs1v15::SigningKey<Sha256> {
        &self.inner
    }
}
