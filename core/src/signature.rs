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

//! RSA-SHA256 request signatures.

use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::RsaPublicKey;

use crate::hash::{base64_decode, base64_encode};
use crate::{Error, Result, SigningKey};

/// Identifier of the only supported signature algorithm.
pub const SIGNATURE_ALGORITHM: &str = "rsa-sha256";

/// Sign `canonical` with RSASSA-PKCS1-v1_5 over SHA-256.
///
/// The key is only borrowed, so concurrent callers can share one key
/// without locking. PKCS#1 v1.5 is deterministic: the same key and input
/// always yield the same signature.
pub fn sign(key: &SigningKey, canonical: &[u8]) -> Result<Vec<u8>> {
    let signature = key
        .pkcs1v15()
        .try_sign(canonical)
        .map_err(|e| Error::signing("failed to sign canonical request").with_source(e))?;
    Ok(signature.to_vec())
}

/// Same as [`sign`], returning the signature base64 encoded as carried in headers.
pub fn sign_base64(key: &SigningKey, canonical: &[u8]) -> Result<String> {
    sign(key, canonical).map(|s| base64_encode(&s))
}

/// Verify a base64 encoded signature produced by [`sign_base64`].
pub fn verify_base64(public_key: &RsaPublicKey, canonical: &[u8], signature: &str) -> Result<()> {
    let raw = base64_decode(signature)?;
    let signature = Signature::try_from(raw.as_slice())
        .map_err(|e| Error::signing("malformed signature").with_source(e))?;

    VerifyingKey::<Sha256>::new(public_key.clone())
        .verify(canonical, &signature)
        .map_err(|e| Error::signing("signature does not match").with_source(e))
}
