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

//! Reading private keys out of PKCS#12 (RFC 7292) containers.
//!
//! Only password integrity mode is supported. The MAC may use SHA-1 or any
//! SHA-2 digest. Key bags may be plain, PBES2 protected (the OpenSSL 3
//! default) or protected with the legacy `pbeWithSHAAnd3-KeyTripleDES-CBC`
//! scheme. Certificate bags are never decoded.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use hmac::digest::core_api::BlockSizeUser;
use hmac::digest::Digest;
use hmac::{Mac, SimpleHmac};
use log::debug;
use pkcs5::der::asn1::{AnyRef, ContextSpecific, ObjectIdentifier, OctetStringRef};
use pkcs5::der::{Encode, Reader, SliceReader, TagMode, TagNumber};
use pkcs5::AlgorithmIdentifierRef;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::{Error, Result};

const DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
const ENCRYPTED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.6");

const KEY_BAG: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.10.1.1");
const SHROUDED_KEY_BAG: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.10.1.2");

const PBE_SHA1_3DES: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.12.1.3");

const SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const SHA224: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.4");
const SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
const SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");
const SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");

/// Diversifier IDs from RFC 7292 appendix B.3.
const KEY_ID: u8 = 1;
const IV_ID: u8 = 2;
const MAC_ID: u8 = 3;

/// Return the PKCS#8 DER encoding of every private key held by `container`,
/// in container order.
///
/// The container MAC is checked before anything is decrypted, so a wrong
/// passphrase is reported as an integrity failure.
pub(crate) fn private_keys(container: &[u8], passphrase: &str) -> Result<Vec<Vec<u8>>> {
    let pfx = parse_pfx(container).map_err(malformed)?;
    let ContentInfo::Data(auth_safe) = pfx.auth_safe else {
        return Err(Error::key_load(
            "certificate container does not use password integrity mode",
        ));
    };

    match pfx.mac {
        Some(mac) => mac.verify(auth_safe, passphrase)?,
        None => debug!("certificate container carries no integrity check"),
    }

    let mut keys = Vec::new();
    for content in parse_authenticated_safe(auth_safe).map_err(malformed)? {
        match content {
            ContentInfo::Data(safe_contents) => collect_keys(safe_contents, passphrase, &mut keys)?,
            ContentInfo::Encrypted {
                algorithm,
                ciphertext,
            } => match decrypt(algorithm, ciphertext, passphrase)? {
                Some(safe_contents) => collect_keys(&safe_contents, passphrase, &mut keys)?,
                None => debug!(
                    "skipping encrypted container entry protected with {}",
                    algorithm.oid
                ),
            },
            ContentInfo::Other(content_type) => {
                debug!("skipping container entry of type {content_type}")
            }
        }
    }
    Ok(keys)
}

fn malformed(err: pkcs5::der::Error) -> Error {
    Error::key_load("certificate container cannot be parsed as PKCS#12")
        .with_source(anyhow::anyhow!("{err}"))
}

struct Pfx<'a> {
    auth_safe: ContentInfo<'a>,
    mac: Option<MacData<'a>>,
}

enum ContentInfo<'a> {
    Data(&'a [u8]),
    Encrypted {
        algorithm: AlgorithmIdentifierRef<'a>,
        ciphertext: &'a [u8],
    },
    Other(ObjectIdentifier),
}

struct MacData<'a> {
    algorithm: ObjectIdentifier,
    digest: &'a [u8],
    salt: &'a [u8],
    iterations: u32,
}

struct SafeBag<'a> {
    id: ObjectIdentifier,
    value: AnyRef<'a>,
}

fn parse_pfx(container: &[u8]) -> pkcs5::der::Result<Pfx<'_>> {
    let mut reader = SliceReader::new(container)?;
    let pfx = reader.sequence(|r| {
        let _version = r.decode::<u8>()?;
        let auth_safe = read_content_info(r)?;
        let mac = if r.is_finished() {
            None
        } else {
            Some(read_mac_data(r)?)
        };
        Ok(Pfx { auth_safe, mac })
    })?;
    reader.finish(pfx)
}

fn read_content_info<'a, R: Reader<'a>>(reader: &mut R) -> pkcs5::der::Result<ContentInfo<'a>> {
    reader.sequence(|r| {
        let content_type = r.decode::<ObjectIdentifier>()?;
        let content = r.decode::<ContextSpecific<AnyRef<'a>>>()?.value;

        if content_type == DATA {
            return Ok(ContentInfo::Data(
                OctetStringRef::try_from(content)?.as_bytes(),
            ));
        }
        if content_type != ENCRYPTED_DATA {
            return Ok(ContentInfo::Other(content_type));
        }

        // EncryptedData ::= SEQUENCE { version, EncryptedContentInfo }
        content.sequence(|r| {
            let _version = r.decode::<u8>()?;
            r.sequence(|r| {
                let _content_type = r.decode::<ObjectIdentifier>()?;
                let algorithm = r.decode::<AlgorithmIdentifierRef<'a>>()?;
                let ciphertext = r
                    .context_specific::<OctetStringRef<'a>>(TagNumber::N0, TagMode::Implicit)?
                    .map(|octets| octets.as_bytes())
                    .unwrap_or_default();
                Ok(ContentInfo::Encrypted {
                    algorithm,
                    ciphertext,
                })
            })
        })
    })
}

fn read_mac_data<'a, R: Reader<'a>>(reader: &mut R) -> pkcs5::der::Result<MacData<'a>> {
    reader.sequence(|r| {
        let (algorithm, digest) = r.sequence(|r| {
            let algorithm = r.decode::<AlgorithmIdentifierRef<'a>>()?;
            let digest = r.decode::<OctetStringRef<'a>>()?;
            Ok((algorithm.oid, digest.as_bytes()))
        })?;
        let salt = r.decode::<OctetStringRef<'a>>()?.as_bytes();
        let iterations = r.decode::<Option<u32>>()?.unwrap_or(1);
        Ok(MacData {
            algorithm,
            digest,
            salt,
            iterations,
        })
    })
}

fn parse_authenticated_safe(data: &[u8]) -> pkcs5::der::Result<Vec<ContentInfo<'_>>> {
    let mut reader = SliceReader::new(data)?;
    let contents = reader.sequence(|r| {
        let mut contents = Vec::new();
        while !r.is_finished() {
            contents.push(read_content_info(r)?);
        }
        Ok(contents)
    })?;
    reader.finish(contents)
}

fn parse_safe_contents<'a>(data: &'a [u8]) -> pkcs5::der::Result<Vec<SafeBag<'a>>> {
    let mut reader = SliceReader::new(data)?;
    let bags = reader.sequence(|r| {
        let mut bags = Vec::new();
        while !r.is_finished() {
            bags.push(r.sequence(|r| {
                let id = r.decode::<ObjectIdentifier>()?;
                let value = r.decode::<ContextSpecific<AnyRef<'a>>>()?.value;
                // Bag attributes (friendly name, local key id) are not needed.
                while !r.is_finished() {
                    r.tlv_bytes()?;
                }
                Ok(SafeBag { id, value })
            })?);
        }
        Ok(bags)
    })?;
    reader.finish(bags)
}

fn collect_keys(safe_contents: &[u8], passphrase: &str, keys: &mut Vec<Vec<u8>>) -> Result<()> {
    for bag in parse_safe_contents(safe_contents).map_err(malformed)? {
        if bag.id == KEY_BAG {
            keys.push(bag.value.to_der().map_err(malformed)?);
        } else if bag.id == SHROUDED_KEY_BAG {
            let (algorithm, ciphertext) = bag
                .value
                .sequence(|r| {
                    let algorithm = r.decode::<AlgorithmIdentifierRef<'_>>()?;
                    let ciphertext = r.decode::<OctetStringRef<'_>>()?.as_bytes();
                    Ok((algorithm, ciphertext))
                })
                .map_err(malformed)?;
            let key = decrypt(algorithm, ciphertext, passphrase)?.ok_or_else(|| {
                Error::key_load("private key entry uses an unsupported encryption algorithm")
            })?;
            keys.push(key);
        }
    }
    Ok(())
}

/// Decrypt one container entry. Returns `None` for schemes this reader does
/// not implement.
fn decrypt(
    algorithm: AlgorithmIdentifierRef<'_>,
    ciphertext: &[u8],
    passphrase: &str,
) -> Result<Option<Vec<u8>>> {
    let Some(parameters) = algorithm.parameters else {
        return Ok(None);
    };

    if algorithm.oid == pkcs5::pbes2::PBES2_OID {
        let parameters = pkcs5::pbes2::Parameters::try_from(parameters).map_err(malformed)?;
        // PBES2 takes the passphrase as raw UTF-8 bytes.
        let plaintext = parameters.decrypt(passphrase, ciphertext).map_err(|e| {
            Error::key_load("certificate container entry cannot be decrypted")
                .with_source(anyhow::anyhow!("{e}"))
        })?;
        return Ok(Some(plaintext));
    }

    if algorithm.oid == PBE_SHA1_3DES {
        let (salt, iterations) = parameters
            .sequence(|r| {
                let salt = r.decode::<OctetStringRef<'_>>()?.as_bytes();
                let iterations = r.decode::<u32>()?;
                Ok((salt, iterations))
            })
            .map_err(malformed)?;

        let password = bmp_password(passphrase);
        let key = derive::<Sha1>(&password, salt, KEY_ID, iterations, 24);
        let iv = derive::<Sha1>(&password, salt, IV_ID, iterations, 8);
        let plaintext = cbc::Decryptor::<des::TdesEde3>::new_from_slices(&key, &iv)
            .map_err(|e| {
                Error::key_load("certificate container entry cannot be decrypted")
                    .with_source(anyhow::anyhow!("{e}"))
            })?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| {
                Error::key_load("certificate container entry cannot be decrypted")
                    .with_source(anyhow::anyhow!("{e}"))
            })?;
        return Ok(Some(plaintext));
    }

    Ok(None)
}

impl MacData<'_> {
    fn verify(&self, data: &[u8], passphrase: &str) -> Result<()> {
        let password = bmp_password(passphrase);
        let verified = match self.algorithm {
            oid if oid == SHA1 => self.verify_with::<Sha1>(&password, data),
            oid if oid == SHA224 => self.verify_with::<Sha224>(&password, data),
            oid if oid == SHA256 => self.verify_with::<Sha256>(&password, data),
            oid if oid == SHA384 => self.verify_with::<Sha384>(&password, data),
            oid if oid == SHA512 => self.verify_with::<Sha512>(&password, data),
            oid => {
                return Err(Error::key_load(
                    "certificate container uses an unsupported integrity algorithm",
                )
                .with_context("algorithm", oid))
            }
        };

        if !verified {
            return Err(Error::key_load(
                "certificate container integrity check failed, check the passphrase",
            ));
        }
        Ok(())
    }

    fn verify_with<D>(&self, password: &[u8], data: &[u8]) -> bool
    where
        D: Digest + BlockSizeUser,
    {
        let key = derive::<D>(
            password,
            self.salt,
            MAC_ID,
            self.iterations,
            <D as Digest>::output_size(),
        );
        let Ok(mut mac) = <SimpleHmac<D> as Mac>::new_from_slice(&key) else {
            return false;
        };
        mac.update(data);
        mac.verify_slice(self.digest).is_ok()
    }
}

/// Passphrases are fed to the PKCS#12 KDF as big-endian UTF-16 with a
/// trailing NUL.
fn bmp_password(passphrase: &str) -> Vec<u8> {
    passphrase
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_be_bytes)
        .collect()
}

/// The PKCS#12 key derivation function from RFC 7292 appendix B.2.
fn derive<D>(password: &[u8], salt: &[u8], id: u8, iterations: u32, len: usize) -> Vec<u8>
where
    D: Digest + BlockSizeUser,
{
    let v = D::block_size();
    let fill = |input: &[u8]| -> Vec<u8> {
        let n = v * input.len().div_ceil(v);
        input.iter().copied().cycle().take(n).collect()
    };

    let diversifier = vec![id; v];
    let mut i = fill(salt);
    i.extend(fill(password));

    let mut out = Vec::with_capacity(len);
    loop {
        let mut a = D::new()
            .chain_update(&diversifier)
            .chain_update(&i)
            .finalize();
        for _ in 1..iterations {
            a = D::digest(&a);
        }
        out.extend_from_slice(&a);
        if out.len() >= len {
            break;
        }

        // I_j = (I_j + B + 1) mod 2^(8v) for every v-byte block of I.
        let b: Vec<u8> = a.iter().copied().cycle().take(v).collect();
        for block in i.chunks_mut(v) {
            let mut carry = 1u16;
            for (x, y) in block.iter_mut().zip(&b).rev() {
                let sum = u16::from(*x) + u16::from(*y) + carry;
                *x = sum as u8;
                carry = sum >> 8;
            }
        }
    }
    out.truncate(len);
    out
}
