//! Core components for the docpost signed-request client.
//!
//! This crate provides the foundational types and traits shared by the
//! docpost API client: loading the sender's private key, computing request
//! signatures and the collaborator seams used to reach the outside world.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file reading, HTTP sending, and environment access
//! - **Key material**: [`SigningKey`] extracted from a PKCS#12 container
//! - **Signatures**: RSA-SHA256 over a canonical request representation, see [`signature`]
//! - **Traits**: Abstract interfaces for credential loading (`ProvideCredential`) and request signing (`SignRequest`)
//! - **Signer**: The orchestrator that loads the key once and signs every request with it
//!
//! ## Example
//!
//! ```no_run
//! use docpost_core::{signature, SigningKey};
//!
//! # fn example(container: &[u8]) -> docpost_core::Result<()> {
//! let key = SigningKey::from_pkcs12(container, "passphrase")?;
//! let signature = signature::sign_base64(&key, b"hello")?;
//! signature::verify_base64(key.public_key(), b"hello", &signature)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Digest and encoding helpers
//! - [`time`]: Time formatting helpers
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod signature;
pub mod time;
pub mod utils;

mod context;
pub use context::{
    ByteStream, Context, Env, FileRead, HttpSend, NoopEnv, NoopFileRead, NoopHttpSend, OsEnv,
    StaticEnv,
};
mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod key;
pub use key::SigningKey;
mod pkcs12;
mod request;
pub use request::SigningRequest;
mod signer;
pub use signer::Signer;
