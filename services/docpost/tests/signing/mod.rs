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

use std::collections::HashMap;
use std::io::Write;

use docpost::constants::*;
use docpost::{Client, Config, ErrorKind, SigningKey};
use docpost_core::signature::{sign_base64, verify_base64};
use docpost_core::StaticEnv;
use docpost_file_read_tokio::TokioFileRead;
use http::header::{ACCEPT, DATE};
use http::StatusCode;
use pretty_assertions::assert_eq;
use test_case::test_case;
use uuid::Uuid;

use crate::support::{init_logger, sender_key, setup, setup_with_key, FakeServer};
use crate::support::{BASE_URL, OTHER_KEY, SENDER, SENDER_LEGACY_P12, SENDER_P12};

#[test_case(SENDER_P12; "openssl defaults")]
#[test_case(SENDER_LEGACY_P12; "openssl legacy")]
fn test_sign_hello_with_loaded_key(container: &[u8]) {
    let key = SigningKey::from_pkcs12(container, "s3cret").unwrap();

    let first = sign_base64(&key, b"hello").unwrap();
    let second = sign_base64(&key, b"hello").unwrap();

    let public = sender_key().public_key().clone();
    verify_base64(&public, b"hello", &first).unwrap();
    verify_base64(&public, b"hello", &second).unwrap();
}

#[test_case(b"" as &[u8]; "empty")]
#[test_case(b"not a pkcs12 container"; "garbage")]
#[test_case(&[0x30, 0x82, 0x01]; "truncated der")]
fn test_corrupted_container(container: &[u8]) {
    let err = SigningKey::from_pkcs12(container, "s3cret").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyLoad);
}

#[tokio::test]
async fn test_every_request_is_signed() {
    let (server, client) = setup();
    let batch = client.batches().create(Uuid::new_v4()).await.unwrap();
    client.batches().get(batch.uuid).await.unwrap();
    client.inbox().list(0, 10).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    for request in requests {
        assert!(request.verified, "{} {} not verified", request.method, request.path);
        let headers = &request.headers;
        assert!(headers.contains_key(DATE));
        assert!(headers.contains_key(X_DOCPOST_SIGNATURE));
        assert_eq!(headers[X_DOCPOST_USERID], SENDER);
        assert_eq!(headers[X_DOCPOST_USER_AGENT], USER_AGENT);
        assert_eq!(headers[ACCEPT], DOCPOST_MEDIA_TYPE);
        // None of these requests carries a body.
        assert!(!headers.contains_key(X_CONTENT_SHA256));
    }
}

#[tokio::test]
async fn test_wrong_key_is_rejected() {
    let (server, client) = setup_with_key(SigningKey::from_pkcs8_pem(OTHER_KEY).unwrap());

    let err = client.batches().create(Uuid::new_v4()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(err.is_client_error());
    assert!(!server.requests()[0].verified);
}

fn certificate_client(server: &FakeServer, passphrase: &str) -> (tempfile::NamedTempFile, Client) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SENDER_P12).unwrap();
    file.flush().unwrap();

    let envs = HashMap::from([
        (DOCPOST_SENDER_ID.to_string(), SENDER.to_string()),
        (DOCPOST_BASE_URL.to_string(), BASE_URL.to_string()),
        (
            DOCPOST_CERTIFICATE_PATH.to_string(),
            file.path().to_string_lossy().to_string(),
        ),
        (
            DOCPOST_CERTIFICATE_PASSPHRASE.to_string(),
            passphrase.to_string(),
        ),
    ]);
    let ctx = server
        .context()
        .with_file_read(TokioFileRead)
        .with_env(StaticEnv {
            home_dir: None,
            envs,
        });

    let config = Config::new().from_env(&ctx);
    let client = Client::new(ctx, config).unwrap();
    (file, client)
}

#[tokio::test]
async fn test_key_loaded_from_certificate_file() {
    init_logger();
    let server = FakeServer::new(sender_key().public_key().clone());
    let (_file, client) = certificate_client(&server, "s3cret");

    client.batches().create(Uuid::new_v4()).await.unwrap();
    client.inbox().list(0, 1).await.unwrap();

    assert!(server.requests().iter().all(|r| r.verified));
}

#[tokio::test]
async fn test_wrong_passphrase_fails_before_sending() {
    init_logger();
    let server = FakeServer::new(sender_key().public_key().clone());
    let (_file, client) = certificate_client(&server, "wrong");

    let err = client.batches().create(Uuid::new_v4()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::KeyLoad);
    assert!(!err.to_string().contains("wrong"));
    assert!(server.requests().is_empty());
}
