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

//! Header names, environment variables and link relations of the docpost API.

/// Default endpoint of the docpost API.
pub const DEFAULT_BASE_URL: &str = "https://api.docpost.io";

/// Media type of every json representation exchanged with the API.
pub const DOCPOST_MEDIA_TYPE: &str = "application/vnd.docpost-v1+json";

/// Product identification sent on every request.
pub const USER_AGENT: &str = concat!("docpost-rust/", env!("CARGO_PKG_VERSION"));

// Headers
pub const X_DOCPOST_SIGNATURE: &str = "x-docpost-signature";
pub const X_DOCPOST_USERID: &str = "x-docpost-userid";
pub const X_DOCPOST_USER_AGENT: &str = "x-docpost-useragent";
pub const X_CONTENT_SHA256: &str = "x-content-sha256";

// Env values used by `Config::from_env`
pub const DOCPOST_SENDER_ID: &str = "DOCPOST_SENDER_ID";
pub const DOCPOST_BASE_URL: &str = "DOCPOST_BASE_URL";
pub const DOCPOST_CERTIFICATE_PATH: &str = "DOCPOST_CERTIFICATE_PATH";
pub const DOCPOST_CERTIFICATE_PASSPHRASE: &str = "DOCPOST_CERTIFICATE_PASSPHRASE";

// Link relations
pub const REL_SELF: &str = "self";
pub const REL_GET_CONTENT: &str = "get_content";
pub const REL_GET_CONTENT_STREAM: &str = "get_content_stream";
pub const REL_ADD_UNIQUE_UUID: &str = "add_unique_uuid";
pub const REL_DELETE: &str = "delete";
pub const REL_COMPLETE: &str = "complete";
pub const REL_CANCEL: &str = "cancel";

/// Filename of the metadata part of an archive multipart request.
pub const ARCHIVE_PART_NAME: &str = "archive";
