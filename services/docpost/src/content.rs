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

//! Document byte content, for upload and download.

use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use docpost_core::{ByteStream, Error, Result};
use futures::io::{AsyncRead, AsyncReadExt};
use futures::{Stream, StreamExt, TryStreamExt};

/// Byte payload of one document, paired with its metadata for one upload.
///
/// Content is either an in-memory buffer or any async reader. The upload
/// consumes the value: readers are read to the end and dropped before the
/// upload call returns, whether it succeeds or not.
pub struct DocumentContent {
    source: Source,
}

enum Source {
    Buffer(Bytes),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl DocumentContent {
    /// Content held in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            source: Source::Buffer(bytes.into()),
        }
    }

    /// Content read from `reader` during the upload.
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            source: Source::Reader(Box::new(reader)),
        }
    }

    /// Consume the content and return all of its bytes.
    pub(crate) async fn read_all(self) -> Result<Bytes> {
        match self.source {
            Source::Buffer(bs) => Ok(bs),
            Source::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader
                    .read_to_end(&mut buf)
                    .await
                    .map_err(|e| Error::unexpected("failed to read document content").with_source(e))?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl Debug for DocumentContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Source::Buffer(bs) => f
                .debug_struct("DocumentContent")
                .field("len", &bs.len())
                .finish(),
            Source::Reader(_) => f
                .debug_struct("DocumentContent")
                .field("reader", &"..")
                .finish(),
        }
    }
}

impl From<Bytes> for DocumentContent {
    fn from(value: Bytes) -> Self {
        Self::from_bytes(value)
    }
}

impl From<Vec<u8>> for DocumentContent {
    fn from(value: Vec<u8>) -> Self {
        Self::from_bytes(value)
    }
}

impl From<&'static [u8]> for DocumentContent {
    fn from(value: &'static [u8]) -> Self {
        Self::from_bytes(value)
    }
}

impl From<&'static str> for DocumentContent {
    fn from(value: &'static str) -> Self {
        Self::from_bytes(value)
    }
}

impl From<String> for DocumentContent {
    fn from(value: String) -> Self {
        Self::from_bytes(value)
    }
}

/// Fully downloaded document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBytes {
    /// Media type announced by the server.
    pub content_type: Option<String>,
    /// Document bytes.
    pub bytes: Bytes,
}

/// Document content streamed from the server.
///
/// The stream holds the underlying connection until it is read to the end,
/// closed with [`ContentStream::close`] or dropped.
pub struct ContentStream {
    content_type: Option<String>,
    inner: ByteStream,
}

impl ContentStream {
    pub(crate) fn new(content_type: Option<String>, inner: ByteStream) -> Self {
        Self {
            content_type,
            inner,
        }
    }

    /// Media type announced by the server.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Read the rest of the stream into memory.
    pub async fn read_to_end(self) -> Result<DocumentBytes> {
        let Self {
            content_type,
            inner,
        } = self;
        let bytes = inner
            .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok(buf)
            })
            .await?
            .freeze();

        Ok(DocumentBytes {
            content_type,
            bytes,
        })
    }

    /// Release the underlying connection without reading further.
    pub fn close(self) {
        drop(self)
    }
}

impl Debug for ContentStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl Stream for ContentStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
