//! Representations exchanged with the docpost API.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::REL_SELF;

/// Identifies the organization or broker a request is issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(String);

impl SenderId {
    /// Create a sender id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The sender id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SenderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hypermedia link to a related resource or operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Link {
    /// Relation name, for example `delete`.
    pub rel: String,
    /// Absolute target uri.
    pub uri: String,
    /// Media type served at `uri`, if announced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    /// Create a new link.
    pub fn new(rel: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            uri: uri.into(),
            media_type: None,
        }
    }
}

pub(crate) fn find_link<'a>(links: &'a [Link], rel: &str) -> Option<&'a str> {
    links
        .iter()
        .find(|l| l.rel == rel || l.rel.ends_with(&format!("/{rel}")))
        .map(|l| l.uri.as_str())
}

/// Metadata of one file inside an archive.
///
/// Byte content is never part of this value; it travels separately and is
/// paired with the document by [`ArchiveDocument::uuid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArchiveDocument {
    /// Identity of the document, also used to pair it with its content.
    pub uuid: Uuid,
    /// Original file name.
    pub file_name: String,
    /// File type, usually the file name extension.
    pub file_type: String,
    /// Media type of the content.
    pub content_type: String,
    /// Content size in bytes, filled in when the content is uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    /// Caller reference of this document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    /// Free form searchable attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Operations available on the submitted document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl ArchiveDocument {
    /// Describe a new document with a freshly generated uuid.
    ///
    /// The file type is derived from the file name extension.
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let file_type = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        Self {
            uuid: Uuid::new_v4(),
            file_name,
            file_type,
            content_type: content_type.into(),
            content_length: None,
            reference_id: None,
            attributes: BTreeMap::new(),
            links: Vec::new(),
        }
    }

    /// Use a caller generated uuid instead.
    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    /// Set the file type explicitly.
    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    /// Set the document reference.
    pub fn with_reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Add a searchable attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Copy this document's metadata under a new uuid.
    ///
    /// Server links are dropped since they belong to the original identity.
    pub fn with_new_uuid(&self) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            links: Vec::new(),
            ..self.clone()
        }
    }

    /// Uri of the link with relation `rel`.
    pub fn link(&self, rel: &str) -> Option<&str> {
        find_link(&self.links, rel)
    }
}

/// A named collection of documents submitted as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Archive {
    /// Archive name, the sender's default archive when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Caller reference shared by the documents of this archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    /// Documents of this archive.
    #[serde(default)]
    pub documents: Vec<ArchiveDocument>,
    /// Server assigned links, including `self` once submitted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Archive {
    /// Describe a new archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the archive name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the archive reference.
    pub fn with_reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Server assigned uri, `None` until the archive has been sent.
    pub fn uri(&self) -> Option<&str> {
        find_link(&self.links, REL_SELF)
    }

    /// Find a document by uuid.
    pub fn document(&self, uuid: &Uuid) -> Option<&ArchiveDocument> {
        self.documents.iter().find(|d| &d.uuid == uuid)
    }
}

/// A list of archives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archives {
    /// Archives in server order.
    #[serde(default)]
    pub archives: Vec<Archive>,
}

/// Lifecycle status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Open and accepting items.
    Created,
    /// Terminal.
    Completed,
    /// Terminal.
    Cancelled,
}

impl BatchStatus {
    /// Completed and cancelled batches accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Cancelled)
    }
}

impl Display for BatchStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Created => f.write_str("CREATED"),
            BatchStatus::Completed => f.write_str("COMPLETED"),
            BatchStatus::Cancelled => f.write_str("CANCELLED"),
        }
    }
}

/// A caller identified grouping of deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Batch {
    /// Caller supplied identity.
    pub uuid: Uuid,
    /// Current lifecycle status.
    pub status: BatchStatus,
    /// Operations available on this batch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Associated items, kept as sent by the server.
    #[serde(flatten)]
    pub items: BTreeMap<String, serde_json::Value>,
}

impl Batch {
    /// Uri of the link with relation `rel`.
    pub fn link(&self, rel: &str) -> Option<&str> {
        find_link(&self.links, rel)
    }
}

/// A page of the sender's inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbox {
    /// Documents on this page.
    #[serde(default)]
    pub documents: Vec<InboxDocument>,
}

/// A document received in the sender's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InboxDocument {
    /// Server identity.
    pub id: String,
    /// Subject given by the sender of the document.
    pub subject: String,
    /// Display name of who sent the document.
    pub sender: String,
    /// Media type of the content.
    pub content_type: String,
    /// Delivery time as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
    /// Operations available on this document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl InboxDocument {
    /// Uri of the link with relation `rel`.
    pub fn link(&self, rel: &str) -> Option<&str> {
        find_link(&self.links, rel)
    }
}

/// Error body returned by the API on failed requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorMessage {
    /// Machine readable code.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Human readable description.
    #[serde(default)]
    pub error_message: String,
    /// `CLIENT_DATA`, `SERVER` and so on.
    #[serde(default)]
    pub error_type: Option<String>,
}
