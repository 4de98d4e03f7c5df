//! Document model.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Whether a document type is rendered as a page or as a piece under a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    #[default]
    Page,
    Piece,
}

/// A document as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,

    /// Type key used to look up the document's manager.
    #[serde(rename = "type")]
    pub doc_type: String,

    pub title: String,

    /// Current server-relative address, if the document is addressable.
    #[serde(default)]
    pub url: Option<String>,

    /// Addresses the document has answered to. Only ever grows.
    #[serde(default)]
    pub historic_urls: BTreeSet<String>,

    /// Milliseconds since the epoch of the last content or address change.
    #[serde(default)]
    pub updated_at: u64,
}

impl Document {
    /// New document with an empty history.
    pub fn new(doc_type: impl Into<String>, title: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            id: DocumentId::new(),
            doc_type: doc_type.into(),
            title: title.into(),
            url: url.map(str::to_string),
            historic_urls: BTreeSet::new(),
            updated_at: now_millis(),
        }
    }

    /// Builder-style helper to seed a history.
    pub fn with_history<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.historic_urls.extend(urls.into_iter().map(Into::into));
        self
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = id.into();
        self
    }
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_shape() {
        let doc = Document::new("default", "Child", Some("/child"))
            .with_id("doc-1")
            .with_history(["/old"]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["id"], "doc-1");
        assert_eq!(json["type"], "default");
        assert_eq!(json["historic_urls"][0], "/old");

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_history_defaults_to_empty() {
        let doc: Document =
            serde_json::from_str(r#"{"id":"x","type":"default","title":"X"}"#).unwrap();
        assert!(doc.historic_urls.is_empty());
        assert!(doc.url.is_none());
    }
}
