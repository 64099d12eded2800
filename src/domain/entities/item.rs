use serde::{Deserialize, Serialize};

/// Flags reported by the collection service for an image
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemFlags {
    /// Whether a caption exists for the image
    pub has_caption: bool,
    /// Quality score assigned by the vision pass, if any
    pub quality_score: Option<u8>,
    /// Free-form quality flags ("blurry", "watermark", ...)
    #[serde(default)]
    pub quality_flags: Vec<String>,
}

/// Represents an image held by a remote collection
///
/// Items are owned by the collection service; the browser only keeps
/// read-only copies inside its page window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Opaque identifier, unique within a collection
    id: String,

    /// Display name (usually the file name)
    name: String,

    /// Reference used by the view to fetch a thumbnail
    thumbnail: String,

    #[serde(default)]
    flags: ItemFlags,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        thumbnail: impl Into<String>,
        flags: ItemFlags,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            thumbnail: thumbnail.into(),
            flags,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    pub fn flags(&self) -> &ItemFlags {
        &self.flags
    }

    pub fn has_caption(&self) -> bool {
        self.flags.has_caption
    }
}
