use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Caption-based narrowing of a collection listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFilter {
    #[default]
    All,
    Captioned,
    Uncaptioned,
}

impl CaptionFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionFilter::All => "all",
            CaptionFilter::Captioned => "captioned",
            CaptionFilter::Uncaptioned => "uncaptioned",
        }
    }
}

/// Filter applied by the collection service when listing items
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Case-insensitive name search; empty strings are treated as no search
    pub search: Option<String>,
    #[serde(default)]
    pub caption: CaptionFilter,
}

impl ItemFilter {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() { None } else { Some(search) };
        self
    }

    pub fn with_caption(mut self, caption: CaptionFilter) -> Self {
        self.caption = caption;
        self
    }
}

/// Identity of a listing: which collection, seen through which filter.
///
/// Every remote request is stamped with the key it was issued for so that
/// late responses for a previous key can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionKey {
    pub collection_id: String,
    pub filter: ItemFilter,
}

impl CollectionKey {
    pub fn new(collection_id: impl Into<String>, filter: ItemFilter) -> Self {
        Self {
            collection_id: collection_id.into(),
            filter,
        }
    }
}

impl Display for CollectionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}[{}", self.collection_id, self.filter.caption.as_str())?;
        if let Some(search) = &self.filter.search {
            write!(f, ", search={}", search)?;
        }
        write!(f, "]")
    }
}
