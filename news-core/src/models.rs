use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news post in its canonical shape, ready to be handed to a store.
///
/// `link` is the natural key: two posts with the same link are the same item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Assigned by the store on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub link: String,
}

/// An item as it appears in a fetched document, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: String,
}

impl RawItem {
    pub fn from_rss_item(item: &rss::Item) -> Self {
        Self {
            title: item.title().unwrap_or_default().to_owned(),
            description: item.description().unwrap_or_default().to_owned(),
            link: item.link().unwrap_or_default().to_owned(),
            pub_date: item.pub_date().unwrap_or_default().to_owned(),
        }
    }
}
