use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::models::{Post, RawItem};
use crate::normalize::normalize;

/// What to do with a feed when one of its items has an unparseable date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPolicy {
    /// Drop every item of the feed for this cycle.
    #[default]
    AbortFeed,
    /// Drop only the offending item.
    SkipItem,
}

#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    policy: ItemPolicy,
}

impl FeedFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            policy: ItemPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ItemPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ItemPolicy {
        self.policy
    }

    /// Downloads one feed and returns its posts in document order.
    ///
    /// The response status is not inspected: an error page simply fails to
    /// parse as a feed.
    pub async fn fetch(&self, url: &str) -> Result<Vec<Post>, FeedError> {
        let fetch_err = |source| FeedError::Fetch {
            url: url.to_owned(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(fetch_err)?;
        let bytes = response.bytes().await.map_err(fetch_err)?;

        let channel = rss::Channel::read_from(&bytes[..]).map_err(|source| FeedError::Parse {
            url: url.to_owned(),
            source,
        })?;

        let posts = self.normalize_items(url, channel.items())?;
        debug!(feed = %url, count = posts.len(), "feed fetched");
        Ok(posts)
    }

    fn normalize_items(&self, url: &str, items: &[rss::Item]) -> Result<Vec<Post>, FeedError> {
        let mut posts = Vec::with_capacity(items.len());
        for item in items {
            let raw = RawItem::from_rss_item(item);
            match normalize(&raw) {
                Ok(post) => posts.push(post),
                Err(source) if self.policy == ItemPolicy::SkipItem => {
                    warn!(feed = %url, link = %raw.link, error = %source, "skipping feed item");
                }
                Err(source) => {
                    return Err(FeedError::MalformedDate {
                        url: url.to_owned(),
                        source,
                    })
                }
            }
        }
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss_item(title: &str, pub_date: Option<&str>) -> rss::Item {
        let mut item = rss::Item::default();
        item.set_title(title.to_string());
        item.set_link(format!("http://example.com/{title}"));
        item.set_description("body".to_string());
        item.set_pub_date(pub_date.map(ToOwned::to_owned));
        item
    }

    #[test]
    fn abort_policy_discards_the_whole_feed() {
        let fetcher = FeedFetcher::new(Client::new());
        let items = vec![
            rss_item("a", Some("Mon, 2 Jan 2006 15:04:05 GMT")),
            rss_item("b", Some("not a date")),
            rss_item("c", Some("Mon, 2 Jan 2006 15:04:05 GMT")),
        ];

        let err = fetcher.normalize_items("http://feed", &items).unwrap_err();
        match err {
            FeedError::MalformedDate { url, source } => {
                assert_eq!(url, "http://feed");
                assert_eq!(source.value, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skip_policy_keeps_valid_items_in_order() {
        let fetcher = FeedFetcher::new(Client::new()).with_policy(ItemPolicy::SkipItem);
        let items = vec![
            rss_item("a", Some("Mon, 2 Jan 2006 15:04:05 GMT")),
            rss_item("b", None),
            rss_item("c", Some("Tue, 3 Jan 2006 15:04:05 GMT")),
        ];

        let posts = fetcher.normalize_items("http://feed", &items).unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["a", "c"]);
    }
}
