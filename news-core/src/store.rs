use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::Post;

/// Destination for the posts gathered during a cycle.
///
/// Implementations deduplicate on [`Post::link`]: writing a post whose link
/// is already stored is a silent no-op.
#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn write_news(&self, batch: &[Post]) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: NewsStore + ?Sized> NewsStore for Arc<S> {
    async fn write_news(&self, batch: &[Post]) -> Result<(), StoreError> {
        (**self).write_news(batch).await
    }
}

#[derive(Debug, Default)]
struct PostIndex {
    posts: Vec<Post>,
    links: HashSet<String>,
    next_id: u64,
}

impl PostIndex {
    fn from_posts(posts: Vec<Post>) -> Self {
        let mut index = Self::default();
        for post in posts {
            if index.links.insert(post.link.clone()) {
                index.next_id = index.next_id.max(post.id.unwrap_or(0));
                index.posts.push(post);
            }
        }
        // ids are handed out after the highest one seen on disk
        for post in index.posts.iter_mut().filter(|post| post.id.is_none()) {
            index.next_id += 1;
            post.id = Some(index.next_id);
        }
        index
    }

    /// Appends every post whose link is new and returns how many were added.
    fn insert_batch(&mut self, batch: &[Post]) -> usize {
        let before = self.posts.len();
        for post in batch {
            if self.links.contains(&post.link) {
                continue;
            }
            self.next_id += 1;
            self.links.insert(post.link.clone());
            self.posts.push(Post {
                id: Some(self.next_id),
                ..post.clone()
            });
        }
        self.posts.len() - before
    }

    fn rollback_to(&mut self, len: usize, next_id: u64) {
        for post in self.posts.drain(len..) {
            self.links.remove(&post.link);
        }
        self.next_id = next_id;
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<PostIndex>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<Post> {
        self.inner.read().await.posts.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.posts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl NewsStore for MemoryStore {
    async fn write_news(&self, batch: &[Post]) -> Result<(), StoreError> {
        let added = self.inner.write().await.insert_batch(batch);
        debug!(received = batch.len(), added, "posts written to memory store");
        Ok(())
    }
}

/// Store persisted as a JSON array of posts.
///
/// Every write goes to `<file>.json.tmp` first and is then renamed over the
/// real file, so a crash leaves either the old or the new content behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<RwLock<PostIndex>>,
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store; a
    /// corrupted one falls back to the temporary file of the last write.
    /// Any other read error is returned so the file is never overwritten.
    pub async fn load_from(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let posts: Vec<Post> = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(posts) => posts,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "failed to parse store, trying tmp fallback");
                    match tokio::fs::read(tmp_path(&path)).await {
                        Ok(tmp_bytes) => serde_json::from_slice(&tmp_bytes).unwrap_or_default(),
                        Err(_) => Vec::new(),
                    }
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to read store");
                return Err(e.into());
            }
        };
        debug!(path = %path.display(), count = posts.len(), "store loaded");

        Ok(Self {
            inner: Arc::new(RwLock::new(PostIndex::from_posts(posts))),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn records(&self) -> Vec<Post> {
        self.inner.read().await.posts.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.posts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn persist(&self, posts: &[Post]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(posts)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl NewsStore for JsonFileStore {
    async fn write_news(&self, batch: &[Post]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let (len, next_id) = (inner.posts.len(), inner.next_id);

        let added = inner.insert_batch(batch);
        if added == 0 {
            debug!(received = batch.len(), "no new posts to persist");
            return Ok(());
        }

        if let Err(err) = self.persist(&inner.posts).await {
            inner.rollback_to(len, next_id);
            return Err(err);
        }
        debug!(received = batch.len(), added, path = %self.path.display(), "posts persisted");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn post(link: &str) -> Post {
        Post {
            id: None,
            title: format!("title {link}"),
            content: "content".into(),
            published_at: Utc.with_ymd_and_hms(2024, 10, 21, 7, 28, 0).unwrap(),
            link: link.into(),
        }
    }

    #[tokio::test]
    async fn memory_store_ignores_known_links() {
        let store = MemoryStore::new();
        let batch = vec![post("a"), post("b"), post("c")];

        store.write_news(&batch).await.unwrap();
        store.write_news(&batch).await.unwrap();

        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn duplicate_links_inside_one_batch_keep_the_first() {
        let store = MemoryStore::new();
        let mut second = post("a");
        second.title = "second".into();

        store.write_news(&[post("a"), second]).await.unwrap();

        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "title a");
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = MemoryStore::new();
        store.write_news(&[post("a"), post("b")]).await.unwrap();
        store.write_news(&[post("b"), post("c")]).await.unwrap();

        let ids: Vec<_> = store.records().await.iter().map(|p| p.id).collect();
        assert_eq!(ids, [Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn rollback_forgets_links_added_after_the_mark() {
        let mut index = PostIndex::default();
        index.insert_batch(&[post("a")]);
        index.insert_batch(&[post("b"), post("c")]);
        index.rollback_to(1, 1);

        assert_eq!(index.posts.len(), 1);
        assert!(!index.links.contains("b"));
        assert_eq!(index.insert_batch(&[post("b")]), 1);
        assert_eq!(index.posts[1].id, Some(2));
    }
}
