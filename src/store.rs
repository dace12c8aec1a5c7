//! Post store - the loaded post set and its loading state
//!
//! A store starts out loading with no posts, is filled exactly once from a
//! [`PostSource`], and is immutable afterwards. Load failures are logged and
//! leave the store empty; consumers never see an error, only an empty list.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::content::Post;
use crate::query::PostQuery;
use crate::source::PostSource;

/// The post set together with its loading flag
#[derive(Debug, Clone)]
pub struct PostStore {
    posts: Vec<Post>,
    loading: bool,
}

impl PostStore {
    /// A store whose load has not finished yet
    pub fn pending() -> Self {
        Self {
            posts: Vec::new(),
            loading: true,
        }
    }

    /// A loaded store holding `posts` in the given order.
    ///
    /// Posts whose key is already taken are dropped, keeping the first.
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let mut seen = HashSet::new();
        let posts = posts
            .into_iter()
            .filter(|post| {
                let fresh = seen.insert(post.key().to_string());
                if !fresh {
                    tracing::warn!(
                        "Dropping post {} ({:?}): key {:?} is already taken",
                        post.id,
                        post.title,
                        post.key()
                    );
                }
                fresh
            })
            .collect();

        Self {
            posts,
            loading: false,
        }
    }

    /// Fetch from `source` and build a loaded store. A failed fetch yields an
    /// empty store.
    pub async fn load(source: &dyn PostSource) -> Self {
        tracing::debug!("Loading posts from {}", source.describe());

        match source.fetch().await {
            Ok(posts) => {
                let store = Self::from_posts(posts);
                tracing::info!("Loaded {} posts from {}", store.len(), source.describe());
                store
            }
            Err(e) => {
                tracing::error!("Failed to load posts from {}: {}", source.describe(), e);
                Self::from_posts(Vec::new())
            }
        }
    }

    /// Posts in store order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// True until the load has finished, successfully or not
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn query(&self) -> PostQuery<'_> {
        PostQuery::new(&self.posts)
    }
}

impl Default for PostStore {
    fn default() -> Self {
        Self::pending()
    }
}

/// Shared, observable access to a store that may still be loading.
///
/// Cloning the handle is cheap; every clone observes the same load.
#[derive(Clone)]
pub struct StoreHandle {
    rx: watch::Receiver<Arc<PostStore>>,
}

impl StoreHandle {
    /// Start loading from `source` in the background
    pub fn spawn(source: Arc<dyn PostSource>) -> Self {
        let (tx, rx) = watch::channel(Arc::new(PostStore::pending()));

        tokio::spawn(async move {
            let store = PostStore::load(source.as_ref()).await;
            // Nobody listening is fine, the load result is simply dropped
            let _ = tx.send(Arc::new(store));
        });

        Self { rx }
    }

    /// A handle over an already loaded store
    pub fn ready(store: PostStore) -> Self {
        let (_tx, rx) = watch::channel(Arc::new(store));
        Self { rx }
    }

    /// The store as it is right now
    pub fn current(&self) -> Arc<PostStore> {
        self.rx.borrow().clone()
    }

    /// Wait for the load to finish and return the loaded store
    pub async fn wait_loaded(&self) -> Arc<PostStore> {
        let mut rx = self.rx.clone();
        let finished = rx
            .wait_for(|store| !store.is_loading())
            .await
            .map(|store| Arc::clone(&store));
        match finished {
            Ok(store) => store,
            // The loader went away without publishing; report what we have
            Err(_) => {
                let store = rx.borrow().clone();
                if store.is_loading() {
                    tracing::warn!("Post loader stopped before finishing");
                    Arc::new(PostStore::from_posts(Vec::new()))
                } else {
                    store
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::source::BundledSource;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn post(id: &str, title: &str) -> Post {
        Post::new(id, title, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    struct FailingSource;

    #[async_trait]
    impl PostSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        async fn fetch(&self) -> Result<Vec<Post>, LoadError> {
            Err(LoadError::Transport {
                url: "http://localhost/api/v1/posts".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    /// Holds the fetch open until released
    struct GatedSource {
        gate: Arc<Notify>,
        posts: Vec<Post>,
    }

    #[async_trait]
    impl PostSource for GatedSource {
        fn describe(&self) -> String {
            "gated".to_string()
        }

        async fn fetch(&self) -> Result<Vec<Post>, LoadError> {
            self.gate.notified().await;
            Ok(self.posts.clone())
        }
    }

    #[test]
    fn test_pending_store_is_empty_and_loading() {
        let store = PostStore::pending();
        assert!(store.is_loading());
        assert!(store.is_empty());
        assert!(store.query().featured_default().is_empty());
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let store = PostStore::from_posts(vec![
            post("1", "Same Title"),
            post("2", "Same Title"),
            post("3", "Other"),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.query().find_by_key("same-title").map(|p| p.id.as_str()), Some("1"));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_load_keeps_source_order() {
        let source = BundledSource::new(vec![post("b", "Beta"), post("a", "Alpha")]);
        let store = PostStore::load(&source).await;
        assert!(!store.is_loading());
        let ids: Vec<&str> = store.posts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_failed_load_is_empty_not_loading() {
        let store = PostStore::load(&FailingSource).await;
        assert!(!store.is_loading());
        assert!(store.is_empty());
        assert!(store.query().find_by_key("anything").is_none());
    }

    #[tokio::test]
    async fn test_handle_transitions_once() {
        let gate = Arc::new(Notify::new());
        let handle = StoreHandle::spawn(Arc::new(GatedSource {
            gate: gate.clone(),
            posts: vec![post("1", "First")],
        }));

        let before = handle.current();
        assert!(before.is_loading());
        assert!(before.is_empty());

        gate.notify_one();
        let loaded = handle.wait_loaded().await;
        assert!(!loaded.is_loading());
        assert_eq!(loaded.len(), 1);

        // Later observers see the same finished store
        tokio::time::sleep(Duration::from_millis(10)).await;
        let again = handle.clone().wait_loaded().await;
        assert!(Arc::ptr_eq(&loaded, &again));
        assert!(!handle.current().is_loading());
    }

    #[tokio::test]
    async fn test_handle_over_failing_source() {
        let handle = StoreHandle::spawn(Arc::new(FailingSource));
        let store = handle.wait_loaded().await;
        assert!(!store.is_loading());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_ready_handle() {
        let handle = StoreHandle::ready(PostStore::from_posts(vec![post("1", "One")]));
        assert!(!handle.current().is_loading());
        assert_eq!(handle.wait_loaded().await.len(), 1);
    }
}
