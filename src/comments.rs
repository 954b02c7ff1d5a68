use crate::model::Comment;
use crate::store::CommentStore;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Latest comments of one recipe; `None` until the first read completes
pub type CommentFeed = watch::Receiver<Option<Vec<Comment>>>;

/// A running live subscription to one recipe's comments.
///
/// The background task is aborted on `cancel` or when the handle is dropped.
pub struct SubscriptionHandle {
    recipe_id: String,
    receiver: CommentFeed,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Start pushing the `limit` newest comments of `recipe_id`
    pub fn spawn(
        store: Arc<dyn CommentStore>,
        recipe_id: &str,
        limit: usize,
        poll_interval: Duration,
    ) -> Self {
        let (sender, receiver) = watch::channel(None);
        let id = recipe_id.to_string();

        let task = tokio::spawn(async move {
            loop {
                match store.recent_comments(&id, limit).await {
                    Ok(comments) => {
                        sender.send_if_modified(|current| {
                            if current.as_ref() == Some(&comments) {
                                false
                            } else {
                                *current = Some(comments);
                                true
                            }
                        });
                    }
                    Err(e) => warn!("Error loading comments for {}: {}", id, e),
                }

                if sender.is_closed() {
                    debug!("All readers of {} comments are gone", id);
                    break;
                }
                sleep(poll_interval).await;
            }
        });

        Self {
            recipe_id: recipe_id.to_string(),
            receiver,
            task,
        }
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn feed(&self) -> CommentFeed {
        self.receiver.clone()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// At most one live comment subscription per recipe
pub struct SubscriptionRegistry {
    store: Arc<dyn CommentStore>,
    limit: usize,
    poll_interval: Duration,
    active: HashMap<String, SubscriptionHandle>,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn CommentStore>, limit: usize, poll_interval: Duration) -> Self {
        Self {
            store,
            limit,
            poll_interval,
            active: HashMap::new(),
        }
    }

    /// Open the comment feed of `recipe_id`, replacing any earlier subscription to it
    pub fn subscribe(&mut self, recipe_id: &str) -> CommentFeed {
        if let Some(previous) = self.active.remove(recipe_id) {
            debug!("Replacing comment subscription for {}", recipe_id);
            previous.cancel();
        }

        let handle = SubscriptionHandle::spawn(
            self.store.clone(),
            recipe_id,
            self.limit,
            self.poll_interval,
        );
        let feed = handle.feed();
        self.active.insert(recipe_id.to_string(), handle);
        feed
    }

    /// Cancel the subscription of `recipe_id`; returns whether one was open
    pub fn cancel(&mut self, recipe_id: &str) -> bool {
        match self.active.remove(recipe_id) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.active.drain() {
            handle.cancel();
        }
    }

    pub fn is_active(&self, recipe_id: &str) -> bool {
        self.active.contains_key(recipe_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
