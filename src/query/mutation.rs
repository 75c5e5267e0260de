//! Write operations and their effect on the cache.

use serde_json::Value;
use std::future::Future;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::descriptor::{Descriptor, DescriptorPattern};
use super::store::QueryStore;
use crate::error::{FetchError, MutationError};

/// A named write and the cache entries it affects.
///
/// ```ignore
/// let mutation = Mutation::new("add bookmark")
///   .invalidates(DescriptorPattern::category("bookmarks"));
/// store.mutate(&mutation, api.add_bookmark(&new)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Mutation {
  name: String,
  invalidates: Vec<DescriptorPattern>,
  optimistic: Vec<(Descriptor, Value)>,
}

impl Mutation {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      invalidates: Vec::new(),
      optimistic: Vec::new(),
    }
  }

  /// Entries matching this pattern go stale when the write succeeds.
  pub fn invalidates(mut self, pattern: DescriptorPattern) -> Self {
    self.invalidates.push(pattern);
    self
  }

  /// Show `value` for `descriptor` while the write is in flight. Rolled back
  /// if the write fails.
  pub fn optimistic(mut self, descriptor: Descriptor, value: Value) -> Self {
    self.optimistic.push((descriptor, value));
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn patterns(&self) -> &[DescriptorPattern] {
    &self.invalidates
  }
}

impl QueryStore {
  /// Run a write and propagate its outcome to the cache.
  ///
  /// On success every entry matching the mutation's patterns is invalidated.
  /// On failure optimistic values are rolled back and nothing else changes.
  pub async fn mutate<T, Fut>(&self, mutation: &Mutation, write: Fut) -> Result<T, MutationError>
  where
    Fut: Future<Output = Result<T, FetchError>>,
  {
    let rollbacks: Vec<_> = mutation
      .optimistic
      .iter()
      .map(|(descriptor, value)| self.set_optimistic(descriptor, value.clone()))
      .collect();

    match write.await {
      Ok(value) => {
        let invalidated = self.invalidate(&mutation.invalidates);
        info!(mutation = %mutation.name, invalidated, "mutation succeeded");
        Ok(value)
      }
      Err(source) => {
        warn!(mutation = %mutation.name, error = %source, "mutation failed");
        for rollback in rollbacks {
          self.restore(rollback);
        }
        Err(MutationError {
          mutation: mutation.name.clone(),
          source,
        })
      }
    }
  }

  /// Run a mutation on the runtime and hand back a handle to poll.
  pub fn spawn_mutation<T, Fut>(&self, mutation: Mutation, write: Fut) -> PendingMutation<T>
  where
    T: Send + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    let store = self.clone();
    let name = mutation.name.clone();
    tokio::spawn(async move {
      let result = store.mutate(&mutation, write).await;
      // Receiver may have been dropped with its view
      let _ = tx.send(result);
    });
    PendingMutation { name, rx: Some(rx) }
  }
}

/// Outcome of a spawned mutation, polled from a view's tick.
pub struct PendingMutation<T> {
  name: String,
  rx: Option<oneshot::Receiver<Result<T, MutationError>>>,
}

impl<T> PendingMutation<T> {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn is_pending(&self) -> bool {
    self.rx.is_some()
  }

  /// Returns the outcome once, when it arrives.
  pub fn poll(&mut self) -> Option<Result<T, MutationError>> {
    let rx = self.rx.as_mut()?;
    match rx.try_recv() {
      Ok(result) => {
        self.rx = None;
        Some(result)
      }
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.rx = None;
        Some(Err(MutationError {
          mutation: self.name.clone(),
          source: FetchError::Network("mutation was cancelled".to_string()),
        }))
      }
    }
  }

  /// Wait for the outcome.
  pub async fn wait(mut self) -> Result<T, MutationError> {
    match self.rx.take() {
      Some(rx) => rx.await.unwrap_or_else(|_| {
        Err(MutationError {
          mutation: self.name.clone(),
          source: FetchError::Network("mutation was cancelled".to_string()),
        })
      }),
      None => Err(MutationError {
        mutation: self.name.clone(),
        source: FetchError::Network("mutation already completed".to_string()),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::{QueryStatus, StoreOptions};
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use tokio::sync::Notify;

  fn bookmarks() -> Descriptor {
    Descriptor::new("bookmarks")
  }

  /// Store whose "bookmarks" fetch reports how many times it ran.
  fn store_with_counter() -> (QueryStore, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let store = QueryStore::new(
      move |_d: Descriptor| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move { Ok::<_, FetchError>(json!({ "version": n })) }
      },
      StoreOptions::default(),
    );
    (store, calls)
  }

  #[tokio::test]
  async fn test_success_invalidates_and_refetches_subscribed() {
    let (store, calls) = store_with_counter();
    let mut sub = store.subscribe(bookmarks());
    sub.settled().await;

    let mutation = Mutation::new("add bookmark").invalidates(DescriptorPattern::category("bookmarks"));
    let id = store
      .mutate(&mutation, async { Ok::<_, FetchError>(42) })
      .await
      .unwrap();
    assert_eq!(id, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let snapshot = sub.settled().await;
    assert_eq!(snapshot.data.unwrap()["version"], 2);
  }

  #[tokio::test]
  async fn test_success_only_touches_matching_entries() {
    let (store, calls) = store_with_counter();
    let mut books = store.subscribe(Descriptor::new("books").with("rust"));
    let mut marks = store.subscribe(bookmarks());
    books.settled().await;
    marks.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let mutation = Mutation::new("remove bookmark").invalidates(DescriptorPattern::exact(&bookmarks()));
    store.mutate(&mutation, async { Ok::<_, FetchError>(()) }).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!store.peek(&Descriptor::new("books").with("rust")).unwrap().is_stale);
  }

  #[tokio::test]
  async fn test_failure_leaves_cache_untouched() {
    let (store, calls) = store_with_counter();
    let mut sub = store.subscribe(bookmarks());
    sub.settled().await;

    let mutation = Mutation::new("add bookmark").invalidates(DescriptorPattern::category("bookmarks"));
    let err = store
      .mutate(&mutation, async {
        Err::<(), _>(FetchError::Http {
          status: 409,
          message: "already bookmarked".to_string(),
        })
      })
      .await
      .unwrap_err();

    assert_eq!(err.mutation, "add bookmark");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let snapshot = store.peek(&bookmarks()).unwrap();
    assert!(!snapshot.is_stale);
    assert_eq!(snapshot.data.unwrap()["version"], 1);
  }

  #[tokio::test]
  async fn test_optimistic_value_rolled_back_on_failure() {
    let (store, _calls) = store_with_counter();
    let mut sub = store.subscribe(bookmarks());
    sub.settled().await;

    let mutation = Mutation::new("remove bookmark").optimistic(bookmarks(), json!({ "version": 0 }));
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let pending = store.spawn_mutation(mutation, async move {
      let _ = release_rx.await;
      Err::<(), _>(FetchError::Network("offline".to_string()))
    });
    tokio::task::yield_now().await;

    // Optimistic value is visible while the write runs
    let during = store.peek(&bookmarks()).unwrap();
    assert_eq!(during.data.unwrap()["version"], 0);

    release_tx.send(()).unwrap();
    assert!(pending.wait().await.is_err());

    let after = store.peek(&bookmarks()).unwrap();
    assert_eq!(after.status, QueryStatus::Success);
    assert_eq!(after.data.unwrap()["version"], 1);
  }

  /// Store whose fetches count up and wait for `gate`. The second call fails.
  fn gated_store() -> (QueryStore, Arc<AtomicUsize>, Arc<Notify>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let (counter, fetch_gate) = (calls.clone(), gate.clone());
    let store = QueryStore::new(
      move |_d: Descriptor| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        let gate = fetch_gate.clone();
        async move {
          gate.notified().await;
          if n == 2 {
            return Err(FetchError::Network("reset".to_string()));
          }
          Ok::<_, FetchError>(json!({ "version": n }))
        }
      },
      StoreOptions::default(),
    );
    (store, calls, gate)
  }

  fn failing_write(release: oneshot::Receiver<()>) -> impl Future<Output = Result<(), FetchError>> {
    async move {
      let _ = release.await;
      Err(FetchError::Network("offline".to_string()))
    }
  }

  #[tokio::test]
  async fn test_rollback_keeps_data_fetched_during_write() {
    let (store, calls, gate) = gated_store();
    let mut sub = store.subscribe(bookmarks());
    assert!(sub.snapshot().is_loading());

    let mutation = Mutation::new("remove bookmark").optimistic(bookmarks(), json!({ "version": 0 }));
    let (release_tx, release_rx) = oneshot::channel();
    let pending = store.spawn_mutation(mutation, failing_write(release_rx));
    tokio::task::yield_now().await;
    assert_eq!(store.peek(&bookmarks()).unwrap().data.unwrap()["version"], 0);

    // The fetch that was already running lands before the write fails
    gate.notify_one();
    loop {
      let snapshot = sub.changed().await;
      if snapshot.data.is_some_and(|d| d["version"] == 1) {
        break;
      }
    }

    release_tx.send(()).unwrap();
    assert!(pending.wait().await.is_err());

    let after = store.peek(&bookmarks()).unwrap();
    assert_eq!(after.status, QueryStatus::Success);
    assert_eq!(after.data.unwrap()["version"], 1);

    drop(sub);
    let late = store.subscribe(bookmarks());
    assert_eq!(late.snapshot().status, QueryStatus::Success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_rollback_during_fetch_stays_loading() {
    let (store, calls, gate) = gated_store();
    let mut sub = store.subscribe(bookmarks());

    let mutation = Mutation::new("remove bookmark").optimistic(bookmarks(), json!({ "version": 0 }));
    let (release_tx, release_rx) = oneshot::channel();
    let pending = store.spawn_mutation(mutation, failing_write(release_rx));
    tokio::task::yield_now().await;

    release_tx.send(()).unwrap();
    assert!(pending.wait().await.is_err());
    // Still waiting on the original fetch
    assert!(store.peek(&bookmarks()).unwrap().is_loading());

    gate.notify_one();
    let snapshot = sub.settled().await;
    assert_eq!(snapshot.status, QueryStatus::Success);
    assert_eq!(snapshot.data.unwrap()["version"], 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_rollback_after_failed_fetch_keeps_error() {
    let (store, calls, gate) = gated_store();
    let mut sub = store.subscribe(bookmarks());
    gate.notify_one();
    sub.settled().await;

    // A refetch under the optimistic value fails
    let mutation = Mutation::new("remove bookmark").optimistic(bookmarks(), json!({ "version": 0 }));
    let (release_tx, release_rx) = oneshot::channel();
    let pending = store.spawn_mutation(mutation, failing_write(release_rx));
    tokio::task::yield_now().await;
    sub.refetch();
    gate.notify_one();
    assert_eq!(sub.settled().await.status, QueryStatus::Error);

    release_tx.send(()).unwrap();
    assert!(pending.wait().await.is_err());

    let after = store.peek(&bookmarks()).unwrap();
    assert_eq!(after.status, QueryStatus::Error);
    assert_eq!(after.data.unwrap()["version"], 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_pending_mutation_polls_once() {
    let (store, _calls) = store_with_counter();
    let mut pending = store.spawn_mutation(Mutation::new("noop"), async { Ok::<_, FetchError>("done") });
    assert!(pending.is_pending());

    let mut outcome = None;
    for _ in 0..10 {
      tokio::task::yield_now().await;
      if let Some(result) = pending.poll() {
        outcome = Some(result);
        break;
      }
    }
    assert_eq!(outcome, Some(Ok("done")));
    assert!(!pending.is_pending());
    assert_eq!(pending.poll(), None);
  }
}
