//! The shared query cache.
//!
//! `QueryStore` resolves descriptors to cache entries, runs at most one fetch
//! per entry at a time, and notifies every subscriber of an entry through a
//! `watch` channel. Views never touch entries directly: they hold a
//! [`Subscription`] (or a typed [`Query`](super::Query)) and poll it.

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::descriptor::{Descriptor, DescriptorPattern};
use super::persist::{NoopStorage, SnapshotStorage};
use super::state::{QuerySnapshot, QueryStatus};
use crate::error::FetchError;

/// Translates a descriptor into a network request.
///
/// One fetcher serves the whole store and dispatches on the descriptor's
/// category. Closures `Fn(Descriptor) -> impl Future` implement it.
pub trait QueryFn: Send + Sync {
  fn fetch(&self, descriptor: Descriptor) -> BoxFuture<'static, Result<Value, FetchError>>;
}

impl<F, Fut> QueryFn for F
where
  F: Fn(Descriptor) -> Fut + Send + Sync,
  Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
  fn fetch(&self, descriptor: Descriptor) -> BoxFuture<'static, Result<Value, FetchError>> {
    self(descriptor).boxed()
  }
}

/// Tuning knobs for the store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// Successful data older than this is refetched on the next resolution
  pub stale_time: Duration,
  /// How long an entry without subscribers is kept before collection
  pub gc_grace: Duration,
  /// Upper bound on a single network call
  pub fetch_timeout: Option<Duration>,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::from_secs(5 * 60),
      gc_grace: Duration::from_secs(60),
      fetch_timeout: Some(Duration::from_secs(15)),
    }
  }
}

type FetchOutcome = Result<Arc<Value>, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

struct Entry {
  descriptor: Descriptor,
  tx: watch::Sender<QuerySnapshot>,
  in_flight: Option<SharedFetch>,
  /// Id of the latest fetch started for this entry
  fetch_id: u64,
  /// Invalidated while a fetch was in flight; fetch again once it lands
  refetch_pending: bool,
  subscribers: usize,
  idle_since: Option<Instant>,
  fetched_at: Option<Instant>,
}

struct Inner {
  entries: Mutex<HashMap<String, Entry>>,
  fetcher: Box<dyn QueryFn>,
  storage: Arc<dyn SnapshotStorage>,
  options: StoreOptions,
  next_fetch: AtomicU64,
}

/// Process-wide query cache. Cloning is cheap and shares the same cache.
#[derive(Clone)]
pub struct QueryStore {
  inner: Arc<Inner>,
}

enum Resolution {
  Cached(Arc<Value>),
  Wait(SharedFetch),
}

/// What an optimistic write replaced, for undoing it.
pub(crate) struct Rollback {
  descriptor: Descriptor,
  previous: QuerySnapshot,
  optimistic: Arc<Value>,
  previous_fetched_at: Option<Instant>,
}

impl QueryStore {
  /// Create a store that keeps everything in memory.
  pub fn new(fetcher: impl QueryFn + 'static, options: StoreOptions) -> Self {
    Self::with_storage(fetcher, options, Arc::new(NoopStorage))
  }

  /// Create a store that persists successful payloads and hydrates new
  /// entries from them.
  pub fn with_storage(
    fetcher: impl QueryFn + 'static,
    options: StoreOptions,
    storage: Arc<dyn SnapshotStorage>,
  ) -> Self {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        fetcher: Box::new(fetcher),
        storage,
        options,
        next_fetch: AtomicU64::new(0),
      }),
    }
  }

  pub fn options(&self) -> &StoreOptions {
    &self.inner.options
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
    self
      .inner
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Register interest in a descriptor.
  ///
  /// Creates the entry if needed and schedules a fetch when the entry has
  /// never been fetched or is stale. Never fails: fetch errors show up in the
  /// subscription's snapshot.
  pub fn subscribe(&self, descriptor: Descriptor) -> Subscription {
    let key = descriptor.key();
    let rx = {
      let mut entries = self.entries();
      let entry = entries
        .entry(key.clone())
        .or_insert_with(|| self.create_entry(&descriptor));
      entry.subscribers += 1;
      entry.idle_since = None;
      let rx = entry.tx.subscribe();
      if self.needs_fetch(entry) {
        self.start_fetch(&key, entry);
      }
      rx
    };
    trace!(query = %descriptor, "subscribed");

    Subscription {
      store: self.clone(),
      key,
      descriptor,
      rx,
    }
  }

  /// Resolve a descriptor to its data, fetching if there is no fresh data.
  ///
  /// Joins the in-flight request if one exists. Unlike `subscribe`, an
  /// errored entry is retried.
  pub async fn fetch(&self, descriptor: &Descriptor) -> Result<Arc<Value>, FetchError> {
    let resolution = {
      let key = descriptor.key();
      let mut entries = self.entries();
      let entry = entries
        .entry(key.clone())
        .or_insert_with(|| self.create_entry(descriptor));
      let cached = entry.tx.borrow().data.clone();
      if let Some(fetch) = &entry.in_flight {
        Resolution::Wait(fetch.clone())
      } else if self.needs_fetch(entry) || entry.tx.borrow().status == QueryStatus::Error {
        Resolution::Wait(self.start_fetch(&key, entry))
      } else if let Some(data) = cached {
        Resolution::Cached(data)
      } else {
        Resolution::Wait(self.start_fetch(&key, entry))
      }
    };

    match resolution {
      Resolution::Cached(data) => Ok(data),
      Resolution::Wait(fetch) => fetch.await,
    }
  }

  /// Re-run the fetch for an entry, joining one already in flight.
  pub fn refetch(&self, descriptor: &Descriptor) {
    let key = descriptor.key();
    let mut entries = self.entries();
    if let Some(entry) = entries.get_mut(&key) {
      if entry.in_flight.is_none() {
        self.start_fetch(&key, entry);
      }
    }
  }

  /// Mark every entry matching any pattern as stale.
  ///
  /// Entries with subscribers refetch now, the rest on their next
  /// resolution. Returns the number of entries marked.
  pub fn invalidate(&self, patterns: &[DescriptorPattern]) -> usize {
    let mut entries = self.entries();
    let mut marked = 0;
    for (key, entry) in entries.iter_mut() {
      if !patterns.iter().any(|p| p.matches(&entry.descriptor)) {
        continue;
      }
      marked += 1;
      entry.tx.send_modify(|s| s.is_stale = true);
      if entry.in_flight.is_some() {
        entry.refetch_pending = true;
      } else if entry.subscribers > 0 {
        self.start_fetch(key, entry);
      }
    }
    debug!(marked, "invalidated queries");
    marked
  }

  /// Overwrite an entry's data for the duration of a write.
  ///
  /// A fetch already in flight still lands on top of this value.
  pub(crate) fn set_optimistic(&self, descriptor: &Descriptor, data: Value) -> Rollback {
    let key = descriptor.key();
    let mut entries = self.entries();
    let entry = entries
      .entry(key)
      .or_insert_with(|| self.create_entry(descriptor));
    let previous = entry.tx.borrow().clone();
    let previous_fetched_at = entry.fetched_at;
    let optimistic = Arc::new(data);
    entry.fetched_at = Some(Instant::now());
    entry.tx.send_modify(|s| {
      s.status = QueryStatus::Success;
      s.data = Some(Arc::clone(&optimistic));
      s.error = None;
      s.is_stale = false;
      s.updated_at = Some(Utc::now());
    });
    Rollback {
      descriptor: descriptor.clone(),
      previous,
      optimistic,
      previous_fetched_at,
    }
  }

  /// Undo an optimistic value.
  ///
  /// Only applies while the entry still shows that value: data fetched in
  /// the meantime wins. The entry never ends up loading without a fetch.
  pub(crate) fn restore(&self, rollback: Rollback) {
    let key = rollback.descriptor.key();
    let mut entries = self.entries();
    let Some(entry) = entries.get_mut(&key) else {
      return;
    };
    let untouched = entry
      .tx
      .borrow()
      .data
      .as_ref()
      .is_some_and(|d| Arc::ptr_eq(d, &rollback.optimistic));
    if !untouched {
      debug!(query = %entry.descriptor, "optimistic value already replaced");
      return;
    }

    let current = entry.tx.borrow().clone();
    let mut snapshot = rollback.previous;
    snapshot.is_stale = snapshot.is_stale || current.is_stale;
    entry.fetched_at = rollback.previous_fetched_at;
    if entry.in_flight.is_some() {
      snapshot.status = QueryStatus::Loading;
    } else if current.status == QueryStatus::Error {
      // The fetch that was running failed under the optimistic value
      snapshot.status = QueryStatus::Error;
      snapshot.error = current.error;
    } else if snapshot.status == QueryStatus::Loading {
      snapshot.status = if snapshot.data.is_some() {
        QueryStatus::Success
      } else {
        QueryStatus::Idle
      };
      snapshot.is_stale = true;
    }
    if snapshot.status == QueryStatus::Idle {
      entry.fetched_at = None;
    }
    entry.tx.send_replace(snapshot);

    if entry.subscribers > 0 && self.needs_fetch(entry) {
      self.start_fetch(&key, entry);
    }
  }

  /// Current snapshot of an entry, if it exists. Does not fetch.
  pub fn peek(&self, descriptor: &Descriptor) -> Option<QuerySnapshot> {
    self
      .entries()
      .get(&descriptor.key())
      .map(|e| e.tx.borrow().clone())
  }

  pub fn subscriber_count(&self, descriptor: &Descriptor) -> usize {
    self
      .entries()
      .get(&descriptor.key())
      .map(|e| e.subscribers)
      .unwrap_or(0)
  }

  pub fn entry_count(&self) -> usize {
    self.entries().len()
  }

  /// Drop entries that have had no subscribers for the grace period.
  ///
  /// Entries with a fetch in flight are kept. Returns how many were removed.
  pub fn collect_garbage(&self) -> usize {
    let grace = self.inner.options.gc_grace;
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|_, e| {
      let expired = e.subscribers == 0
        && e.in_flight.is_none()
        && e.idle_since.is_some_and(|t| t.elapsed() >= grace);
      if expired {
        debug!(query = %e.descriptor, "collecting idle query");
      }
      !expired
    });
    before - entries.len()
  }

  /// Forget every entry and every persisted snapshot.
  ///
  /// For a change of session: nothing fetched before survives, and fetches
  /// still in flight finish without landing. Subscriptions should be dropped
  /// first. Returns how many entries were removed.
  pub fn clear(&self) -> usize {
    let removed = {
      let mut entries = self.entries();
      let removed = entries.len();
      entries.clear();
      removed
    };
    if let Err(e) = self.inner.storage.clear() {
      warn!(error = %e, "failed to clear persisted snapshots");
    }
    debug!(removed, "cleared query cache");
    removed
  }

  fn release(&self, key: &str) {
    let mut entries = self.entries();
    if let Some(entry) = entries.get_mut(key) {
      entry.subscribers = entry.subscribers.saturating_sub(1);
      if entry.subscribers == 0 {
        entry.idle_since = Some(Instant::now());
      }
    }
  }

  fn create_entry(&self, descriptor: &Descriptor) -> Entry {
    let mut snapshot = QuerySnapshot::default();
    match self.inner.storage.load(descriptor) {
      Ok(Some(stored)) => {
        debug!(query = %descriptor, "hydrated from snapshot");
        snapshot.status = QueryStatus::Success;
        snapshot.data = Some(Arc::new(stored.data));
        snapshot.is_stale = true;
        snapshot.updated_at = Some(stored.cached_at);
      }
      Ok(None) => {}
      Err(e) => warn!(query = %descriptor, error = %e, "failed to load snapshot"),
    }

    let (tx, _) = watch::channel(snapshot);
    Entry {
      descriptor: descriptor.clone(),
      tx,
      in_flight: None,
      fetch_id: 0,
      refetch_pending: false,
      subscribers: 0,
      idle_since: Some(Instant::now()),
      fetched_at: None,
    }
  }

  fn needs_fetch(&self, entry: &Entry) -> bool {
    if entry.in_flight.is_some() {
      return false;
    }
    let snapshot = entry.tx.borrow();
    match snapshot.status {
      QueryStatus::Idle => true,
      QueryStatus::Loading => false,
      QueryStatus::Success => {
        snapshot.is_stale
          || entry
            .fetched_at
            .is_some_and(|t| t.elapsed() >= self.inner.options.stale_time)
      }
      // No automatic retry: only an invalidation re-arms a failed entry
      QueryStatus::Error => snapshot.is_stale,
    }
  }

  fn start_fetch(&self, key: &str, entry: &mut Entry) -> SharedFetch {
    debug!(query = %entry.descriptor, "fetching");
    entry.tx.send_modify(|s| s.status = QueryStatus::Loading);

    let request = self.inner.fetcher.fetch(entry.descriptor.clone());
    let timeout = self.inner.options.fetch_timeout;
    let store: Weak<Inner> = Arc::downgrade(&self.inner);
    let key = key.to_string();
    let id = self.inner.next_fetch.fetch_add(1, Ordering::Relaxed) + 1;
    entry.fetch_id = id;

    let fetch = async move {
      let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, request).await {
          Ok(result) => result,
          Err(_) => Err(FetchError::Timeout(limit)),
        },
        None => request.await,
      };
      let outcome = result.map(Arc::new);
      if let Some(inner) = store.upgrade() {
        QueryStore { inner }.complete_fetch(&key, id, &outcome);
      }
      outcome
    }
    .boxed()
    .shared();

    entry.in_flight = Some(fetch.clone());

    // Drive the request to completion even if every subscriber goes away
    let driver = fetch.clone();
    tokio::spawn(async move {
      let _ = driver.await;
    });

    fetch
  }

  fn complete_fetch(&self, key: &str, id: u64, outcome: &FetchOutcome) {
    let mut entries = self.entries();
    // Gone, or recreated by a `clear` since this fetch started
    let Some(entry) = entries.get_mut(key).filter(|e| e.fetch_id == id) else {
      return;
    };
    entry.in_flight = None;
    let still_stale = entry.refetch_pending;

    match outcome {
      Ok(data) => {
        debug!(query = %entry.descriptor, "fetch succeeded");
        entry.fetched_at = Some(Instant::now());
        entry.tx.send_modify(|s| {
          s.status = QueryStatus::Success;
          s.data = Some(Arc::clone(data));
          s.error = None;
          s.is_stale = still_stale;
          s.updated_at = Some(Utc::now());
        });
        if let Err(e) = self.inner.storage.store(&entry.descriptor, data) {
          warn!(query = %entry.descriptor, error = %e, "failed to persist snapshot");
        }
      }
      Err(error) => {
        warn!(query = %entry.descriptor, %error, "fetch failed");
        entry.tx.send_modify(|s| {
          s.status = QueryStatus::Error;
          s.error = Some(error.clone());
          s.is_stale = s.is_stale || still_stale;
        });
      }
    }

    if entry.refetch_pending {
      entry.refetch_pending = false;
      if entry.subscribers > 0 {
        self.start_fetch(key, entry);
      }
    }
  }
}

/// A view's live interest in one descriptor.
///
/// Dropping it unsubscribes. A fetch still in flight completes and lands in
/// the cache for other subscribers.
pub struct Subscription {
  store: QueryStore,
  key: String,
  descriptor: Descriptor,
  rx: watch::Receiver<QuerySnapshot>,
}

impl Subscription {
  pub fn descriptor(&self) -> &Descriptor {
    &self.descriptor
  }

  pub fn snapshot(&self) -> QuerySnapshot {
    self.rx.borrow().clone()
  }

  /// Returns `true` if the entry changed since the last poll.
  pub fn poll(&mut self) -> bool {
    match self.rx.has_changed() {
      Ok(true) => {
        let _ = self.rx.borrow_and_update();
        true
      }
      _ => false,
    }
  }

  /// Wait for the next change and return the new snapshot.
  pub async fn changed(&mut self) -> QuerySnapshot {
    let _ = self.rx.changed().await;
    self.rx.borrow_and_update().clone()
  }

  /// Wait until the entry is no longer loading.
  pub async fn settled(&mut self) -> QuerySnapshot {
    loop {
      let snapshot = self.rx.borrow_and_update().clone();
      if !snapshot.is_loading() {
        return snapshot;
      }
      if self.rx.changed().await.is_err() {
        return self.snapshot();
      }
    }
  }

  pub fn refetch(&self) {
    self.store.refetch(&self.descriptor);
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    trace!(query = %self.descriptor, "unsubscribed");
    self.store.release(&self.key);
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("descriptor", &self.descriptor)
      .finish_non_exhaustive()
  }
}
