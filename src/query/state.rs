//! Entry state as seen by subscribers, plus the typed handle views hold.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::descriptor::Descriptor;
use super::store::Subscription;
use crate::error::FetchError;

/// Network status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
  /// Never fetched
  #[default]
  Idle,
  /// A fetch is in flight
  Loading,
  /// Last fetch succeeded
  Success,
  /// Last fetch failed
  Error,
}

/// Point-in-time copy of a cache entry.
///
/// `data` is the last successful payload. It survives staleness, refetches
/// and later errors so views can keep showing last-known-good data.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
  pub status: QueryStatus,
  pub data: Option<Arc<Value>>,
  pub error: Option<FetchError>,
  pub is_stale: bool,
  pub updated_at: Option<DateTime<Utc>>,
}

impl QuerySnapshot {
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  /// Loading while older data is still on screen.
  pub fn is_refreshing(&self) -> bool {
    self.is_loading() && self.data.is_some()
  }

  /// Decode the payload into a concrete type.
  pub fn decode<T: DeserializeOwned>(&self) -> Option<Result<T, FetchError>> {
    self
      .data
      .as_ref()
      .map(|v| T::deserialize(v.as_ref()).map_err(FetchError::from))
  }
}

/// The state of a typed query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is fetching and has nothing to show yet
  Loading,
  /// Data is available (possibly being refreshed)
  Success(Arc<T>),
  /// Query failed and has nothing to show
  Error(FetchError),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }
}

/// Typed, view-side handle on a shared cache entry.
///
/// Wraps a [`Subscription`] and decodes the JSON payload once per change.
/// Call [`Query::poll`] on every tick; it returns `true` when the view should
/// re-render. Dropping the query unsubscribes.
pub struct Query<T> {
  subscription: Subscription,
  snapshot: QuerySnapshot,
  data: Option<Arc<T>>,
  decode_error: Option<FetchError>,
  _phantom: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Query<T> {
  pub fn new(subscription: Subscription) -> Self {
    let mut query = Self {
      subscription,
      snapshot: QuerySnapshot::default(),
      data: None,
      decode_error: None,
      _phantom: PhantomData,
    };
    query.refresh();
    query
  }

  /// Pick up changes from the store. Returns `true` if anything changed.
  pub fn poll(&mut self) -> bool {
    if self.subscription.poll() {
      self.refresh();
      true
    } else {
      false
    }
  }

  fn refresh(&mut self) {
    let snapshot = self.subscription.snapshot();
    let payload_changed = match (&snapshot.data, &self.snapshot.data) {
      (Some(new), Some(old)) => !Arc::ptr_eq(new, old),
      (None, None) => false,
      _ => true,
    };
    if payload_changed {
      match snapshot.decode::<T>() {
        Some(Ok(value)) => {
          self.data = Some(Arc::new(value));
          self.decode_error = None;
        }
        Some(Err(e)) => {
          tracing::warn!(query = %self.subscription.descriptor(), error = %e, "failed to decode payload");
          self.data = None;
          self.decode_error = Some(e);
        }
        None => {
          self.data = None;
          self.decode_error = None;
        }
      }
    }
    self.snapshot = snapshot;
  }

  /// Current state, collapsing "data present" to `Success`.
  pub fn state(&self) -> QueryState<T> {
    if let Some(data) = &self.data {
      return QueryState::Success(Arc::clone(data));
    }
    if let Some(e) = &self.decode_error {
      return QueryState::Error(e.clone());
    }
    match self.snapshot.status {
      QueryStatus::Idle => QueryState::Idle,
      QueryStatus::Loading => QueryState::Loading,
      // Success without data only happens if decoding failed, handled above
      QueryStatus::Success => QueryState::Idle,
      QueryStatus::Error => QueryState::Error(
        self
          .snapshot
          .error
          .clone()
          .unwrap_or_else(|| FetchError::Network("unknown error".to_string())),
      ),
    }
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }

  pub fn is_loading(&self) -> bool {
    self.snapshot.is_loading()
  }

  pub fn is_refreshing(&self) -> bool {
    self.snapshot.is_refreshing()
  }

  pub fn is_error(&self) -> bool {
    self.snapshot.status == QueryStatus::Error || self.decode_error.is_some()
  }

  /// Error of the latest fetch, even when older data is still shown.
  pub fn error(&self) -> Option<&FetchError> {
    self.decode_error.as_ref().or(self.snapshot.error.as_ref())
  }

  pub fn snapshot(&self) -> &QuerySnapshot {
    &self.snapshot
  }

  pub fn descriptor(&self) -> &Descriptor {
    self.subscription.descriptor()
  }

  /// Explicitly re-run the fetch (manual retry).
  pub fn refetch(&self) {
    self.subscription.refetch();
  }
}

impl<T> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("descriptor", self.subscription.descriptor())
      .field("snapshot", &self.snapshot)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_decode_payload() {
    let snapshot = QuerySnapshot {
      status: QueryStatus::Success,
      data: Some(Arc::new(json!([1, 2, 3]))),
      ..Default::default()
    };
    let decoded: Vec<i32> = snapshot.decode().unwrap().unwrap();
    assert_eq!(decoded, vec![1, 2, 3]);
  }

  #[test]
  fn test_decode_mismatch_is_decode_error() {
    let snapshot = QuerySnapshot {
      data: Some(Arc::new(json!({"not": "a list"}))),
      ..Default::default()
    };
    let decoded = snapshot.decode::<Vec<i32>>().unwrap();
    assert!(matches!(decoded, Err(FetchError::Decode(_))));
  }

  #[test]
  fn test_refreshing_requires_data() {
    let mut snapshot = QuerySnapshot {
      status: QueryStatus::Loading,
      ..Default::default()
    };
    assert!(snapshot.is_loading());
    assert!(!snapshot.is_refreshing());

    snapshot.data = Some(Arc::new(json!(null)));
    assert!(snapshot.is_refreshing());
  }
}
