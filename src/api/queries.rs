//! Typed descriptors for every backend read, and the fetcher that serves
//! them.

use super::client::ApiClient;
use crate::catalog;
use crate::error::FetchError;
use crate::query::{Descriptor, DescriptorPattern, QueryFn};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

/// Every read the app performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CareerQuery {
  Profile,
  Careers,
  Roadmap { career_id: String },
  Internships { q: String, location: String },
  /// An empty `q` means the featured catalog
  Books { q: String },
  Bookmarks,
}

impl CareerQuery {
  pub const PROFILE: &'static str = "profile";
  pub const CAREERS: &'static str = "careers";
  pub const ROADMAP: &'static str = "roadmap";
  pub const INTERNSHIPS: &'static str = "internships";
  pub const BOOKS: &'static str = "books";
  pub const BOOKMARKS: &'static str = "bookmarks";

  pub fn descriptor(&self) -> Descriptor {
    match self {
      CareerQuery::Profile => Descriptor::new(Self::PROFILE),
      CareerQuery::Careers => Descriptor::new(Self::CAREERS),
      CareerQuery::Roadmap { career_id } => Descriptor::new(Self::ROADMAP).with(career_id),
      CareerQuery::Internships { q, location } => Descriptor::new(Self::INTERNSHIPS)
        .with_map([("q", q.trim()), ("location", location.trim())]),
      CareerQuery::Books { q } => Descriptor::new(Self::BOOKS).with(q.trim()),
      CareerQuery::Bookmarks => Descriptor::new(Self::BOOKMARKS),
    }
  }

  pub fn from_descriptor(descriptor: &Descriptor) -> Option<Self> {
    let first_str = || descriptor.param(0).and_then(|p| p.as_str()).map(str::to_string);
    match descriptor.category() {
      Self::PROFILE => Some(CareerQuery::Profile),
      Self::CAREERS => Some(CareerQuery::Careers),
      Self::ROADMAP => first_str().map(|career_id| CareerQuery::Roadmap { career_id }),
      Self::INTERNSHIPS => Some(CareerQuery::Internships {
        q: descriptor.map_str(0, "q").to_string(),
        location: descriptor.map_str(0, "location").to_string(),
      }),
      Self::BOOKS => Some(CareerQuery::Books {
        q: first_str().unwrap_or_default(),
      }),
      Self::BOOKMARKS => Some(CareerQuery::Bookmarks),
      _ => None,
    }
  }

  /// Pattern covering every descriptor of this query's category.
  pub fn category_pattern(&self) -> DescriptorPattern {
    DescriptorPattern::category(self.descriptor().category())
  }

  /// Run the request this query stands for.
  ///
  /// Responses are decoded into their typed form before being re-encoded
  /// for the cache, so a malformed payload is a fetch error and never
  /// replaces good data.
  pub async fn run(self, api: &ApiClient) -> Result<Value, FetchError> {
    let value = match self {
      CareerQuery::Profile => serde_json::to_value(api.profile().await?),
      CareerQuery::Careers => serde_json::to_value(api.careers().await?),
      CareerQuery::Roadmap { career_id } => serde_json::to_value(api.roadmap(&career_id).await?),
      CareerQuery::Internships { q, location } => {
        serde_json::to_value(api.internships(&q, &location).await?)
      }
      CareerQuery::Books { q } if q.is_empty() => serde_json::to_value(catalog::featured_books()),
      CareerQuery::Books { q } => serde_json::to_value(api.books(&q).await?),
      CareerQuery::Bookmarks => serde_json::to_value(api.bookmarks().await?),
    };
    Ok(value?)
  }
}

impl QueryFn for ApiClient {
  fn fetch(&self, descriptor: Descriptor) -> BoxFuture<'static, Result<Value, FetchError>> {
    match CareerQuery::from_descriptor(&descriptor) {
      Some(query) => {
        let api = self.clone();
        async move { query.run(&api).await }.boxed()
      }
      None => futures::future::ready(Err(FetchError::UnknownQuery(descriptor.to_string()))).boxed(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::BackendConfig;
  use crate::query::{QueryStatus, QueryStore, StoreOptions};
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn api(uri: String) -> ApiClient {
    ApiClient::new(&BackendConfig {
      url: uri,
      timeout_secs: 5,
    })
    .unwrap()
  }

  #[test]
  fn test_descriptor_round_trip_for_each_query() {
    let queries = [
      CareerQuery::Profile,
      CareerQuery::Careers,
      CareerQuery::Roadmap {
        career_id: "ux-designer".to_string(),
      },
      CareerQuery::Internships {
        q: "intern".to_string(),
        location: "India".to_string(),
      },
      CareerQuery::Books { q: "rust".to_string() },
      CareerQuery::Bookmarks,
    ];
    for query in queries {
      assert_eq!(CareerQuery::from_descriptor(&query.descriptor()), Some(query));
    }
    assert_eq!(CareerQuery::from_descriptor(&Descriptor::new("weather")), None);
  }

  #[test]
  fn test_search_text_is_trimmed_into_key() {
    let a = CareerQuery::Books { q: " rust ".to_string() }.descriptor();
    let b = CareerQuery::Books { q: "rust".to_string() }.descriptor();
    assert_eq!(a, b);
  }

  #[tokio::test]
  async fn test_empty_book_search_is_featured_catalog_without_network() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/books"))
      .respond_with(ResponseTemplate::new(500))
      .expect(0)
      .mount(&mock_server)
      .await;

    let data = api(mock_server.uri())
      .fetch(CareerQuery::Books { q: String::new() }.descriptor())
      .await
      .unwrap();
    assert_eq!(data.as_array().map(Vec::len), Some(12));
  }

  #[tokio::test]
  async fn test_unknown_query() {
    let err = api("http://127.0.0.1:9".to_string())
      .fetch(Descriptor::new("weather").with("today"))
      .await
      .unwrap_err();
    assert_eq!(err, FetchError::UnknownQuery(r#"weather "today""#.to_string()));
  }

  #[tokio::test]
  async fn test_two_views_share_one_internship_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/internships"))
      .and(query_param("q", "intern"))
      .and(query_param("location", "India"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [{
          "id": "j1",
          "title": "Software Intern",
          "company": "Acme",
          "location": "Pune, India",
          "posted_at": "2024-05-01"
        }]
      })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let store = QueryStore::new(api(mock_server.uri()), StoreOptions::default());
    let search = CareerQuery::Internships {
      q: "intern".to_string(),
      location: "India".to_string(),
    };

    let view_a = store.subscribe(search.descriptor());
    let mut view_b = store.subscribe(search.descriptor());
    assert!(view_a.snapshot().is_loading());
    drop(view_a);

    let snapshot = view_b.settled().await;
    assert_eq!(snapshot.status, QueryStatus::Success);
    assert_eq!(snapshot.data.unwrap()[0]["id"], "j1");

    let view_c = store.subscribe(search.descriptor());
    assert_eq!(view_c.snapshot().status, QueryStatus::Success);
    // MockServer verifies `expect(1)` on drop
  }
}
