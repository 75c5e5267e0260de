use crate::api::types::{
  AuthSession, Book, Bookmark, CareerMatch, Internship, NewBookmark, OptimizeRequest,
  OptimizeResult, Profile, Roadmap,
};
use crate::config::BackendConfig;
use crate::error::FetchError;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Success body: `{"data": ...}`
#[derive(Deserialize)]
struct Envelope {
  data: Value,
}

/// Failure body: `{"error": "..."}`
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
  username: &'a str,
  password: &'a str,
}

/// Backend API client. Clones share the session token.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
  token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
  pub fn new(config: &BackendConfig) -> Result<Self> {
    let mut base =
      Url::parse(&config.url).map_err(|e| eyre!("Invalid backend url {}: {}", config.url, e))?;
    // Relative joins must keep any path prefix, e.g. https://host/careers/
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("careerdash/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      token: Arc::new(RwLock::new(None)),
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  pub fn is_authenticated(&self) -> bool {
    self
      .token
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some()
  }

  pub fn set_token(&self, token: Option<String>) {
    *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
  }

  pub fn logout(&self) {
    self.set_token(None);
  }

  fn url(&self, path: &str) -> Result<Url, FetchError> {
    self
      .base
      .join(path.trim_start_matches('/'))
      .map_err(|e| FetchError::Network(format!("invalid url for {}: {}", path, e)))
  }

  /// Send a request and unwrap the response envelope.
  async fn request(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, FetchError> {
    debug!(%method, %url, "request");
    let mut request = self.http.request(method, url);
    let token = self
      .token
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone();
    if let Some(token) = token {
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;

    if status == StatusCode::UNAUTHORIZED {
      return Err(FetchError::Unauthorized);
    }
    if !status.is_success() {
      let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
          status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
        });
      return Err(FetchError::Http {
        status: status.as_u16(),
        message,
      });
    }
    if bytes.is_empty() {
      return Ok(Value::Null);
    }
    let envelope: Envelope = serde_json::from_slice(&bytes)?;
    Ok(envelope.data)
  }

  async fn get_value(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
    let mut url = self.url(path)?;
    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }
    self.request(Method::GET, url, None).await
  }

  async fn send<B: Serialize, T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: &B,
  ) -> Result<T, FetchError> {
    let url = self.url(path)?;
    let body = serde_json::to_value(body)?;
    let data = self.request(method, url, Some(body)).await?;
    Ok(serde_json::from_value(data)?)
  }

  async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, FetchError> {
    let data = self.get_value(path, query).await?;
    Ok(serde_json::from_value(data)?)
  }

  // ------------------------------------------------------------------------
  // Auth
  // ------------------------------------------------------------------------

  /// Log in and keep the token for later requests.
  pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, FetchError> {
    self.authenticate("api/auth/login", username, password).await
  }

  /// Create an account and keep the token for later requests.
  pub async fn register(&self, username: &str, password: &str) -> Result<AuthSession, FetchError> {
    self.authenticate("api/auth/register", username, password).await
  }

  async fn authenticate(&self, path: &str, username: &str, password: &str) -> Result<AuthSession, FetchError> {
    let session: AuthSession = self
      .send(Method::POST, path, &Credentials { username, password })
      .await?;
    self.set_token(Some(session.token.clone()));
    info!(username = %session.username, "authenticated");
    Ok(session)
  }

  // ------------------------------------------------------------------------
  // Reads
  // ------------------------------------------------------------------------

  pub async fn profile(&self) -> Result<Profile, FetchError> {
    self.get("api/profile", &[]).await
  }

  pub async fn careers(&self) -> Result<Vec<CareerMatch>, FetchError> {
    self.get("api/careers", &[]).await
  }

  pub async fn roadmap(&self, career_id: &str) -> Result<Roadmap, FetchError> {
    let mut url = self.url("api/roadmaps")?;
    url
      .path_segments_mut()
      .map_err(|_| FetchError::Network("backend url cannot be a base".to_string()))?
      .push(career_id);
    let data = self.request(Method::GET, url, None).await?;
    Ok(serde_json::from_value(data)?)
  }

  pub async fn internships(&self, q: &str, location: &str) -> Result<Vec<Internship>, FetchError> {
    self.get("api/internships", &[("q", q), ("location", location)]).await
  }

  pub async fn books(&self, q: &str) -> Result<Vec<Book>, FetchError> {
    self.get("api/books", &[("q", q)]).await
  }

  pub async fn bookmarks(&self) -> Result<Vec<Bookmark>, FetchError> {
    self.get("api/bookmarks", &[]).await
  }

  // ------------------------------------------------------------------------
  // Writes
  // ------------------------------------------------------------------------

  pub async fn update_profile(&self, profile: &Profile) -> Result<Profile, FetchError> {
    self.send(Method::PUT, "api/profile", profile).await
  }

  pub async fn add_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark, FetchError> {
    self.send(Method::POST, "api/bookmarks", bookmark).await
  }

  pub async fn remove_bookmark(&self, id: i64) -> Result<(), FetchError> {
    let url = self.url(&format!("api/bookmarks/{}", id))?;
    self.request(Method::DELETE, url, None).await?;
    Ok(())
  }

  pub async fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResult, FetchError> {
    self.send(Method::POST, "api/optimize", request).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{BookmarkKind, OptimizeKind};
  use serde_json::json;
  use wiremock::matchers::{body_json, header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(uri: String) -> ApiClient {
    ApiClient::new(&BackendConfig {
      url: uri,
      timeout_secs: 5,
    })
    .unwrap()
  }

  #[test]
  fn test_base_url_keeps_prefix() {
    let api = client("https://example.com/careers".to_string());
    assert_eq!(
      api.url("/api/profile").unwrap().as_str(),
      "https://example.com/careers/api/profile"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(ApiClient::new(&BackendConfig {
      url: "not a url".to_string(),
      timeout_secs: 5,
    })
    .is_err());
  }

  #[tokio::test]
  async fn test_login_stores_token_for_later_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/api/auth/login"))
      .and(body_json(json!({ "username": "priya", "password": "secret1" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": { "token": "tok-123", "username": "priya" }
      })))
      .mount(&mock_server)
      .await;

    Mock::given(method("GET"))
      .and(path("/api/profile"))
      .and(header("authorization", "Bearer tok-123"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": { "username": "priya", "interests": ["Design"], "education": "PhD" }
      })))
      .mount(&mock_server)
      .await;

    let api = client(mock_server.uri());
    assert!(!api.is_authenticated());

    let session = api.login("priya", "secret1").await.unwrap();
    assert_eq!(session.token, "tok-123");
    assert!(api.clone().is_authenticated());

    let profile = api.profile().await.unwrap();
    assert_eq!(profile.interests, vec!["Design"]);
    assert!(profile.skills.is_empty());
  }

  #[tokio::test]
  async fn test_error_body_becomes_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/api/roadmaps/astronaut"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Roadmap not found" })))
      .mount(&mock_server)
      .await;

    let err = client(mock_server.uri()).roadmap("astronaut").await.unwrap_err();
    assert_eq!(
      err,
      FetchError::Http {
        status: 404,
        message: "Roadmap not found".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_error_without_body_uses_status_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/api/careers"))
      .respond_with(ResponseTemplate::new(502))
      .mount(&mock_server)
      .await;

    let err = client(mock_server.uri()).careers().await.unwrap_err();
    assert_eq!(
      err,
      FetchError::Http {
        status: 502,
        message: "Bad Gateway".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/api/bookmarks"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "missing token" })))
      .mount(&mock_server)
      .await;

    let err = client(mock_server.uri()).bookmarks().await.unwrap_err();
    assert_eq!(err, FetchError::Unauthorized);
  }

  #[tokio::test]
  async fn test_internship_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/api/internships"))
      .and(query_param("q", "data intern"))
      .and(query_param("location", "India"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [{
          "id": "j1",
          "title": "Data Intern",
          "company": "Acme",
          "location": "Pune, India",
          "posted_at": "2024-05-01",
          "stipend": 15000
        }]
      })))
      .expect(1)
      .mount(&mock_server)
      .await;

    let found = client(mock_server.uri())
      .internships("data intern", "India")
      .await
      .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].stipend, Some(15000));
  }

  #[tokio::test]
  async fn test_malformed_envelope_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/api/careers"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "careers": [] })))
      .mount(&mock_server)
      .await;

    let err = client(mock_server.uri()).careers().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
  }

  #[tokio::test]
  async fn test_bookmark_writes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/api/bookmarks"))
      .and(body_json(json!({ "kind": "book", "item_id": "OL1M", "title": "Deep Work" })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({
        "data": {
          "id": 7,
          "kind": "book",
          "item_id": "OL1M",
          "title": "Deep Work",
          "created_at": "2024-05-01T10:00:00Z"
        }
      })))
      .mount(&mock_server)
      .await;

    Mock::given(method("DELETE"))
      .and(path("/api/bookmarks/7"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&mock_server)
      .await;

    let api = client(mock_server.uri());
    let created = api
      .add_bookmark(&NewBookmark {
        kind: BookmarkKind::Book,
        item_id: "OL1M".to_string(),
        title: "Deep Work".to_string(),
      })
      .await
      .unwrap();
    assert_eq!(created.id, 7);
    api.remove_bookmark(created.id).await.unwrap();
  }

  #[tokio::test]
  async fn test_optimize() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/api/optimize"))
      .and(body_json(json!({ "kind": "linkedin", "text": "I build things" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": { "optimized": "Engineer who ships.", "suggestions": ["Add metrics"] }
      })))
      .mount(&mock_server)
      .await;

    let result = client(mock_server.uri())
      .optimize(&OptimizeRequest {
        kind: OptimizeKind::Linkedin,
        text: "I build things".to_string(),
      })
      .await
      .unwrap();
    assert_eq!(result.optimized, "Engineer who ships.");
    assert_eq!(result.suggestions, vec!["Add metrics"]);
  }
}
