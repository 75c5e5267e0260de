//! Payloads exchanged with the backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token issued by `/api/auth/login` and `/api/auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
  pub token: String,
  pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub username: String,
  #[serde(default)]
  pub interests: Vec<String>,
  #[serde(default)]
  pub skills: Vec<String>,
  #[serde(default)]
  pub education: String,
  #[serde(default)]
  pub target_role: Option<String>,
}

/// A recommended career with how well it fits the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerMatch {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  /// 0-100
  pub match_score: u8,
  #[serde(default)]
  pub skills: Vec<String>,
  #[serde(default)]
  pub salary_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roadmap {
  pub career_id: String,
  pub title: String,
  #[serde(default)]
  pub steps: Vec<RoadmapStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapStep {
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub duration_weeks: Option<u32>,
  #[serde(default)]
  pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Internship {
  pub id: String,
  pub title: String,
  pub company: String,
  pub location: String,
  #[serde(default)]
  pub remote: bool,
  pub posted_at: NaiveDate,
  /// Monthly stipend, when the listing states one
  #[serde(default)]
  pub stipend: Option<u32>,
  #[serde(default)]
  pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
  pub id: String,
  pub title: String,
  pub author: String,
  pub category: String,
  #[serde(default)]
  pub year: Option<u32>,
  #[serde(default)]
  pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkKind {
  Career,
  Internship,
  Book,
}

impl fmt::Display for BookmarkKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      BookmarkKind::Career => "career",
      BookmarkKind::Internship => "internship",
      BookmarkKind::Book => "book",
    };
    write!(f, "{}", label)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
  pub id: i64,
  pub kind: BookmarkKind,
  pub item_id: String,
  pub title: String,
  pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/bookmarks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
  pub kind: BookmarkKind,
  pub item_id: String,
  pub title: String,
}

impl NewBookmark {
  pub fn book(book: &Book) -> Self {
    Self {
      kind: BookmarkKind::Book,
      item_id: book.id.clone(),
      title: format!("{} ({})", book.title, book.author),
    }
  }

  pub fn internship(internship: &Internship) -> Self {
    Self {
      kind: BookmarkKind::Internship,
      item_id: internship.id.clone(),
      title: format!("{} at {}", internship.title, internship.company),
    }
  }

  pub fn career(career: &CareerMatch) -> Self {
    Self {
      kind: BookmarkKind::Career,
      item_id: career.id.clone(),
      title: career.title.clone(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeKind {
  #[default]
  Resume,
  Linkedin,
}

impl OptimizeKind {
  pub fn label(&self) -> &'static str {
    match self {
      OptimizeKind::Resume => "Resume",
      OptimizeKind::Linkedin => "LinkedIn",
    }
  }

  pub fn toggle(self) -> Self {
    match self {
      OptimizeKind::Resume => OptimizeKind::Linkedin,
      OptimizeKind::Linkedin => OptimizeKind::Resume,
    }
  }
}

/// Body of `POST /api/optimize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeRequest {
  pub kind: OptimizeKind,
  pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeResult {
  pub optimized: String,
  #[serde(default)]
  pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_internship_optional_fields_default() {
    let internship: Internship = serde_json::from_value(json!({
      "id": "42",
      "title": "Data Intern",
      "company": "Acme",
      "location": "Bengaluru, India",
      "posted_at": "2024-05-01"
    }))
    .unwrap();
    assert!(!internship.remote);
    assert_eq!(internship.stipend, None);
    assert_eq!(internship.posted_at, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
  }

  #[test]
  fn test_kinds_serialize_lowercase() {
    assert_eq!(serde_json::to_value(OptimizeKind::Linkedin).unwrap(), json!("linkedin"));
    assert_eq!(serde_json::to_value(BookmarkKind::Book).unwrap(), json!("book"));
  }
}
