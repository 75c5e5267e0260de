use super::{contains_ci, Criteria};
use crate::api::types::Internship;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternshipSort {
  /// Most recently posted first
  Newest,
  /// Highest stipend first, unstated stipends last
  Stipend,
}

impl InternshipSort {
  pub fn label(&self) -> &'static str {
    match self {
      InternshipSort::Newest => "newest",
      InternshipSort::Stipend => "stipend",
    }
  }
}

/// Page-local narrowing of an internship search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternshipFilter {
  /// Matched against title and company
  pub search: String,
  /// Substring of the listing's location
  pub location: String,
  pub remote: Option<bool>,
  pub posted_within_days: Option<i64>,
  /// Reference date for `posted_within_days`
  pub today: NaiveDate,
  pub sort: Option<InternshipSort>,
}

impl InternshipFilter {
  pub fn new(today: NaiveDate) -> Self {
    Self {
      search: String::new(),
      location: String::new(),
      remote: None,
      posted_within_days: None,
      today,
      sort: None,
    }
  }
}

impl Criteria<Internship> for InternshipFilter {
  fn matches(&self, internship: &Internship) -> bool {
    let search_ok =
      contains_ci(&internship.title, &self.search) || contains_ci(&internship.company, &self.search);
    let location_ok = contains_ci(&internship.location, &self.location);
    let remote_ok = self.remote.map_or(true, |r| internship.remote == r);
    let recent_ok = self.posted_within_days.map_or(true, |days| {
      let age = (self.today - internship.posted_at).num_days();
      (0..=days).contains(&age)
    });
    search_ok && location_ok && remote_ok && recent_ok
  }

  fn is_empty(&self) -> bool {
    self.search.trim().is_empty()
      && self.location.trim().is_empty()
      && self.remote.is_none()
      && self.posted_within_days.is_none()
      && self.sort.is_none()
  }

  fn apply<'a>(&self, items: &'a [Internship]) -> Vec<&'a Internship> {
    let mut found: Vec<&Internship> = items.iter().filter(|i| self.matches(i)).collect();
    match self.sort {
      Some(InternshipSort::Newest) => found.sort_by(|a, b| b.posted_at.cmp(&a.posted_at)),
      Some(InternshipSort::Stipend) => found.sort_by(|a, b| b.stipend.cmp(&a.stipend)),
      None => {}
    }
    found
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn internship(id: &str, location: &str, remote: bool, posted: &str, stipend: Option<u32>) -> Internship {
    Internship {
      id: id.to_string(),
      title: format!("Intern {}", id),
      company: "Acme".to_string(),
      location: location.to_string(),
      remote,
      posted_at: date(posted),
      stipend,
      url: None,
    }
  }

  fn listings() -> Vec<Internship> {
    vec![
      internship("a", "Pune, India", false, "2024-05-01", Some(15000)),
      internship("b", "Remote", true, "2024-05-20", None),
      internship("c", "Bengaluru, India", true, "2024-05-18", Some(25000)),
      internship("d", "Berlin, Germany", false, "2024-04-01", Some(25000)),
    ]
  }

  fn ids<'a>(found: &[&'a Internship]) -> Vec<&'a str> {
    found.iter().map(|i| i.id.as_str()).collect()
  }

  #[test]
  fn test_empty_filter_returns_all_in_order() {
    let items = listings();
    let filter = InternshipFilter::new(date("2024-05-21"));
    assert!(filter.is_empty());
    assert_eq!(ids(&filter.apply(&items)), vec!["a", "b", "c", "d"]);
  }

  #[test]
  fn test_location_and_remote() {
    let items = listings();
    let filter = InternshipFilter {
      location: "india".to_string(),
      remote: Some(true),
      ..InternshipFilter::new(date("2024-05-21"))
    };
    assert_eq!(ids(&filter.apply(&items)), vec!["c"]);
  }

  #[test]
  fn test_posted_within_days() {
    let items = listings();
    let filter = InternshipFilter {
      posted_within_days: Some(7),
      ..InternshipFilter::new(date("2024-05-21"))
    };
    assert_eq!(ids(&filter.apply(&items)), vec!["b", "c"]);
  }

  #[test]
  fn test_sorts_are_stable() {
    let items = listings();
    let by_stipend = InternshipFilter {
      sort: Some(InternshipSort::Stipend),
      ..InternshipFilter::new(date("2024-05-21"))
    };
    // c and d tie on stipend and keep input order
    assert_eq!(ids(&by_stipend.apply(&items)), vec!["c", "d", "a", "b"]);
    assert_eq!(by_stipend.apply(&items), by_stipend.apply(&items));

    let newest = InternshipFilter {
      sort: Some(InternshipSort::Newest),
      ..InternshipFilter::new(date("2024-05-21"))
    };
    assert_eq!(ids(&newest.apply(&items)), vec!["b", "c", "a", "d"]);
  }
}
