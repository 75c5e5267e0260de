use super::{contains_ci, Criteria};
use crate::api::types::CareerMatch;

/// Narrow career recommendations on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CareerFilter {
  /// Matched against title, description and skill names
  pub search: String,
  /// Minimum match score, 0 disables
  pub min_match: u8,
}

impl Criteria<CareerMatch> for CareerFilter {
  fn matches(&self, career: &CareerMatch) -> bool {
    let search_ok = contains_ci(&career.title, &self.search)
      || contains_ci(&career.description, &self.search)
      || career.skills.iter().any(|s| contains_ci(s, &self.search));
    search_ok && career.match_score >= self.min_match
  }

  fn is_empty(&self) -> bool {
    self.search.trim().is_empty() && self.min_match == 0
  }
}
