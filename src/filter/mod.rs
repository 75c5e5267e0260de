//! Pure, page-local views over fetched collections.
//!
//! Every filter is deterministic and keeps the input order unless it
//! explicitly sorts (with a stable sort). Empty criteria return the whole
//! collection.

mod books;
mod careers;
mod dsa;
mod internships;
mod source;

pub use books::{BookField, BookFilter};
pub use careers::CareerFilter;
pub use dsa::{ProblemField, ProblemFilter};
pub use internships::{InternshipFilter, InternshipSort};
pub use source::FilterSource;

/// Criteria for narrowing a collection of `T`.
pub trait Criteria<T> {
  /// Whether one item passes.
  fn matches(&self, item: &T) -> bool;

  /// True when no constraint is set.
  fn is_empty(&self) -> bool;

  /// Items that pass, in input order.
  fn apply<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
    if self.is_empty() {
      return items.iter().collect();
    }
    items.iter().filter(|item| self.matches(item)).collect()
  }
}

/// Case-insensitive substring test. An empty needle matches everything.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
  let needle = needle.trim();
  needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_contains_ci() {
    assert!(contains_ci("The Design of Everyday Things", "design"));
    assert!(contains_ci("anything", ""));
    assert!(contains_ci("anything", "   "));
    assert!(!contains_ci("Clean Code", "design"));
  }
}
