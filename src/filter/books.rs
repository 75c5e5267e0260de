use super::{contains_ci, Criteria, FilterSource};
use crate::api::types::Book;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
  /// Exact category, compared case-insensitively
  pub category: Option<String>,
  /// Matched against title and author
  pub search: String,
}

impl BookFilter {
  pub fn category(category: impl Into<String>) -> Self {
    Self {
      category: Some(category.into()),
      ..Default::default()
    }
  }
}

impl Criteria<Book> for BookFilter {
  fn matches(&self, book: &Book) -> bool {
    let category_ok = self
      .category
      .as_ref()
      .map_or(true, |c| book.category.eq_ignore_ascii_case(c));
    let search_ok = contains_ci(&book.title, &self.search) || contains_ci(&book.author, &self.search);
    category_ok && search_ok
  }

  fn is_empty(&self) -> bool {
    self.category.is_none() && self.search.trim().is_empty()
  }
}

/// Filter bar tabs for the book list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookField {
  #[default]
  None,
  Category,
}

impl FilterSource<Book> for BookField {
  fn label(&self) -> &'static str {
    match self {
      BookField::None => "None",
      BookField::Category => "Category",
    }
  }

  fn unique_values(&self, items: &[Book]) -> Vec<Option<String>> {
    match self {
      BookField::None => Vec::new(),
      BookField::Category => items
        .iter()
        .map(|b| b.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(Some)
        .collect(),
    }
  }

  fn filter<'a>(&self, items: &'a [Book], value: Option<&Option<String>>) -> Vec<&'a Book> {
    match (self, value) {
      (BookField::Category, Some(Some(category))) => BookFilter::category(category.clone()).apply(items),
      _ => items.iter().collect(),
    }
  }

  fn is_active(&self) -> bool {
    !matches!(self, BookField::None)
  }

  fn all_variants() -> &'static [Self] {
    &[BookField::None, BookField::Category]
  }
}
