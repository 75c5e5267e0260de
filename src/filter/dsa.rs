use super::{contains_ci, Criteria, FilterSource};
use crate::catalog::{Difficulty, Problem};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemFilter {
  pub difficulty: Option<Difficulty>,
  pub topic: Option<String>,
  pub search: String,
}

impl Criteria<Problem> for ProblemFilter {
  fn matches(&self, problem: &Problem) -> bool {
    self.difficulty.map_or(true, |d| problem.difficulty == d)
      && self
        .topic
        .as_ref()
        .map_or(true, |t| problem.topic.eq_ignore_ascii_case(t))
      && contains_ci(problem.title, &self.search)
  }

  fn is_empty(&self) -> bool {
    self.difficulty.is_none() && self.topic.is_none() && self.search.trim().is_empty()
  }
}

/// Filter bar tabs for the practice list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProblemField {
  #[default]
  None,
  Topic,
  Difficulty,
}

impl ProblemField {
  /// The criteria a selected tab stands for.
  pub fn criteria(&self, value: Option<&Option<String>>) -> ProblemFilter {
    let value = value.and_then(|v| v.clone());
    match self {
      ProblemField::None => ProblemFilter::default(),
      ProblemField::Topic => ProblemFilter {
        topic: value,
        ..Default::default()
      },
      ProblemField::Difficulty => ProblemFilter {
        difficulty: value.as_deref().and_then(Difficulty::parse),
        ..Default::default()
      },
    }
  }
}

impl FilterSource<Problem> for ProblemField {
  fn label(&self) -> &'static str {
    match self {
      ProblemField::None => "None",
      ProblemField::Topic => "Topic",
      ProblemField::Difficulty => "Difficulty",
    }
  }

  fn unique_values(&self, items: &[Problem]) -> Vec<Option<String>> {
    match self {
      ProblemField::None => Vec::new(),
      // Topics in the order they first appear
      ProblemField::Topic => {
        let mut seen = BTreeSet::new();
        items
          .iter()
          .filter(|p| seen.insert(p.topic))
          .map(|p| Some(p.topic.to_string()))
          .collect()
      }
      ProblemField::Difficulty => items
        .iter()
        .map(|p| p.difficulty)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|d| Some(d.label().to_string()))
        .collect(),
    }
  }

  fn filter<'a>(&self, items: &'a [Problem], value: Option<&Option<String>>) -> Vec<&'a Problem> {
    self.criteria(value).apply(items)
  }

  fn is_active(&self) -> bool {
    !matches!(self, ProblemField::None)
  }

  fn all_variants() -> &'static [Self] {
    &[ProblemField::None, ProblemField::Topic, ProblemField::Difficulty]
  }
}
