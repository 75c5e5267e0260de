//! Static content shipped with the app: featured books, the DSA practice
//! set and the option lists of the career analysis form.

use crate::api::types::Book;
use serde::{Deserialize, Serialize};
use std::fmt;

/// (id, title, author, category, year)
const FEATURED_BOOKS: &[(&str, &str, &str, &str, u32)] = &[
  ("OL26222911M", "Clean Code", "Robert C. Martin", "Programming", 2008),
  ("OL24274306M", "The Pragmatic Programmer", "Andrew Hunt, David Thomas", "Programming", 1999),
  ("OL24387862M", "Introduction to Algorithms", "Thomas H. Cormen", "Programming", 1990),
  ("OL7601829M", "The Design of Everyday Things", "Don Norman", "Design", 1988),
  ("OL24943975M", "The Lean Startup", "Eric Ries", "Business", 2011),
  ("OL26334343M", "Zero to One", "Peter Thiel", "Business", 2014),
  ("OL27018420M", "Atomic Habits", "James Clear", "Self-Help", 2018),
  ("OL25905151M", "Deep Work", "Cal Newport", "Self-Help", 2016),
  ("OL2053297M", "A Brief History of Time", "Stephen Hawking", "Science", 1988),
  ("OL26336239M", "Sapiens", "Yuval Noah Harari", "Science", 2011),
  ("OL28239119M", "What Color Is Your Parachute?", "Richard N. Bolles", "Career", 1970),
  ("OL25426271M", "So Good They Can't Ignore You", "Cal Newport", "Career", 2012),
];

/// Books shown when the search box is empty.
pub fn featured_books() -> Vec<Book> {
  FEATURED_BOOKS
    .iter()
    .map(|(id, title, author, category, year)| Book {
      id: id.to_string(),
      title: title.to_string(),
      author: author.to_string(),
      category: category.to_string(),
      year: Some(*year),
      url: Some(format!("https://openlibrary.org/books/{}", id)),
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  pub fn label(&self) -> &'static str {
    match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL
      .into_iter()
      .find(|d| d.label().eq_ignore_ascii_case(s))
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.label())
  }
}

/// One DSA practice problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
  pub id: u32,
  pub title: &'static str,
  pub topic: &'static str,
  pub difficulty: Difficulty,
  pub url: &'static str,
}

macro_rules! problem {
  ($id:expr, $title:expr, $topic:expr, $difficulty:ident, $slug:expr) => {
    Problem {
      id: $id,
      title: $title,
      topic: $topic,
      difficulty: Difficulty::$difficulty,
      url: concat!("https://leetcode.com/problems/", $slug, "/"),
    }
  };
}

pub const PROBLEMS: &[Problem] = &[
  problem!(1, "Two Sum", "Arrays", Easy, "two-sum"),
  problem!(2, "Best Time to Buy and Sell Stock", "Arrays", Easy, "best-time-to-buy-and-sell-stock"),
  problem!(3, "Product of Array Except Self", "Arrays", Medium, "product-of-array-except-self"),
  problem!(4, "Trapping Rain Water", "Arrays", Hard, "trapping-rain-water"),
  problem!(5, "Valid Anagram", "Strings", Easy, "valid-anagram"),
  problem!(6, "Longest Substring Without Repeating Characters", "Strings", Medium, "longest-substring-without-repeating-characters"),
  problem!(7, "Minimum Window Substring", "Strings", Hard, "minimum-window-substring"),
  problem!(8, "Reverse Linked List", "Linked Lists", Easy, "reverse-linked-list"),
  problem!(9, "Merge k Sorted Lists", "Linked Lists", Hard, "merge-k-sorted-lists"),
  problem!(10, "Maximum Depth of Binary Tree", "Trees", Easy, "maximum-depth-of-binary-tree"),
  problem!(11, "Validate Binary Search Tree", "Trees", Medium, "validate-binary-search-tree"),
  problem!(12, "Binary Tree Maximum Path Sum", "Trees", Hard, "binary-tree-maximum-path-sum"),
  problem!(13, "Number of Islands", "Graphs", Medium, "number-of-islands"),
  problem!(14, "Course Schedule", "Graphs", Medium, "course-schedule"),
  problem!(15, "Climbing Stairs", "Dynamic Programming", Easy, "climbing-stairs"),
  problem!(16, "Coin Change", "Dynamic Programming", Medium, "coin-change"),
  problem!(17, "Edit Distance", "Dynamic Programming", Hard, "edit-distance"),
];

pub const EDUCATION_OPTIONS: &[&str] = &[
  "High School",
  "Diploma",
  "Bachelor's Degree",
  "Master's Degree",
  "PhD",
  "Self-taught",
];

pub const INTEREST_AREAS: &[&str] = &[
  "Software Development",
  "Data Science",
  "Design",
  "Business",
  "Marketing",
  "Finance",
  "Healthcare",
  "Research",
  "Writing",
  "Teaching",
];
