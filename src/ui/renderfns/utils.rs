use crate::catalog::Difficulty;
use crate::query::QueryState;
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Color for a career match score
pub fn score_color(score: u8) -> Color {
  match score {
    80.. => Color::Green,
    60..=79 => Color::Yellow,
    _ => Color::White,
  }
}

pub fn difficulty_color(difficulty: Difficulty) -> Color {
  match difficulty {
    Difficulty::Easy => Color::Green,
    Difficulty::Medium => Color::Yellow,
    Difficulty::Hard => Color::Red,
  }
}

/// Block title for a list backed by a query: " Books (12) ",
/// " Books (loading...) ", " Books (error: ...) ".
pub fn list_title<T>(label: &str, state: &QueryState<T>, shown: usize, refreshing: bool) -> String {
  match state {
    QueryState::Idle | QueryState::Loading => format!(" {} (loading...) ", label),
    QueryState::Error(e) => format!(" {} (error: {}) ", label, e.short()),
    QueryState::Success(_) if refreshing => format!(" {} ({}, refreshing...) ", label, shown),
    QueryState::Success(_) => format!(" {} ({}) ", label, shown),
  }
}
