use super::KeyResult;
use crate::filter::FilterSource;
use crate::ui::renderfns::truncate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::marker::PhantomData;

/// Events emitted by filter bar that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterBarEvent {
  /// A different field or tab was selected
  SelectionChanged,
}

/// Tab strip over the distinct values of one field.
///
/// `f` cycles the field (`F::all_variants()`), `[` and `]` (or PageUp and
/// PageDown) move between tabs. Tab 0 is "All".
#[derive(Debug, Clone)]
pub struct FilterBar<F, T>
where
  F: FilterSource<T>,
{
  field: F,
  values: Vec<Option<String>>, // None = no value
  selected: usize,             // 0 = All, 1+ = index into values
  _phantom: PhantomData<fn(&T)>,
}

impl<F, T> Default for FilterBar<F, T>
where
  F: FilterSource<T>,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<F, T> FilterBar<F, T>
where
  F: FilterSource<T>,
{
  pub fn new() -> Self {
    Self {
      field: F::default(),
      values: Vec::new(),
      selected: 0,
      _phantom: PhantomData,
    }
  }

  /// Check if filter bar is currently shown
  pub fn is_active(&self) -> bool {
    self.field.is_active() && !self.values.is_empty()
  }

  pub fn field(&self) -> F {
    self.field.clone()
  }

  /// The selected tab's value, `None` for "All" or when inactive
  pub fn selected_value(&self) -> Option<&Option<String>> {
    if !self.is_active() || self.selected == 0 {
      None
    } else {
      self.values.get(self.selected - 1)
    }
  }

  /// Apply the current selection to `items`.
  pub fn apply<'a>(&self, items: &'a [T]) -> Vec<&'a T> {
    self.field.filter(items, self.selected_value())
  }

  /// Switch field, recomputing tabs from `items` and selecting "All"
  pub fn set_field(&mut self, field: F, items: &[T]) {
    self.values = field.unique_values(items);
    self.field = field;
    self.selected = 0;
  }

  /// Recompute tabs after the items changed, keeping the selected value
  /// when it still exists
  pub fn update_values(&mut self, items: &[T]) {
    let current = self.selected_value().cloned();
    self.values = self.field.unique_values(items);
    self.selected = current
      .and_then(|v| self.values.iter().position(|x| *x == v))
      .map(|i| i + 1)
      .unwrap_or(0);
  }

  /// Handle a key event. `items` is the unfiltered list.
  pub fn handle_key(&mut self, key: KeyEvent, items: &[T]) -> KeyResult<FilterBarEvent> {
    match key.code {
      KeyCode::Char('f') => {
        self.set_field(self.field.next(), items);
        KeyResult::Event(FilterBarEvent::SelectionChanged)
      }
      KeyCode::PageUp | KeyCode::Char('[') if self.is_active() => {
        self.navigate(-1);
        KeyResult::Event(FilterBarEvent::SelectionChanged)
      }
      KeyCode::PageDown | KeyCode::Char(']') if self.is_active() => {
        self.navigate(1);
        KeyResult::Event(FilterBarEvent::SelectionChanged)
      }
      _ => KeyResult::NotHandled,
    }
  }

  /// Navigate filter tabs with wrapping
  fn navigate(&mut self, direction: i32) {
    // Total tabs = "All" + values
    let total_tabs = self.values.len() + 1;

    self.selected = if direction > 0 {
      (self.selected + 1) % total_tabs
    } else {
      (self.selected + total_tabs - 1) % total_tabs
    };
  }

  /// Render the tab strip
  pub fn render(&self, frame: &mut Frame, area: Rect) {
    if !self.is_active() {
      return;
    }

    let tab_style = |selected: bool| {
      if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Gray)
      }
    };

    let mut spans = vec![
      Span::styled(
        format!("[{}] ", self.field.label()),
        Style::default().fg(Color::Yellow),
      ),
      Span::styled(" All ", tab_style(self.selected == 0)),
    ];

    for (idx, value) in self.values.iter().enumerate() {
      spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
      let label = match value {
        Some(v) => format!(" {} ", truncate(v, 20)),
        None => " (none) ".to_string(),
      };
      spans.push(Span::styled(label, tab_style(self.selected == idx + 1)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{Problem, PROBLEMS};
  use crate::filter::ProblemField;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_inactive_until_field_chosen() {
    let mut bar: FilterBar<ProblemField, Problem> = FilterBar::new();
    assert!(!bar.is_active());
    assert_eq!(bar.handle_key(key(KeyCode::Char(']')), PROBLEMS), KeyResult::NotHandled);
    assert_eq!(bar.apply(PROBLEMS).len(), PROBLEMS.len());
  }

  #[test]
  fn test_cycle_field_and_tabs() {
    let mut bar: FilterBar<ProblemField, Problem> = FilterBar::new();
    bar.handle_key(key(KeyCode::Char('f')), PROBLEMS);
    assert_eq!(bar.field(), ProblemField::Topic);
    assert_eq!(bar.selected_value(), None);

    bar.handle_key(key(KeyCode::Char(']')), PROBLEMS);
    assert_eq!(bar.selected_value(), Some(&Some("Arrays".to_string())));
    assert!(bar.apply(PROBLEMS).iter().all(|p| p.topic == "Arrays"));

    // Wraps back to the last tab from "All"
    bar.handle_key(key(KeyCode::Char('[')), PROBLEMS);
    bar.handle_key(key(KeyCode::Char('[')), PROBLEMS);
    assert_eq!(bar.selected_value(), Some(&Some("Dynamic Programming".to_string())));
  }

  #[test]
  fn test_update_values_keeps_selection() {
    let mut bar: FilterBar<ProblemField, Problem> = FilterBar::new();
    bar.set_field(ProblemField::Topic, PROBLEMS);
    bar.handle_key(key(KeyCode::Char(']')), PROBLEMS);
    bar.handle_key(key(KeyCode::Char(']')), PROBLEMS);
    assert_eq!(bar.selected_value(), Some(&Some("Strings".to_string())));

    let without_arrays: Vec<Problem> = PROBLEMS.iter().filter(|p| p.topic != "Arrays").cloned().collect();
    bar.update_values(&without_arrays);
    assert_eq!(bar.selected_value(), Some(&Some("Strings".to_string())));
  }
}
