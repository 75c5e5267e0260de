use crate::app::Context;
use crate::catalog::{Problem, PROBLEMS};
use crate::db::flags::DSA_SOLVED;
use crate::filter::{Criteria, ProblemField, ProblemFilter};
use crate::ui::components::{FilterBar, KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{difficulty_color, truncate};
use crate::ui::view::{ShortcutInfo, Toast, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::collections::BTreeSet;
use tracing::warn;

/// The DSA practice set with topic/difficulty tabs and solved marks
pub struct DsaView {
  ctx: Context,
  solved: BTreeSet<u32>,
  search: SearchInput,
  filter_bar: FilterBar<ProblemField, Problem>,
  list_state: ListState,
}

impl DsaView {
  pub fn new(ctx: Context) -> Self {
    let solved = match ctx.flags.get(DSA_SOLVED) {
      Ok(value) => parse_solved(value.as_deref().unwrap_or("")),
      Err(e) => {
        warn!(error = %e, "failed to read solved problems");
        BTreeSet::new()
      }
    };
    Self {
      ctx,
      solved,
      search: SearchInput::new(),
      filter_bar: FilterBar::new(),
      list_state: ListState::default(),
    }
  }

  fn filtered(&self) -> Vec<&'static Problem> {
    let search = ProblemFilter {
      search: self.search.query().to_string(),
      ..Default::default()
    };
    self
      .filter_bar
      .apply(PROBLEMS)
      .into_iter()
      .filter(|p| search.is_empty() || search.matches(p))
      .collect()
  }

  fn toggle_solved(&mut self) -> Option<ViewAction> {
    let idx = self.list_state.selected()?;
    let problem = self.filtered().get(idx).copied()?;
    if !self.solved.remove(&problem.id) {
      self.solved.insert(problem.id);
    }

    let value = self
      .solved
      .iter()
      .map(u32::to_string)
      .collect::<Vec<_>>()
      .join(",");
    if let Err(e) = self.ctx.flags.set(DSA_SOLVED, &value) {
      return Some(ViewAction::Toast(Toast::error(format!(
        "could not save progress: {}",
        e
      ))));
    }
    Some(ViewAction::None)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let problems = self.filtered();
    ensure_valid_selection(&mut self.list_state, problems.len());

    let title = format!(
      " DSA Practice ({} shown, {}/{} solved) ",
      problems.len(),
      self.solved.len(),
      PROBLEMS.len()
    );
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if problems.is_empty() {
      let paragraph = Paragraph::new("No problems match the current filter.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = problems
      .iter()
      .map(|problem| {
        let solved = self.solved.contains(&problem.id);
        let line = Line::from(vec![
          Span::styled(
            if solved { "✓ " } else { "  " },
            Style::default().fg(Color::Green),
          ),
          Span::styled(
            format!("{:<7}", problem.difficulty.label()),
            Style::default().fg(difficulty_color(problem.difficulty)),
          ),
          Span::raw(format!("{:<50}", truncate(problem.title, 50))),
          Span::styled(problem.topic, Style::default().fg(Color::Cyan)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

/// Comma separated ids, ignoring anything unparseable
fn parse_solved(value: &str) -> BTreeSet<u32> {
  value
    .split(',')
    .filter_map(|id| id.trim().parse().ok())
    .collect()
}

impl View for DsaView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Handled | KeyResult::Event(SearchEvent::Changed(_)) => {
        self.list_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted(_)) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    if let KeyResult::Event(_) = self.filter_bar.handle_key(key, PROBLEMS) {
      self.list_state.select(Some(0));
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char(' ') | KeyCode::Char('x') => {
        return self.toggle_solved().unwrap_or(ViewAction::None);
      }
      KeyCode::Enter => {
        let idx = self.list_state.selected();
        if let Some(problem) = idx.and_then(|i| self.filtered().get(i).copied()) {
          return ViewAction::Toast(Toast::info(problem.url));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    if self.filter_bar.is_active() {
      let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
      self.filter_bar.render(frame, chunks[0]);
      self.render_list(frame, chunks[1]);
    } else {
      self.render_list(frame, area);
    }
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "DSA Practice".to_string()
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("f", "topic/difficulty").with_priority(30),
      ShortcutInfo::new("space", "solved").with_priority(40),
      ShortcutInfo::new("enter", "link").with_priority(50),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::views::test_context;
  use crossterm::event::KeyModifiers;
  use serde_json::json;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_parse_solved() {
    assert_eq!(parse_solved("3, 1,x,,12"), BTreeSet::from([1, 3, 12]));
    assert!(parse_solved("").is_empty());
  }

  #[tokio::test]
  async fn test_solved_marks_persist() {
    let ctx = test_context(|_| json!(null));
    let mut view = DsaView::new(ctx.clone());
    view.list_state.select(Some(0));
    view.handle_key(key(KeyCode::Char(' ')));
    view.handle_key(key(KeyCode::Down));
    view.handle_key(key(KeyCode::Char(' ')));
    assert_eq!(ctx.flags.get(DSA_SOLVED).unwrap().as_deref(), Some("1,2"));

    let reopened = DsaView::new(ctx);
    assert_eq!(reopened.solved, BTreeSet::from([1, 2]));
  }

  #[tokio::test]
  async fn test_search_and_topic_tab_combine() {
    let mut view = DsaView::new(test_context(|_| json!(null)));
    view.handle_key(key(KeyCode::Char('/')));
    for c in "binary".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    view.handle_key(key(KeyCode::Enter));
    let ids: Vec<_> = view.filtered().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![10, 11, 12]);

    // Difficulty tabs: Easy, Medium, Hard
    view.handle_key(key(KeyCode::Char('f')));
    view.handle_key(key(KeyCode::Char('f')));
    view.handle_key(key(KeyCode::Char(']')));
    view.handle_key(key(KeyCode::Char(']')));
    let ids: Vec<_> = view.filtered().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![11]);
  }
}
