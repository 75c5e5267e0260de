use crate::api::types::{Bookmark, Internship, NewBookmark};
use crate::api::CareerQuery;
use crate::app::Context;
use crate::filter::{Criteria, InternshipFilter, InternshipSort};
use crate::query::{PendingMutation, Query};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{list_title, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{poll_bookmark, spawn_bookmark};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tracing::debug;

const DEFAULT_QUERY: &str = "intern";
const DEFAULT_LOCATION: &str = "India";

/// Internship listings from the job-search backend.
///
/// `f` runs a new server search ("role @ location"); `/` and the toggles
/// narrow the fetched listings locally.
pub struct InternshipsView {
  ctx: Context,
  q: String,
  location: String,
  query: Query<Vec<Internship>>,
  filter: InternshipFilter,
  list_state: ListState,
  search: SearchInput,
  find: SearchInput,
  bookmark: Option<PendingMutation<Bookmark>>,
}

impl InternshipsView {
  pub fn new(ctx: Context) -> Self {
    Self::with_search(ctx, DEFAULT_QUERY, DEFAULT_LOCATION)
  }

  pub fn with_search(ctx: Context, q: &str, location: &str) -> Self {
    let query = ctx.query(&search_query(q, location));
    Self {
      ctx,
      q: q.to_string(),
      location: location.to_string(),
      query,
      filter: InternshipFilter::new(Local::now().date_naive()),
      list_state: ListState::default(),
      search: SearchInput::new(),
      find: SearchInput::with_title(" Find internships: role @ location "),
      bookmark: None,
    }
  }

  /// Switch to another server search. The old subscription is released.
  fn run_search(&mut self, input: &str) {
    let (q, location) = match input.split_once('@') {
      Some((q, location)) => (q.trim(), location.trim()),
      None => (input.trim(), self.location.as_str()),
    };
    let q = if q.is_empty() { DEFAULT_QUERY } else { q };
    let (q, location) = (q.to_string(), location.to_string());
    debug!(%q, %location, "internship search");

    self.query = self.ctx.query(&search_query(&q, &location));
    self.q = q;
    self.location = location;
    self.list_state.select(Some(0));
  }

  fn listings(&self) -> &[Internship] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn filtered(&self) -> Vec<&Internship> {
    self.filter.apply(self.listings())
  }

  fn selected(&self) -> Option<&Internship> {
    let idx = self.list_state.selected()?;
    self.filtered().get(idx).copied()
  }

  fn cycle_remote(&mut self) {
    self.filter.remote = match self.filter.remote {
      None => Some(true),
      Some(true) => Some(false),
      Some(false) => None,
    };
  }

  fn cycle_recency(&mut self) {
    self.filter.posted_within_days = match self.filter.posted_within_days {
      None => Some(7),
      Some(7) => Some(30),
      Some(_) => None,
    };
  }

  fn cycle_sort(&mut self) {
    self.filter.sort = match self.filter.sort {
      None => Some(InternshipSort::Newest),
      Some(InternshipSort::Newest) => Some(InternshipSort::Stipend),
      Some(InternshipSort::Stipend) => None,
    };
  }

  fn filter_summary(&self) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let on = Style::default().fg(Color::Yellow);
    let remote = match self.filter.remote {
      None => "any",
      Some(true) => "remote",
      Some(false) => "on-site",
    };
    let recency = match self.filter.posted_within_days {
      None => "any time".to_string(),
      Some(days) => format!("last {} days", days),
    };
    let sort = self.filter.sort.map(|s| s.label()).unwrap_or("relevance");
    Line::from(vec![
      Span::styled(" search ", dim),
      Span::styled(format!("\"{}\" @ {}", self.q, self.location), on),
      Span::styled("  [m] ", dim),
      Span::raw(remote),
      Span::styled("  [d] ", dim),
      Span::raw(recency),
      Span::styled("  [s] ", dim),
      Span::raw(sort),
    ])
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.filtered().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = list_title("Internships", &self.query.state(), len, self.query.is_refreshing());

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load internships. Press 'r' to retry."
      } else if self.listings().is_empty() {
        "No internships found. Press 'f' to search for something else."
      } else {
        "No internships match the current filters."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .filtered()
      .iter()
      .map(|internship| {
        let stipend = internship
          .stipend
          .map(|s| format!("₹{}/mo", s))
          .unwrap_or_else(|| "-".to_string());
        let line = Line::from(vec![
          Span::styled(
            format!("{} ", internship.posted_at.format("%d %b")),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(format!("{:<34}", truncate(&internship.title, 34))),
          Span::styled(
            format!("{:<20}", truncate(&internship.company, 20)),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            format!("{:<20}", truncate(&internship.location, 20)),
            Style::default().fg(if internship.remote {
              Color::Green
            } else {
              Color::White
            }),
          ),
          Span::styled(stipend, Style::default().fg(Color::Yellow)),
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

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    if self.find.is_active() {
      if let KeyResult::Event(SearchEvent::Submitted(input)) = self.find.handle_key(key) {
        self.run_search(&input);
      }
      return Some(ViewAction::None);
    }

    match self.search.handle_key(key) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(text) | SearchEvent::Submitted(text)) => {
        self.filter.search = text;
        self.list_state.select(Some(0));
        Some(ViewAction::None)
      }
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('f') => self.find.activate(),
      KeyCode::Char('m') => self.cycle_remote(),
      KeyCode::Char('d') => self.cycle_recency(),
      KeyCode::Char('s') => self.cycle_sort(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('b') => {
        let new = NewBookmark::internship(self.selected()?);
        self.bookmark = Some(spawn_bookmark(&self.ctx, new));
      }
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      _ => return None,
    }
    Some(ViewAction::None)
  }
}

fn search_query(q: &str, location: &str) -> CareerQuery {
  CareerQuery::Internships {
    q: q.to_string(),
    location: location.to_string(),
  }
}

impl View for InternshipsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(area);

    frame.render_widget(Paragraph::new(self.filter_summary()), chunks[0]);
    self.render_list(frame, chunks[1]);
    self.search.render_overlay(frame, chunks[1]);
    self.find.render_overlay(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Internships".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();
    poll_bookmark(&mut self.bookmark)
  }

  fn captures_input(&self) -> bool {
    self.search.is_active() || self.find.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("f", "find").with_priority(20),
      ShortcutInfo::new("/", "filter").with_priority(30),
      ShortcutInfo::new("m/d/s", "remote/recent/sort").with_priority(40),
      ShortcutInfo::new("b", "bookmark").with_priority(50),
      ShortcutInfo::new("r", "refresh").with_priority(60),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::Descriptor;
  use crate::ui::views::test_context;
  use crossterm::event::KeyModifiers;
  use serde_json::{json, Value};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn respond(d: &Descriptor) -> Value {
    json!([{
      "id": d.map_str(0, "q"),
      "title": "Data Intern",
      "company": "Acme",
      "location": d.map_str(0, "location"),
      "remote": false,
      "posted_at": "2024-05-01"
    }])
  }

  #[tokio::test]
  async fn test_default_search_is_intern_in_india() {
    let view = InternshipsView::new(test_context(respond));
    assert_eq!(
      view.query.descriptor(),
      &search_query("intern", "India").descriptor()
    );
  }

  #[tokio::test]
  async fn test_find_resubscribes_and_releases_old_search() {
    let ctx = test_context(respond);
    let mut view = InternshipsView::new(ctx.clone());
    let old = search_query("intern", "India").descriptor();
    assert_eq!(ctx.store.subscriber_count(&old), 1);

    view.handle_key(key(KeyCode::Char('f')));
    assert!(view.captures_input());
    for c in "rust @ Pune".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    view.handle_key(key(KeyCode::Enter));

    assert!(!view.captures_input());
    assert_eq!(view.q, "rust");
    assert_eq!(view.location, "Pune");
    assert_eq!(ctx.store.subscriber_count(&old), 0);
    assert_eq!(ctx.store.subscriber_count(&search_query("rust", "Pune").descriptor()), 1);
  }

  #[tokio::test]
  async fn test_find_without_location_keeps_location() {
    let mut view = InternshipsView::new(test_context(respond));
    view.run_search("  design ");
    assert_eq!(view.q, "design");
    assert_eq!(view.location, "India");

    view.run_search("@ Remote");
    assert_eq!(view.q, "intern");
    assert_eq!(view.location, "Remote");
  }

  #[tokio::test]
  async fn test_toggles_cycle() {
    let mut view = InternshipsView::new(test_context(respond));
    view.handle_key(key(KeyCode::Char('m')));
    assert_eq!(view.filter.remote, Some(true));
    view.handle_key(key(KeyCode::Char('d')));
    view.handle_key(key(KeyCode::Char('d')));
    assert_eq!(view.filter.posted_within_days, Some(30));
    view.handle_key(key(KeyCode::Char('s')));
    assert_eq!(view.filter.sort, Some(InternshipSort::Newest));
  }
}
