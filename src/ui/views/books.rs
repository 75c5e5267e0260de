use crate::api::types::{Book, Bookmark, NewBookmark};
use crate::api::CareerQuery;
use crate::app::Context;
use crate::filter::{BookField, BookFilter, Criteria};
use crate::query::{PendingMutation, Query};
use crate::ui::components::{FilterBar, KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{list_title, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{poll_bookmark, spawn_bookmark};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Featured books, or the results of a book search.
///
/// Typing in the `/` overlay narrows the shown books locally; Enter sends
/// the text to the book search instead. An empty search goes back to the
/// featured catalog.
pub struct BooksView {
  ctx: Context,
  /// Server-side search text, "" for the featured catalog
  q: String,
  query: Query<Vec<Book>>,
  local: BookFilter,
  filter_bar: FilterBar<BookField, Book>,
  list_state: ListState,
  search: SearchInput,
  bookmark: Option<PendingMutation<Bookmark>>,
}

impl BooksView {
  pub fn new(ctx: Context) -> Self {
    let query = ctx.query(&CareerQuery::Books { q: String::new() });
    let mut view = Self {
      ctx,
      q: String::new(),
      query,
      local: BookFilter::default(),
      filter_bar: FilterBar::new(),
      list_state: ListState::default(),
      search: SearchInput::with_title(" Search books (Enter searches online) "),
      bookmark: None,
    };
    // Cached books may already be in
    view.sync_filter_bar();
    view
  }

  fn books(&self) -> &[Book] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Books after the category tab and the local search text
  fn filtered(&self) -> Vec<&Book> {
    self
      .filter_bar
      .apply(self.books())
      .into_iter()
      .filter(|book| self.local.is_empty() || self.local.matches(book))
      .collect()
  }

  fn selected(&self) -> Option<&Book> {
    let idx = self.list_state.selected()?;
    self.filtered().get(idx).copied()
  }

  fn sync_filter_bar(&mut self) {
    let books = self.query.data().map(|v| v.as_slice()).unwrap_or(&[]);
    self.filter_bar.update_values(books);
  }

  fn run_search(&mut self, q: &str) {
    let q = q.trim().to_string();
    self.local.search.clear();
    self.search.clear();
    if q == self.q {
      return;
    }
    self.query = self.ctx.query(&CareerQuery::Books { q: q.clone() });
    self.q = q;
    self.list_state.select(Some(0));
    self.sync_filter_bar();
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.filtered().len();
    ensure_valid_selection(&mut self.list_state, len);

    let label = if self.q.is_empty() {
      "Featured books".to_string()
    } else {
      format!("Books: \"{}\"", self.q)
    };
    let title = list_title(&label, &self.query.state(), len, self.query.is_refreshing());

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Book search failed. Press 'r' to retry."
      } else {
        "No books found."
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
      .map(|book| {
        let year = book.year.map(|y| y.to_string()).unwrap_or_default();
        let line = Line::from(vec![
          Span::raw(format!("{:<40}", truncate(&book.title, 40))),
          Span::styled(
            format!("{:<24}", truncate(&book.author, 24)),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            format!("{:<14}", truncate(&book.category, 14)),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(year, Style::default().fg(Color::DarkGray)),
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
    match self.search.handle_key(key) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.local.search = text;
        self.list_state.select(Some(0));
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Submitted(text)) => {
        self.run_search(&text);
        Some(ViewAction::None)
      }
      KeyResult::NotHandled => None,
    }
  }

  fn handle_filter_bar(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let books = self.query.data().map(|v| v.as_slice()).unwrap_or(&[]);
    match self.filter_bar.handle_key(key, books) {
      KeyResult::Event(_) | KeyResult::Handled => {
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
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('c') => self.run_search(""),
      KeyCode::Char('b') | KeyCode::Enter => {
        let new = NewBookmark::book(self.selected()?);
        self.bookmark = Some(spawn_bookmark(&self.ctx, new));
      }
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      _ => return None,
    }
    Some(ViewAction::None)
  }
}

impl View for BooksView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_filter_bar(key))
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
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
    "Books".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if self.query.poll() {
      self.sync_filter_bar();
    }
    poll_bookmark(&mut self.bookmark)
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("f", "category tabs").with_priority(30),
      ShortcutInfo::new("c", "featured").with_priority(40),
      ShortcutInfo::new("b", "bookmark").with_priority(50),
    ]
  }
}
