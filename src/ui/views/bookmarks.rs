use crate::api::types::{Bookmark, BookmarkKind};
use crate::api::CareerQuery;
use crate::app::Context;
use crate::query::{Mutation, PendingMutation, Query};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{list_title, truncate};
use crate::ui::view::{ShortcutInfo, Toast, View, ViewAction};
use crate::ui::views::RoadmapView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Saved careers, internships and books
pub struct BookmarksView {
  ctx: Context,
  query: Query<Vec<Bookmark>>,
  list_state: ListState,
  removing: Option<PendingMutation<()>>,
}

impl BookmarksView {
  pub fn new(ctx: Context) -> Self {
    let query = ctx.query(&CareerQuery::Bookmarks);
    Self {
      ctx,
      query,
      list_state: ListState::default(),
      removing: None,
    }
  }

  fn bookmarks(&self) -> &[Bookmark] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected(&self) -> Option<&Bookmark> {
    self.bookmarks().get(self.list_state.selected()?)
  }

  /// Remove the selected bookmark, hiding it right away
  fn remove_selected(&mut self) -> Option<()> {
    if self.removing.as_ref().is_some_and(PendingMutation::is_pending) {
      return None;
    }
    let target = self.selected()?.clone();
    let remaining: Vec<&Bookmark> = self.bookmarks().iter().filter(|b| b.id != target.id).collect();
    let query = CareerQuery::Bookmarks;

    let mut mutation = Mutation::new(format!("remove bookmark {}", target.title))
      .invalidates(query.category_pattern());
    if let Ok(value) = serde_json::to_value(remaining) {
      mutation = mutation.optimistic(query.descriptor(), value);
    }

    let api = self.ctx.api.clone();
    self.removing = Some(
      self
        .ctx
        .store
        .spawn_mutation(mutation, async move { api.remove_bookmark(target.id).await }),
    );
    Some(())
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.bookmarks().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = list_title("Bookmarks", &self.query.state(), len, self.query.is_refreshing());

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load bookmarks. Press 'r' to retry."
      } else {
        "Nothing saved yet. Press 'b' on a career, internship or book."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .bookmarks()
      .iter()
      .map(|bookmark| {
        let color = match bookmark.kind {
          BookmarkKind::Career => Color::Green,
          BookmarkKind::Internship => Color::Cyan,
          BookmarkKind::Book => Color::Yellow,
        };
        let line = Line::from(vec![
          Span::styled(format!("{:<11}", bookmark.kind), Style::default().fg(color)),
          Span::raw(format!("{:<60}", truncate(&bookmark.title, 60))),
          Span::styled(
            bookmark.created_at.format("%Y-%m-%d").to_string(),
            Style::default().fg(Color::DarkGray),
          ),
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

impl View for BookmarksView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('d') | KeyCode::Delete => {
        self.remove_selected();
      }
      KeyCode::Enter => {
        if let Some(bookmark) = self.selected() {
          if bookmark.kind == BookmarkKind::Career {
            return ViewAction::Push(Box::new(RoadmapView::new(
              self.ctx.clone(),
              bookmark.item_id.clone(),
              bookmark.title.clone(),
            )));
          }
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Bookmarks".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();

    let Some(result) = self.removing.as_mut().and_then(PendingMutation::poll) else {
      return ViewAction::None;
    };
    self.removing = None;
    match result {
      Ok(()) => ViewAction::Toast(Toast::info("Bookmark removed")),
      Err(e) => ViewAction::Toast(Toast::error(e.to_string())),
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("d", "remove").with_priority(20),
      ShortcutInfo::new("enter", "open roadmap").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
    ]
  }
}
