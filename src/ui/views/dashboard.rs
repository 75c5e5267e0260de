use crate::api::types::{Bookmark, CareerMatch, NewBookmark, Profile};
use crate::api::CareerQuery;
use crate::app::Context;
use crate::filter::{CareerFilter, Criteria};
use crate::query::{PendingMutation, Query};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{list_title, score_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{poll_bookmark, spawn_bookmark, AnalysisView, RoadmapView};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Minimum match thresholds cycled with `m`
const MIN_MATCH_STEPS: [u8; 4] = [0, 50, 70, 90];

/// Profile summary and recommended careers
pub struct DashboardView {
  ctx: Context,
  profile: Query<Profile>,
  careers: Query<Vec<CareerMatch>>,
  filter: CareerFilter,
  list_state: ListState,
  search: SearchInput,
  bookmark: Option<PendingMutation<Bookmark>>,
}

impl DashboardView {
  pub fn new(ctx: Context) -> Self {
    let profile = ctx.query(&CareerQuery::Profile);
    let careers = ctx.query(&CareerQuery::Careers);
    Self {
      ctx,
      profile,
      careers,
      filter: CareerFilter::default(),
      list_state: ListState::default(),
      search: SearchInput::new(),
      bookmark: None,
    }
  }

  fn all_careers(&self) -> &[CareerMatch] {
    self.careers.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn filtered(&self) -> Vec<&CareerMatch> {
    self.filter.apply(self.all_careers())
  }

  fn selected(&self) -> Option<&CareerMatch> {
    let idx = self.list_state.selected()?;
    self.filtered().get(idx).copied()
  }

  fn cycle_min_match(&mut self) {
    let idx = MIN_MATCH_STEPS
      .iter()
      .position(|m| *m == self.filter.min_match)
      .unwrap_or(0);
    self.filter.min_match = MIN_MATCH_STEPS[(idx + 1) % MIN_MATCH_STEPS.len()];
    self.list_state.select(Some(0));
  }

  fn render_profile(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Profile ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines = match self.profile.data() {
      Some(profile) => vec![
        Line::from(vec![
          Span::styled("Interests  ", Style::default().fg(Color::Yellow)),
          Span::raw(profile.interests.join(", ")),
        ]),
        Line::from(vec![
          Span::styled("Skills     ", Style::default().fg(Color::Yellow)),
          Span::raw(truncate(&profile.skills.join(", "), 80)),
        ]),
        Line::from(vec![
          Span::styled("Education  ", Style::default().fg(Color::Yellow)),
          Span::raw(profile.education.clone()),
          Span::styled("   Target  ", Style::default().fg(Color::Yellow)),
          Span::raw(profile.target_role.clone().unwrap_or_else(|| "-".to_string())),
        ]),
      ],
      None if self.profile.is_error() => vec![Line::styled(
        format!(
          "Failed to load profile: {}",
          self.profile.error().map(|e| e.short()).unwrap_or_default()
        ),
        Style::default().fg(Color::Red),
      )],
      None => vec![Line::styled("Loading...", Style::default().fg(Color::DarkGray))],
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.filtered().len();
    ensure_valid_selection(&mut self.list_state, len);

    let mut title = list_title(
      "Career matches",
      &self.careers.state(),
      len,
      self.careers.is_refreshing(),
    );
    if self.filter.min_match > 0 {
      title = format!("{}[>= {}%] ", title, self.filter.min_match);
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.careers.is_loading() {
      let content = if self.careers.is_error() {
        "Failed to load career matches. Press 'r' to retry."
      } else if self.all_careers().is_empty() {
        "No matches yet. Press 'e' to complete your profile."
      } else {
        "No careers match the current filter."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    // Collect items first to avoid borrow conflicts with list_state
    let items: Vec<ListItem> = self
      .filtered()
      .iter()
      .map(|career| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:>3}% ", career.match_score),
            Style::default().fg(score_color(career.match_score)).bold(),
          ),
          Span::raw(format!("{:<28}", truncate(&career.title, 28))),
          Span::styled(
            format!("{:<16}", career.salary_range.as_deref().unwrap_or("")),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(
            truncate(&career.skills.join(", "), 50),
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

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
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
      KeyCode::Char('r') => {
        self.profile.refetch();
        self.careers.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Char('m') => {
        self.cycle_min_match();
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => Some(ViewAction::Push(Box::new(AnalysisView::editing(
        self.ctx.clone(),
      )))),
      KeyCode::Char('b') => {
        let career = self.selected()?;
        let new = NewBookmark::career(career);
        self.bookmark = Some(spawn_bookmark(&self.ctx, new));
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let career = self.selected()?;
        Some(ViewAction::Push(Box::new(RoadmapView::new(
          self.ctx.clone(),
          career.id.clone(),
          career.title.clone(),
        ))))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for DashboardView {
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
      .constraints([Constraint::Length(5), Constraint::Min(0)])
      .split(area);

    self.render_profile(frame, chunks[0]);
    self.render_list(frame, chunks[1]);
    self.search.render_overlay(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.profile.poll();
    self.careers.poll();
    poll_bookmark(&mut self.bookmark)
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("enter", "roadmap").with_priority(30),
      ShortcutInfo::new("m", "min match").with_priority(40),
      ShortcutInfo::new("b", "bookmark").with_priority(50),
      ShortcutInfo::new("e", "edit profile").with_priority(60),
      ShortcutInfo::new("r", "refresh").with_priority(70),
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
    match d.category() {
      CareerQuery::PROFILE => json!({ "username": "priya", "interests": ["Data Science"] }),
      _ => json!([
        { "id": "data-scientist", "title": "Data Scientist", "match_score": 92, "skills": ["Python"] },
        { "id": "ux-designer", "title": "UX Designer", "match_score": 64, "skills": ["Figma"] },
        { "id": "analyst", "title": "Business Analyst", "match_score": 48, "skills": ["SQL"] }
      ]),
    }
  }

  async fn loaded() -> DashboardView {
    let mut view = DashboardView::new(test_context(respond));
    for _ in 0..10 {
      tokio::task::yield_now().await;
      view.tick();
    }
    view.list_state.select(Some(0));
    view
  }

  #[tokio::test]
  async fn test_min_match_cycles() {
    let mut view = loaded().await;
    assert_eq!(view.filtered().len(), 3);

    view.handle_key(key(KeyCode::Char('m')));
    assert_eq!(view.filter.min_match, 50);
    assert_eq!(view.filtered().len(), 2);

    for _ in 0..3 {
      view.handle_key(key(KeyCode::Char('m')));
    }
    assert_eq!(view.filter.min_match, 0);
  }

  #[tokio::test]
  async fn test_search_narrows_and_enter_opens_roadmap() {
    let mut view = loaded().await;
    view.handle_key(key(KeyCode::Char('/')));
    assert!(view.captures_input());
    for c in "figma".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    view.handle_key(key(KeyCode::Enter));
    assert!(!view.captures_input());
    assert_eq!(view.filtered().len(), 1);

    match view.handle_key(key(KeyCode::Enter)) {
      ViewAction::Push(next) => assert_eq!(next.breadcrumb_label(), "UX Designer"),
      other => panic!("expected push, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_edit_pushes_analysis() {
    let mut view = loaded().await;
    match view.handle_key(key(KeyCode::Char('e'))) {
      ViewAction::Push(next) => assert_eq!(next.breadcrumb_label(), "Career Analysis"),
      other => panic!("expected push, got {:?}", other),
    }
  }
}
