use crate::api::types::Profile;
use crate::api::CareerQuery;
use crate::app::Context;
use crate::catalog::{EDUCATION_OPTIONS, INTEREST_AREAS};
use crate::db::flags::ANALYSIS_COMPLETED;
use crate::forms::ProfileForm;
use crate::query::{Mutation, PendingMutation, Query};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{ShortcutInfo, Toast, View, ViewAction};
use crate::ui::views::DashboardView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Interests,
  Education,
  Skills,
  TargetRole,
}

impl Field {
  const ORDER: [Field; 4] = [Field::Interests, Field::Education, Field::Skills, Field::TargetRole];

  fn step(self, delta: isize) -> Self {
    let len = Self::ORDER.len() as isize;
    let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
    Self::ORDER[(idx + delta).rem_euclid(len) as usize]
  }
}

/// The career analysis questionnaire. Prefilled from the stored profile.
///
/// Opened as a root it replaces itself with the dashboard once saved;
/// pushed from the dashboard (`e`) it pops back instead.
pub struct AnalysisView {
  ctx: Context,
  profile: Query<Profile>,
  form: ProfileForm,
  prefilled: bool,
  pushed: bool,

  focus: Field,
  interest_cursor: usize,
  skills: TextInput,
  target_role: TextInput,

  pending: Option<PendingMutation<Profile>>,
  error: Option<String>,
}

impl AnalysisView {
  pub fn new(ctx: Context) -> Self {
    let profile = ctx.query(&CareerQuery::Profile);
    let mut view = Self {
      ctx,
      profile,
      form: ProfileForm::default(),
      prefilled: false,
      pushed: false,
      focus: Field::Interests,
      interest_cursor: 0,
      skills: TextInput::new(),
      target_role: TextInput::new(),
      pending: None,
      error: None,
    };
    view.prefill();
    view
  }

  /// Edit the profile on top of the dashboard
  pub fn editing(ctx: Context) -> Self {
    Self {
      pushed: true,
      ..Self::new(ctx)
    }
  }

  fn prefill(&mut self) {
    if self.prefilled {
      return;
    }
    if let Some(profile) = self.profile.data() {
      self.form = ProfileForm::from_profile(profile);
      self.skills.set_value(self.form.skills.clone());
      self.target_role.set_value(self.form.target_role.clone());
      self.prefilled = true;
    }
  }

  fn is_pending(&self) -> bool {
    self.pending.as_ref().is_some_and(PendingMutation::is_pending)
  }

  fn cycle_education(&mut self, delta: isize) {
    let len = EDUCATION_OPTIONS.len() as isize;
    let next = match EDUCATION_OPTIONS.iter().position(|e| *e == self.form.education) {
      Some(idx) => (idx as isize + delta).rem_euclid(len),
      None if delta < 0 => len - 1,
      None => 0,
    };
    self.form.education = EDUCATION_OPTIONS[next as usize].to_string();
  }

  fn submit(&mut self) {
    self.form.skills = self.skills.value().to_string();
    self.form.target_role = self.target_role.value().to_string();

    let base = self.profile.data().cloned().unwrap_or_default();
    let profile = match self.form.validate(&base) {
      Ok(profile) => profile,
      Err(e) => {
        self.error = Some(e.to_string());
        return;
      }
    };
    self.error = None;

    let mut mutation = Mutation::new("save profile")
      .invalidates(CareerQuery::Profile.category_pattern())
      .invalidates(CareerQuery::Careers.category_pattern());
    if let Ok(value) = serde_json::to_value(&profile) {
      mutation = mutation.optimistic(CareerQuery::Profile.descriptor(), value);
    }

    let api = self.ctx.api.clone();
    self.pending = Some(
      self
        .ctx
        .store
        .spawn_mutation(mutation, async move { api.update_profile(&profile).await }),
    );
  }

  fn handle_field_key(&mut self, key: KeyEvent) {
    match self.focus {
      Field::Interests => match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
          self.interest_cursor = (self.interest_cursor + 1) % INTEREST_AREAS.len();
        }
        KeyCode::Char('k') | KeyCode::Up => {
          self.interest_cursor = (self.interest_cursor + INTEREST_AREAS.len() - 1) % INTEREST_AREAS.len();
        }
        KeyCode::Char(' ') => self.form.toggle_interest(INTEREST_AREAS[self.interest_cursor]),
        KeyCode::Enter => self.submit(),
        _ => {}
      },
      Field::Education => match key.code {
        KeyCode::Left | KeyCode::Char('h') => self.cycle_education(-1),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => self.cycle_education(1),
        KeyCode::Enter => self.submit(),
        _ => {}
      },
      Field::Skills | Field::TargetRole => {
        let input = if self.focus == Field::Skills {
          &mut self.skills
        } else {
          &mut self.target_role
        };
        if let InputResult::Submitted(_) = input.handle_key(key) {
          self.submit();
        }
      }
    }
  }

  fn render_interests(&self) -> Vec<Line<'static>> {
    let focused = self.focus == Field::Interests;
    INTEREST_AREAS
      .iter()
      .enumerate()
      .map(|(idx, interest)| {
        let checked = self.form.interests.iter().any(|i| i == interest);
        let marker = if checked { "[x] " } else { "[ ] " };
        let style = if focused && idx == self.interest_cursor {
          Style::default().bg(Color::DarkGray).bold()
        } else if checked {
          Style::default().fg(Color::Green)
        } else {
          Style::default()
        };
        Line::styled(format!("  {}{}", marker, interest), style)
      })
      .collect()
  }

  fn label(&self, text: &'static str, field: Field) -> Span<'static> {
    let style = if self.focus == field {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::Yellow)
    };
    Span::styled(text, style)
  }
}

impl View for AnalysisView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.is_pending() {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Tab => self.focus = self.focus.step(1),
      KeyCode::BackTab => self.focus = self.focus.step(-1),
      KeyCode::Esc if self.pushed => return ViewAction::Pop,
      KeyCode::Char('q') if self.pushed && !self.captures_input() => return ViewAction::Pop,
      _ => self.handle_field_key(key),
    }
    ViewAction::None
  }

  fn tick(&mut self) -> ViewAction {
    if self.profile.poll() {
      self.prefill();
    }

    let Some(result) = self.pending.as_mut().and_then(PendingMutation::poll) else {
      return ViewAction::None;
    };
    self.pending = None;

    match result {
      Ok(profile) => {
        info!(interests = profile.interests.len(), "career analysis saved");
        self.ctx.set_flag(ANALYSIS_COMPLETED, true);
        if self.pushed {
          ViewAction::Pop
        } else {
          ViewAction::Replace(Box::new(DashboardView::new(self.ctx.clone())))
        }
      }
      Err(e) => ViewAction::Toast(Toast::error(e.to_string())),
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = if self.profile.is_loading() && !self.prefilled {
      " Career Analysis (loading profile...) "
    } else {
      " Career Analysis "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let mut lines = vec![Line::from(vec![
      self.label("Interests", Field::Interests),
      Span::styled("  (space to toggle)", Style::default().fg(Color::DarkGray)),
    ])];
    lines.extend(self.render_interests());
    lines.push(Line::raw(""));

    let education = if self.form.education.is_empty() {
      "(choose with ←/→)".to_string()
    } else {
      format!("< {} >", self.form.education)
    };
    lines.push(Line::from(vec![
      self.label("Education    ", Field::Education),
      Span::raw(education),
    ]));

    let mut skills = vec![self.label("Skills       ", Field::Skills)];
    skills.extend(self.skills.spans(self.focus == Field::Skills, false));
    lines.push(Line::from(skills));

    let mut role = vec![self.label("Target role  ", Field::TargetRole)];
    role.extend(self.target_role.spans(self.focus == Field::TargetRole, false));
    lines.push(Line::from(role));

    lines.push(Line::raw(""));
    if self.is_pending() {
      lines.push(Line::styled("Saving...", Style::default().fg(Color::Yellow)));
    } else if let Some(error) = &self.error {
      lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
    } else {
      lines.push(Line::styled(
        "Tab: next field  Enter: save and see your matches",
        Style::default().fg(Color::DarkGray),
      ));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Career Analysis".to_string()
  }

  fn captures_input(&self) -> bool {
    matches!(self.focus, Field::Skills | Field::TargetRole)
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("space", "toggle").with_priority(20),
      ShortcutInfo::new("enter", "save").with_priority(30),
    ]
  }
}
