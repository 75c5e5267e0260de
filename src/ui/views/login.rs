use crate::api::types::AuthSession;
use crate::app::Context;
use crate::db::flags::LAST_USERNAME;
use crate::forms::{LoginForm, USERNAME_MAX};
use crate::query::{DescriptorPattern, Mutation, PendingMutation};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::home_view;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
  Username,
  Password,
}

/// Username/password form. Ctrl-r switches between log in and register.
pub struct LoginView {
  ctx: Context,
  username: TextInput,
  password: TextInput,
  focus: Focus,
  register: bool,
  pending: Option<PendingMutation<AuthSession>>,
  error: Option<String>,
}

impl LoginView {
  pub fn new(ctx: Context, username: impl Into<String>) -> Self {
    let username = TextInput::with_value(username).with_max_chars(USERNAME_MAX);
    let focus = if username.is_empty() {
      Focus::Username
    } else {
      Focus::Password
    };
    Self {
      ctx,
      username,
      password: TextInput::new(),
      focus,
      register: false,
      pending: None,
      error: None,
    }
  }

  fn is_pending(&self) -> bool {
    self.pending.as_ref().is_some_and(PendingMutation::is_pending)
  }

  fn submit(&mut self) {
    let form = LoginForm::new(self.username.value(), self.password.value());
    let username = match form.validate() {
      Ok(username) => username,
      Err(e) => {
        self.error = Some(e.to_string());
        return;
      }
    };
    self.error = None;

    let api = self.ctx.api.clone();
    let password = form.password;
    let register = self.register;
    // A new session makes every cached read belong to someone else
    let mutation = Mutation::new(if register { "register" } else { "log in" })
      .invalidates(DescriptorPattern::all());
    self.pending = Some(self.ctx.store.spawn_mutation(mutation, async move {
      if register {
        api.register(&username, &password).await
      } else {
        api.login(&username, &password).await
      }
    }));
  }

  /// Remember who logged in. Cached reads of another account, including
  /// snapshots persisted by an earlier run, are dropped.
  fn start_session(&self, username: &str) {
    let previous = self.ctx.flags.get(LAST_USERNAME).ok().flatten();
    if previous.as_deref() != Some(username) {
      let removed = self.ctx.store.clear();
      debug!(removed, "account changed, cache cleared");
    }
    if let Err(e) = self.ctx.flags.set(LAST_USERNAME, username) {
      warn!(error = %e, "failed to remember username");
    }
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Focus::Username => Focus::Password,
      Focus::Password => Focus::Username,
    };
  }

  fn field_line(&self, label: &'static str, field: Focus) -> Line<'static> {
    let focused = self.focus == field;
    let input = match field {
      Focus::Username => &self.username,
      Focus::Password => &self.password,
    };
    let label_style = if focused {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::Gray)
    };
    let mut spans = vec![Span::styled(format!("{:<10}", label), label_style)];
    spans.extend(input.spans(focused, field == Focus::Password));
    Line::from(spans)
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.is_pending() {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.register = !self.register;
        self.error = None;
        return ViewAction::None;
      }
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.toggle_focus();
        return ViewAction::None;
      }
      _ => {}
    }

    let input = match self.focus {
      Focus::Username => &mut self.username,
      Focus::Password => &mut self.password,
    };
    match input.handle_key(key) {
      InputResult::Submitted(_) if self.focus == Focus::Username => self.toggle_focus(),
      InputResult::Submitted(_) => self.submit(),
      InputResult::Cancelled => self.error = None,
      InputResult::Consumed | InputResult::NotHandled => {}
    }
    ViewAction::None
  }

  fn tick(&mut self) -> ViewAction {
    let Some(result) = self.pending.as_mut().and_then(PendingMutation::poll) else {
      return ViewAction::None;
    };
    self.pending = None;

    match result {
      Ok(session) => {
        self.start_session(&session.username);
        ViewAction::Replace(home_view(&self.ctx))
      }
      Err(e) => {
        self.password.clear();
        self.focus = Focus::Password;
        self.error = Some(e.source.short());
        ViewAction::None
      }
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let width = 50.min(area.width);
    let height = 9.min(area.height);
    let form_area = Rect::new(
      area.x + (area.width - width) / 2,
      area.y + (area.height - height) / 2,
      width,
      height,
    );

    let title = if self.register {
      " Create account "
    } else {
      " Log in "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let status = if self.is_pending() {
      Line::styled("Contacting server...", Style::default().fg(Color::Yellow))
    } else if let Some(error) = &self.error {
      Line::styled(error.clone(), Style::default().fg(Color::Red))
    } else {
      Line::raw("")
    };

    let hint = if self.register {
      "Enter: register  Ctrl-r: log in instead"
    } else {
      "Enter: log in  Ctrl-r: create an account"
    };

    let lines = vec![
      Line::raw(""),
      self.field_line("Username", Focus::Username),
      self.field_line("Password", Focus::Password),
      Line::raw(""),
      status,
      Line::styled(hint, Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Clear, form_area);
    frame.render_widget(Paragraph::new(lines).block(block), form_area);
  }

  fn breadcrumb_label(&self) -> String {
    "Login".to_string()
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("ctrl-r", "register").with_priority(20),
      ShortcutInfo::new("ctrl-c", "quit").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::CareerQuery;
  use crate::ui::views::test_context;
  use serde_json::json;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(view: &mut LoginView, s: &str) {
    for c in s.chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[tokio::test]
  async fn test_prefilled_username_focuses_password() {
    let view = LoginView::new(test_context(|_| json!(null)), "priya");
    assert_eq!(view.focus, Focus::Password);
    assert_eq!(view.username.value(), "priya");
  }

  #[tokio::test]
  async fn test_invalid_form_never_sends() {
    let mut view = LoginView::new(test_context(|_| json!(null)), "");
    type_str(&mut view, "ab");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "secret1");
    view.handle_key(key(KeyCode::Enter));

    assert!(view.pending.is_none());
    assert_eq!(view.error.as_deref(), Some("username: must be 3-32 characters"));
  }

  #[tokio::test]
  async fn test_failed_login_shows_error_and_clears_password() {
    let mut view = LoginView::new(test_context(|_| json!(null)), "priya");
    type_str(&mut view, "secret1");
    view.handle_key(key(KeyCode::Enter));
    assert!(view.is_pending());

    // Nothing listens on the test backend, so the write fails
    let mut action = ViewAction::None;
    for _ in 0..200 {
      tokio::time::sleep(std::time::Duration::from_millis(10)).await;
      action = view.tick();
      if view.pending.is_none() {
        break;
      }
    }
    assert!(matches!(action, ViewAction::None));
    assert!(view.error.is_some());
    assert!(view.password.is_empty());
    assert!(!view.ctx.api.is_authenticated());
  }

  #[tokio::test]
  async fn test_ctrl_r_toggles_register() {
    let mut view = LoginView::new(test_context(|_| json!(null)), "");
    view.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
    assert!(view.register);
    assert!(view.username.is_empty());
  }

  #[tokio::test]
  async fn test_other_account_drops_cached_reads() {
    let ctx = test_context(|_| json!({ "name": "Asha" }));
    ctx.flags.set(LAST_USERNAME, "asha").unwrap();
    ctx.store.fetch(&CareerQuery::Profile.descriptor()).await.unwrap();
    let view = LoginView::new(ctx.clone(), "asha");

    view.start_session("asha");
    assert_eq!(ctx.store.entry_count(), 1);

    view.start_session("priya");
    assert_eq!(ctx.store.entry_count(), 0);
    assert_eq!(ctx.flags.get(LAST_USERNAME).unwrap().as_deref(), Some("priya"));
  }
}
