use crate::api::{ApiClient, CareerQuery};
use crate::commands::Command;
use crate::config::Config;
use crate::db::flags::LAST_USERNAME;
use crate::db::Flags;
use crate::event::{Event, EventHandler};
use crate::query::{Query, QueryStore};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{Toast, View, ViewAction};
use crate::ui::views::{self, LoginView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use serde::de::DeserializeOwned;
use std::io::stdout;
use tracing::{debug, info, warn};

/// Handles shared by every view
#[derive(Clone)]
pub struct Context {
  pub store: QueryStore,
  pub api: ApiClient,
  pub flags: Flags,
}

impl Context {
  /// Subscribe to a backend read as a typed handle.
  pub fn query<T: DeserializeOwned>(&self, query: &CareerQuery) -> Query<T> {
    Query::new(self.store.subscribe(query.descriptor()))
  }

  /// Read a boolean flag, treating storage failures as unset.
  pub fn flag(&self, name: &str) -> bool {
    self.flags.get_bool(name).unwrap_or_else(|e| {
      warn!(flag = name, error = %e, "failed to read flag");
      false
    })
  }

  pub fn set_flag(&self, name: &str, value: bool) {
    if let Err(e) = self.flags.set_bool(name, value) {
      warn!(flag = name, error = %e, "failed to write flag");
    }
  }
}

/// Main application state
pub struct App {
  ctx: Context,
  config: Config,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` palette
  command: CommandInput,

  toast: Option<Toast>,

  /// Shown in the header while logged in
  username: Option<String>,

  should_quit: bool,
}

impl App {
  pub fn new(ctx: Context, config: Config) -> Self {
    let root: Box<dyn View> = if ctx.api.is_authenticated() {
      views::home_view(&ctx)
    } else {
      Box::new(LoginView::new(ctx.clone(), last_username(&ctx, &config)))
    };

    Self {
      ctx,
      config,
      view_stack: vec![root],
      command: CommandInput::new(),
      toast: None,
      username: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(self.config.tick_rate());
    info!(backend = %self.ctx.api.base_url(), "started");

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let captures_input = self
      .view_stack
      .last()
      .is_some_and(|view| view.captures_input());

    if self.command.is_active() || !captures_input {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Unknown(input)) => {
          if !input.is_empty() {
            self.toast = Some(Toast::error(format!("unknown command: {}", input)));
          }
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn tick(&mut self) {
    if let Some(view) = self.view_stack.last_mut() {
      let action = view.tick();
      self.apply(action);
    }

    self.ctx.store.collect_garbage();

    if self.toast.as_ref().is_some_and(Toast::is_expired) {
      self.toast = None;
    }

    if !self.ctx.api.is_authenticated() {
      self.username = None;
    } else if self.username.is_none() {
      self.username = self.ctx.flags.get(LAST_USERNAME).ok().flatten();
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "push");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Replace(view) => self.replace_root(view),
      ViewAction::Toast(toast) => self.toast = Some(toast),
      ViewAction::Quit => self.should_quit = true,
    }
  }

  /// Drop the whole stack (and its subscriptions) for a new root
  fn replace_root(&mut self, view: Box<dyn View>) {
    debug!(view = %view.breadcrumb_label(), "replace root");
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  fn execute_command(&mut self, cmd: &Command) {
    match cmd.name {
      "quit" => self.should_quit = true,
      "logout" => {
        // Unmount first so nothing refetches without a token
        let login = LoginView::new(self.ctx.clone(), last_username(&self.ctx, &self.config));
        self.replace_root(Box::new(login));
        self.ctx.api.logout();
        let removed = self.ctx.store.clear();
        self.username = None;
        info!(removed, "logged out");
      }
      _ if !self.ctx.api.is_authenticated() => {
        self.toast = Some(Toast::error("log in first"));
      }
      name => match views::for_command(name, &self.ctx) {
        Some(view) => self.replace_root(view),
        None => warn!(command = name, "command has no view"),
      },
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // header
        Constraint::Min(0),    // body
        Constraint::Length(1), // footer
      ])
      .split(frame.area());

    let shortcuts = self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default();
    draw_header(
      frame,
      chunks[0],
      self.ctx.api.base_url().as_str(),
      self.username.as_deref(),
      &shortcuts,
    );

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }
    self.command.render_overlay(frame, chunks[1]);

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect();
    draw_footer(frame, chunks[2], &breadcrumb, self.toast.as_ref());
  }
}

/// Username to prefill on the login form
fn last_username(ctx: &Context, config: &Config) -> String {
  ctx
    .flags
    .get(LAST_USERNAME)
    .ok()
    .flatten()
    .or_else(|| config.username.clone())
    .unwrap_or_default()
}
