use crate::api::types::{OptimizeKind, OptimizeResult};
use crate::app::Context;
use crate::forms::{OptimizeForm, OPTIMIZE_TEXT_MAX};
use crate::query::{Mutation, PendingMutation};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Resume / LinkedIn text optimizer backed by the LLM endpoint
pub struct OptimizerView {
  ctx: Context,
  kind: OptimizeKind,
  input: TextInput,
  pending: Option<PendingMutation<OptimizeResult>>,
  result: Option<OptimizeResult>,
  error: Option<String>,
  scroll: u16,
}

impl OptimizerView {
  pub fn new(ctx: Context) -> Self {
    Self {
      ctx,
      kind: OptimizeKind::default(),
      input: TextInput::new().with_max_chars(OPTIMIZE_TEXT_MAX),
      pending: None,
      result: None,
      error: None,
      scroll: 0,
    }
  }

  fn is_pending(&self) -> bool {
    self.pending.as_ref().is_some_and(PendingMutation::is_pending)
  }

  fn submit(&mut self) {
    let form = OptimizeForm {
      kind: self.kind,
      text: self.input.value().to_string(),
    };
    let request = match form.validate() {
      Ok(request) => request,
      Err(e) => {
        self.error = Some(e.to_string());
        return;
      }
    };
    self.error = None;

    // Nothing cached depends on the optimizer
    let mutation = Mutation::new(format!("optimize {}", request.kind.label()));
    let api = self.ctx.api.clone();
    self.pending = Some(
      self
        .ctx
        .store
        .spawn_mutation(mutation, async move { api.optimize(&request).await }),
    );
  }

  fn render_result(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" Optimized {} ", self.kind.label()))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines: Vec<Line> = if self.is_pending() {
      vec![Line::styled("Optimizing...", Style::default().fg(Color::Yellow))]
    } else if let Some(error) = &self.error {
      vec![Line::styled(error.clone(), Style::default().fg(Color::Red))]
    } else if let Some(result) = &self.result {
      let mut lines: Vec<Line> = result.optimized.lines().map(|l| Line::raw(l.to_string())).collect();
      if !result.suggestions.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::styled("Suggestions", Style::default().fg(Color::Yellow).bold()));
        for suggestion in &result.suggestions {
          lines.push(Line::raw(format!("  - {}", suggestion)));
        }
      }
      lines
    } else {
      vec![Line::styled(
        "Paste your text above and press Enter.",
        Style::default().fg(Color::DarkGray),
      )]
    };

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }
}

impl View for OptimizerView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Tab => {
        self.kind = self.kind.toggle();
        return ViewAction::None;
      }
      KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        return ViewAction::None;
      }
      KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        return ViewAction::None;
      }
      _ => {}
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) if !self.is_pending() => self.submit(),
      InputResult::Cancelled => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn tick(&mut self) -> ViewAction {
    if let Some(result) = self.pending.as_mut().and_then(PendingMutation::poll) {
      self.pending = None;
      self.scroll = 0;
      match result {
        Ok(result) => self.result = Some(result),
        Err(e) => self.error = Some(e.to_string()),
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(4), Constraint::Min(0)])
      .split(area);

    let tab = |kind: OptimizeKind| {
      let style = if kind == self.kind {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Gray)
      };
      Span::styled(format!(" {} ", kind.label()), style)
    };

    let count = self.input.value().chars().count();
    let input_block = Block::default()
      .title(Line::from(vec![
        Span::raw(" "),
        tab(OptimizeKind::Resume),
        Span::raw(" "),
        tab(OptimizeKind::Linkedin),
        Span::raw(" "),
      ]))
      .title_bottom(format!(" {}/{} ", count, OPTIMIZE_TEXT_MAX))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    let input = Paragraph::new(Line::from(self.input.spans(true, false)))
      .block(input_block)
      .wrap(Wrap { trim: false });
    frame.render_widget(input, chunks[0]);

    self.render_result(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Optimizer".to_string()
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "resume/linkedin").with_priority(10),
      ShortcutInfo::new("enter", "optimize").with_priority(20),
      ShortcutInfo::new("↑/↓", "scroll").with_priority(30),
      ShortcutInfo::new("esc", "back").with_priority(40),
    ]
  }
}
