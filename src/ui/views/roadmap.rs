use crate::api::types::Roadmap;
use crate::api::CareerQuery;
use crate::app::Context;
use crate::query::{Query, QueryState};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Learning roadmap for one career
pub struct RoadmapView {
  title: String,
  query: Query<Roadmap>,
  scroll: u16,
}

impl RoadmapView {
  pub fn new(ctx: Context, career_id: String, title: String) -> Self {
    let query = ctx.query(&CareerQuery::Roadmap { career_id });
    Self {
      title,
      query,
      scroll: 0,
    }
  }

  fn roadmap_lines(roadmap: &Roadmap) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let total_weeks: u32 = roadmap.steps.iter().filter_map(|s| s.duration_weeks).sum();
    if total_weeks > 0 {
      lines.push(Line::styled(
        format!("{} steps, about {} weeks", roadmap.steps.len(), total_weeks),
        Style::default().fg(Color::DarkGray),
      ));
      lines.push(Line::raw(""));
    }

    for (idx, step) in roadmap.steps.iter().enumerate() {
      let mut heading = vec![
        Span::styled(format!("{:>2}. ", idx + 1), Style::default().fg(Color::Cyan)),
        Span::styled(step.title.clone(), Style::default().bold()),
      ];
      if let Some(weeks) = step.duration_weeks {
        heading.push(Span::styled(
          format!("  ({} wk)", weeks),
          Style::default().fg(Color::Yellow),
        ));
      }
      lines.push(Line::from(heading));

      if !step.description.is_empty() {
        lines.push(Line::raw(format!("    {}", step.description)));
      }
      for resource in &step.resources {
        lines.push(Line::styled(
          format!("    - {}", resource),
          Style::default().fg(Color::DarkGray),
        ));
      }
      lines.push(Line::raw(""));
    }
    lines
  }
}

impl View for RoadmapView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Char('g') => self.scroll = 0,
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let (title, lines) = match self.query.state() {
      QueryState::Success(roadmap) => {
        let suffix = if self.query.is_refreshing() {
          " (refreshing...)"
        } else {
          ""
        };
        (
          format!(" {} roadmap{} ", roadmap.title, suffix),
          Self::roadmap_lines(&roadmap),
        )
      }
      QueryState::Error(e) => (
        format!(" {} (error) ", self.title),
        vec![Line::styled(
          format!("Failed to load roadmap: {}. Press 'r' to retry.", e.short()),
          Style::default().fg(Color::Red),
        )],
      ),
      QueryState::Idle | QueryState::Loading => (
        format!(" {} (loading...) ", self.title),
        Vec::new(),
      ),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.title.clone()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();
    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "scroll").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::RoadmapStep;

  #[test]
  fn test_roadmap_lines_sum_weeks() {
    let roadmap = Roadmap {
      career_id: "data-scientist".to_string(),
      title: "Data Scientist".to_string(),
      steps: vec![
        RoadmapStep {
          title: "Python basics".to_string(),
          description: String::new(),
          duration_weeks: Some(4),
          resources: vec!["https://docs.python.org/3/tutorial/".to_string()],
        },
        RoadmapStep {
          title: "Statistics".to_string(),
          description: "Descriptive and inferential".to_string(),
          duration_weeks: Some(6),
          resources: Vec::new(),
        },
      ],
    };
    let lines = RoadmapView::roadmap_lines(&roadmap);
    assert_eq!(lines[0].to_string(), "2 steps, about 10 weeks");
    assert_eq!(lines[2].to_string(), " 1. Python basics  (4 wk)");
    assert_eq!(lines[3].to_string(), "    - https://docs.python.org/3/tutorial/");
  }
}
