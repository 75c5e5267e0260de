use crate::ui::view::{Toast, ToastLevel};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: view breadcrumb, or the current toast
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], toast: Option<&Toast>) {
  if let Some(toast) = toast {
    let style = match toast.level {
      ToastLevel::Info => Style::default().fg(Color::Black).bg(Color::Green),
      ToastLevel::Error => Style::default().fg(Color::White).bg(Color::Red),
    };
    let paragraph = Paragraph::new(format!(" {} ", toast.message)).style(style);
    frame.render_widget(paragraph, area);
    return;
  }

  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i + 1 == breadcrumb.len() {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
