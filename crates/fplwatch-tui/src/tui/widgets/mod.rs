// TUI widget modules for each panel.

pub mod breakdown;
pub mod fixtures;
pub mod leagues;
pub mod overview;
pub mod safety;
pub mod standings;
pub mod status_bar;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// Grey single-line hint shown in a panel that has nothing to display.
pub fn placeholder(text: &str) -> Line<'static> {
    Line::from(Span::styled(format!(" {text}"), Style::default().fg(Color::DarkGray)))
}

/// Red line for the latest fetch failure of a panel's metric.
pub fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(format!(" {message}"), Style::default().fg(Color::Red)))
}

/// Plain text of a line, for assertions.
#[cfg(test)]
pub fn line_text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}
