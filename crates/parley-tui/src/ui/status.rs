//! Status bar
//!
//! Displays connection status, the transient status message and the alert
//! banner.

use parley_client::{ConnectionState, SessionView};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::App;

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, session: &SessionView<'_>, area: Rect) {
    let connection_status = match session.connection_state {
        ConnectionState::Disconnected => {
            Span::styled("Disconnected", Style::default().fg(Color::Red))
        },
        ConnectionState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Connected => Span::styled(
            format!("Connected as {}", session.username.unwrap_or_default()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let mut spans = vec![Span::raw(" "), connection_status];

    if let Some(alert) = app.alert() {
        spans.push(Span::styled(
            format!(" | {}: {}", alert.notification.title, alert.notification.body),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    } else if let Some(message) = app.status_message() {
        spans.push(Span::styled(format!(" | {message}"), Style::default().fg(Color::White)));
    }

    let bar = Style::default().bg(Color::DarkGray).fg(Color::White);
    let paragraph = Paragraph::new(Line::from(spans)).style(bar);

    frame.render_widget(paragraph, area);
}
