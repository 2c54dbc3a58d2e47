//! Roster sidebar
//!
//! Lists connected users, marking the local session.

use parley_client::SessionView;
use parley_proto::User;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem},
};

const YOU_MARKER: &str = " (you)";

/// Sidebar text for `user`.
pub fn entry_text(user: &User, is_me: bool) -> String {
    if is_me { format!("{}{YOU_MARKER}", user.username) } else { user.username.clone() }
}

/// Render the roster sidebar.
pub fn render(frame: &mut Frame, session: &SessionView<'_>, area: Rect) {
    let items: Vec<ListItem> = session
        .users
        .iter()
        .map(|user| {
            let is_me = session.is_me(user);
            let style = if is_me {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::styled(entry_text(user, is_me), style))
        })
        .collect();

    let title = format!(" Online ({}) ", session.users.len());
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(list, area);
}
