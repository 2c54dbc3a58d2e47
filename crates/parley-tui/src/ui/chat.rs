//! Chat area
//!
//! Displays the message log and the typing indicator.

use chrono::Local;
use parley_client::{Message, MessageStyle, SessionView};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render(frame: &mut Frame, session: &SessionView<'_>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Chat ");

    let items: Vec<ListItem> = if session.messages.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        session
            .messages
            .iter()
            .map(|msg| ListItem::new(message_line(msg, session.style(msg))))
            .collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

/// One log line: local time, sender, text.
fn message_line(msg: &Message, style: MessageStyle) -> Line<'static> {
    let time = Span::styled(
        msg.timestamp.with_timezone(&Local).format("%H:%M ").to_string(),
        Style::default().fg(Color::DarkGray),
    );

    match (style, msg.sender()) {
        (MessageStyle::System, _) | (_, None) => Line::from(vec![
            time,
            Span::styled(
                format!("* {}", msg.body),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
        (style, Some(sender)) => {
            let color = if style == MessageStyle::Mine { Color::Cyan } else { Color::Green };
            Line::from(vec![
                time,
                Span::styled(
                    format!("<{sender}>"),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::raw(msg.body.clone()),
            ])
        },
    }
}

/// Typing indicator text. `None` when nobody else is typing.
pub fn typing_text(usernames: &[String]) -> Option<String> {
    match usernames {
        [] => None,
        [one] => Some(format!("{one} is typing...")),
        many => Some(format!("{} are typing...", many.join(", "))),
    }
}

/// Render the typing indicator line.
pub fn render_typing(frame: &mut Frame, session: &SessionView<'_>, area: Rect) {
    let Some(text) = typing_text(session.typing) else {
        return;
    };
    let line = Paragraph::new(format!(" {text}"))
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
    frame.render_widget(line, area);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn system_lines_are_marked() {
        let msg = Message::system("s1", "bob joined", Utc::now());
        let line = message_line(&msg, MessageStyle::System);
        assert!(text(&line).ends_with("* bob joined"));
    }

    #[test]
    fn own_and_other_lines_differ_in_color() {
        let msg = Message::chat("m1", "bob", "hi", Utc::now());
        let mine = message_line(&msg, MessageStyle::Mine);
        let other = message_line(&msg, MessageStyle::Other);

        assert!(text(&mine).ends_with("<bob> hi"));
        assert_eq!(mine.spans[1].style.fg, Some(Color::Cyan));
        assert_eq!(other.spans[1].style.fg, Some(Color::Green));
    }

    #[test]
    fn typing_text_lists_names() {
        assert_eq!(typing_text(&[]), None);
        insta::assert_snapshot!(typing_text(&["bob".into()]).unwrap(), @"bob is typing...");
        insta::assert_snapshot!(
            typing_text(&["bob".into(), "carol".into()]).unwrap(),
            @"bob, carol are typing..."
        );
    }
}
