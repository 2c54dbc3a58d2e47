//! UI rendering
//!
//! Rendering functions that convert App and session state into terminal
//! output using ratatui widgets. All functions are pure (no I/O), taking
//! state and returning widget trees.

mod chat;
mod input;
mod roster;
mod status;

pub use chat::typing_text;
use parley_client::SessionView;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
pub use roster::entry_text;

use crate::App;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App, session: &SessionView<'_>) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const TYPING_HEIGHT: u16 = 1;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(TYPING_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, typing_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, session, *main_area);
    chat::render_typing(frame, session, *typing_area);
    input::render(frame, app, *input_area);
    status::render(frame, app, session, *status_area);

    if app.is_prompting() {
        render_permission_prompt(frame);
    }
}

/// Render the main area (chat log + roster sidebar).
fn render_main_area(frame: &mut Frame, session: &SessionView<'_>, area: Rect) {
    const ROSTER_WIDTH: u16 = 22;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(CHAT_AREA_MIN_WIDTH), Constraint::Length(ROSTER_WIDTH)])
        .split(area);

    let [chat_area, roster_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, session, *chat_area);
    roster::render(frame, session, *roster_area);
}

/// Overlay the one-time notification permission question.
fn render_permission_prompt(frame: &mut Frame) {
    const PROMPT_WIDTH: u16 = 48;
    const PROMPT_HEIGHT: u16 = 5;

    let area = frame.area();
    let width = PROMPT_WIDTH.min(area.width);
    let height = PROMPT_HEIGHT.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Notifications ")
        .border_style(Style::default().fg(Color::Yellow));
    let text = Paragraph::new("Ring the bell when someone else posts?\n[y] yes   [n] no")
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(block);

    frame.render_widget(Clear, popup);
    frame.render_widget(text, popup);
}
