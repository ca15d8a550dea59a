use crate::app::{App, View};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some(msg) = app.status_message() {
        Cow::Borrowed(msg)
    } else {
        match app.view {
            View::Feed => Cow::Borrowed(
                "[←/→]category [j/k]move [Enter]open [/]search [h]istory [o]browser [q]uit",
            ),
            View::Search => {
                Cow::Borrowed("[j/k]move [Enter]open [/]new search [Esc]feed [q]uit")
            }
            View::History => {
                Cow::Borrowed("[j/k]move [Enter]open [x]remove [C]lear all [Esc]feed [q]uit")
            }
            View::Detail => {
                Cow::Borrowed("[j/k]related [Enter]open related [o]browser [Esc]back [q]uit")
            }
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
