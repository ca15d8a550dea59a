//! Render functions for the TUI.
//!
//! Dispatches to the view renderers and draws the search overlay on top
//! when the input is open.

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{window_offset, App, View};
use crate::catalog::VideoSummary;
use crate::feed::{Category, FeedPhase};
use crate::util::{format_compact_count, relative_time, truncate_to_width};

use super::status;

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

pub(super) struct Palette {
    pub accent: Color,
    pub dim: Color,
    pub error: Color,
}

pub(super) fn palette(theme: &str) -> Palette {
    match theme {
        "light" => Palette {
            accent: Color::Blue,
            dim: Color::Gray,
            error: Color::Red,
        },
        _ => Palette {
            accent: Color::Cyan,
            dim: Color::DarkGray,
            error: Color::Red,
        },
    }
}

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-size and too-small terminals
    if area.width < 1 || area.height < 1 {
        return;
    }
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    match app.view {
        View::Feed => render_feed(f, app),
        View::Search => render_search(f, app),
        View::History => render_history(f, app),
        View::Detail => render_detail(f, app),
    }

    if app.search.editing {
        render_search_overlay(f, app);
    }
}

// ============================================================================
// Feed View
// ============================================================================

fn render_feed(f: &mut Frame, app: &mut App) {
    let pal = palette(&app.config.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    // Category tab row
    let active = Category::ALL
        .iter()
        .position(|c| *c == app.feed.query().category)
        .unwrap_or(0);
    let tabs = Tabs::new(Category::ALL.iter().map(|c| Line::from(c.label())))
        .select(active)
        .highlight_style(
            Style::default()
                .fg(pal.accent)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" ");
    f.render_widget(tabs, chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Videos — {} ", app.feed.query().category.label()));
    let inner = block.inner(chunks[1]);
    f.render_widget(block, chunks[1]);
    app.list_rows = inner.height;

    let items = app.feed.items();
    match app.feed.phase() {
        FeedPhase::LoadingInitial => render_shimmer(f, inner),
        FeedPhase::Error if items.is_empty() => {
            let msg = app.feed.last_error().unwrap_or("unknown error");
            render_center_message(
                f,
                inner,
                vec![
                    Line::styled("Error loading videos", Style::default().fg(pal.error)),
                    Line::raw(msg.to_string()),
                    Line::styled("press r to retry", Style::default().fg(pal.dim)),
                ],
            );
        }
        _ if items.is_empty() => {
            render_center_message(
                f,
                inner,
                vec![
                    Line::raw("No videos found"),
                    Line::styled(
                        "Try selecting a different category",
                        Style::default().fg(pal.dim),
                    ),
                ],
            );
        }
        _ => {
            let tail = feed_tail_line(app, &pal);
            render_video_list(f, inner, items, app.feed_selected, tail, &pal);
        }
    }

    status::render(f, app, chunks[2]);
}

/// The marker row shown after the last loaded video, if any.
fn feed_tail_line<'a>(app: &App, pal: &Palette) -> Option<Line<'a>> {
    match app.feed.phase() {
        FeedPhase::LoadingMore => Some(Line::styled(
            "  Loading more videos...",
            Style::default().fg(pal.dim).add_modifier(Modifier::ITALIC),
        )),
        FeedPhase::Error => {
            let msg = app.feed.last_error().unwrap_or("unknown error");
            Some(Line::styled(
                format!("  Error loading more: {} — press r to retry", msg),
                Style::default().fg(pal.error),
            ))
        }
        _ if !app.feed.has_more() => Some(Line::styled(
            "  — You've reached the end of the videos —",
            Style::default().fg(pal.dim),
        )),
        _ => None,
    }
}

// ============================================================================
// Search Results View
// ============================================================================

fn render_search(f: &mut Frame, app: &mut App) {
    let pal = palette(&app.config.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let title = match &app.search.query {
        Some(q) => format!(" Search results for \"{}\" ", q),
        None => " Search ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    if app.search.loading {
        render_shimmer(f, inner);
    } else if let Some(err) = &app.search.error {
        render_center_message(
            f,
            inner,
            vec![
                Line::styled(
                    "Error loading search results",
                    Style::default().fg(pal.error),
                ),
                Line::raw(err.clone()),
                Line::styled("press Enter in / to retry", Style::default().fg(pal.dim)),
            ],
        );
    } else if app.search.results.is_empty() {
        render_center_message(
            f,
            inner,
            vec![
                Line::raw("No results found"),
                Line::styled("Try a different search term", Style::default().fg(pal.dim)),
            ],
        );
    } else {
        render_video_list(f, inner, &app.search.results, app.search.selected, None, &pal);
    }

    status::render(f, app, chunks[1]);
}

// ============================================================================
// Watch History View
// ============================================================================

fn render_history(f: &mut Frame, app: &mut App) {
    let pal = palette(&app.config.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let block = Block::default().borders(Borders::ALL).title(format!(
        " Watch History ({}/{}) ",
        app.watch_entries.len(),
        app.watch_history.capacity()
    ));
    let inner = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    if app.watch_entries.is_empty() {
        render_center_message(
            f,
            inner,
            vec![
                Line::raw("No watch history"),
                Line::styled(
                    "Videos you watch will appear here",
                    Style::default().fg(pal.dim),
                ),
            ],
        );
    } else {
        render_video_list(
            f,
            inner,
            &app.watch_entries,
            app.history_selected,
            None,
            &pal,
        );
    }

    status::render(f, app, chunks[1]);
}

// ============================================================================
// Detail View
// ============================================================================

fn render_detail(f: &mut Frame, app: &mut App) {
    let pal = palette(&app.config.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[0]);

    let detail_block = Block::default().borders(Borders::ALL).title(" Video ");
    let detail_inner = detail_block.inner(cols[0]);
    f.render_widget(detail_block, cols[0]);

    if let Some(id) = &app.detail_loading {
        render_center_message(
            f,
            detail_inner,
            vec![Line::styled(
                format!("Loading video {}...", id),
                Style::default().fg(pal.dim),
            )],
        );
    } else if let Some(err) = &app.detail_error {
        render_center_message(
            f,
            detail_inner,
            vec![
                Line::styled("Error loading video", Style::default().fg(pal.error)),
                Line::raw(err.clone()),
                Line::styled("press Esc to go back", Style::default().fg(pal.dim)),
            ],
        );
    } else if let Some(detail) = &app.detail {
        let video = &detail.video;
        let now = Utc::now();
        let mut stats = format!("{} views", format_compact_count(video.view_count));
        if let Some(likes) = video.like_count {
            stats.push_str(&format!(" · {} likes", format_compact_count(likes)));
        }
        stats.push_str(&format!(" · {}", relative_time(&video.published_at, now)));

        let mut lines = vec![
            Line::styled(
                video.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Line::styled(video.channel_title.clone(), Style::default().fg(pal.accent)),
            Line::styled(stats, Style::default().fg(pal.dim)),
            Line::raw(""),
        ];
        for desc_line in video.description.lines() {
            lines.push(Line::raw(desc_line.to_string()));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        f.render_widget(paragraph, detail_inner);
    }

    let related_block = Block::default().borders(Borders::ALL).title(" Related ");
    let related_inner = related_block.inner(cols[1]);
    f.render_widget(related_block, cols[1]);

    match &app.detail {
        Some(detail) if !detail.related.is_empty() => {
            render_video_list(
                f,
                related_inner,
                &detail.related,
                detail.selected_related,
                None,
                &pal,
            );
        }
        Some(_) => {
            render_center_message(
                f,
                related_inner,
                vec![Line::styled(
                    "No related videos",
                    Style::default().fg(pal.dim),
                )],
            );
        }
        None => {}
    }

    status::render(f, app, chunks[1]);
}

// ============================================================================
// Search Overlay
// ============================================================================

fn render_search_overlay(f: &mut Frame, app: &App) {
    let pal = palette(&app.config.theme);
    let area = f.area();

    let width = area.width.saturating_sub(4).min(70);
    let height = (3 + app.search_history_entries.len() as u16).min(area.height.saturating_sub(4));
    let overlay = Rect {
        x: (area.width.saturating_sub(width)) / 2,
        y: 2,
        width,
        height,
    };

    f.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Search ")
        .title_bottom(" Enter search · ↑/↓ history · Del remove · ^L clear ");
    let inner = block.inner(overlay);
    f.render_widget(block, overlay);

    let mut lines = vec![Line::from(vec![
        Span::styled("> ", Style::default().fg(pal.accent)),
        Span::raw(app.search.input.clone()),
        Span::styled("█", Style::default().fg(pal.accent)),
    ])];

    for (i, term) in app.search_history_entries.iter().enumerate() {
        let style = if app.search.history_selected == Some(i) {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(pal.dim)
        };
        lines.push(Line::styled(format!("  {}", term), style));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

// ============================================================================
// Shared Widgets
// ============================================================================

/// One row per video: title, channel, relative publish time.
fn video_row<'a>(
    video: &VideoSummary,
    selected: bool,
    width: u16,
    now: chrono::DateTime<Utc>,
    pal: &Palette,
) -> Line<'a> {
    let width = width as usize;
    let meta = format!(
        "  {} · {}",
        video.channel_title,
        relative_time(&video.published_at, now)
    );
    let title_budget = width.saturating_sub(meta.len() + 2).max(16);
    let title = truncate_to_width(&video.title, title_budget).into_owned();

    let marker = if selected { "▸ " } else { "  " };
    let title_style = if selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::styled(marker.to_string(), Style::default().fg(pal.accent)),
        Span::styled(title, title_style),
        Span::styled(meta, Style::default().fg(pal.dim)),
    ])
}

/// Render a scrolling window of video rows with an optional tail marker.
fn render_video_list(
    f: &mut Frame,
    area: Rect,
    videos: &[VideoSummary],
    selected: usize,
    tail: Option<Line<'_>>,
    pal: &Palette,
) {
    let rows = area.height as usize;
    if rows == 0 {
        return;
    }

    let now = Utc::now();
    let len = videos.len();

    // Let the window slide one further so the tail marker is reachable when
    // the cursor sits on the last video.
    let cursor = if tail.is_some() && selected + 1 == len {
        selected + 1
    } else {
        selected
    };
    let offset = window_offset(cursor, rows);

    let mut lines: Vec<Line> = Vec::with_capacity(rows);
    for (i, video) in videos.iter().enumerate().skip(offset).take(rows) {
        lines.push(video_row(video, i == selected, area.width, now, pal));
    }
    if lines.len() < rows {
        if let Some(tail) = tail {
            lines.push(tail);
        }
    }

    f.render_widget(Paragraph::new(lines), area);
}

/// Loading placeholder rows, the terminal cousin of shimmer cards.
fn render_shimmer(f: &mut Frame, area: Rect) {
    let rows = area.height as usize;
    let bar = "░".repeat((area.width as usize).saturating_sub(4).min(56));
    let lines: Vec<Line> = (0..rows)
        .map(|i| {
            if i % 2 == 0 {
                Line::styled(format!("  {}", bar), Style::default().fg(Color::DarkGray))
            } else {
                Line::raw("")
            }
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn render_center_message(f: &mut Frame, area: Rect, lines: Vec<Line>) {
    let top_pad = (area.height as usize).saturating_sub(lines.len()) / 2;
    let mut padded: Vec<Line> = (0..top_pad).map(|_| Line::raw("")).collect();
    padded.extend(lines);
    let paragraph = Paragraph::new(padded).alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}
