//! Keyboard input handling.
//!
//! Dispatches on the active view. The search input overlay captures all
//! keystrokes while it is open.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::{App, AppEvent, View};
use crate::feed::{Category, FeedPhase, FeedQuery};

use super::loop_runner::{open_detail, spawn_search, Action};

/// Maximum allowed search query length (UI layer validation)
const MAX_SEARCH_LENGTH: usize = 256;

pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.search.editing {
        return handle_search_editing(app, code, modifiers, event_tx).await;
    }

    // Global keys
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('/') => {
            app.search.editing = true;
            app.search.input.clear();
            app.search.history_selected = None;
            return Ok(Action::Continue);
        }
        KeyCode::Char('h') if app.view != View::Detail => {
            // Re-read the store on entry; another surface may have written
            // to it since the cache was last refreshed.
            app.watch_entries = app.watch_history.load().await?;
            app.history_selected = 0;
            app.view = View::History;
            return Ok(Action::Continue);
        }
        _ => {}
    }

    match app.view {
        View::Feed => handle_feed_keys(app, code, event_tx).await,
        View::Search => handle_search_results_keys(app, code, event_tx).await,
        View::History => handle_history_keys(app, code, event_tx).await,
        View::Detail => handle_detail_keys(app, code, event_tx).await,
    }
}

// ============================================================================
// Feed View
// ============================================================================

async fn handle_feed_keys(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let len = app.feed.items().len();

    match code {
        KeyCode::Down | KeyCode::Char('j') => {
            if len > 0 && app.feed_selected + 1 < len {
                app.feed_selected += 1;
            }
            app.poll_sentinel();
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.feed_selected = app.feed_selected.saturating_sub(1);
            app.poll_sentinel();
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.feed_selected = 0;
            app.poll_sentinel();
        }
        KeyCode::Char('G') | KeyCode::End => {
            if len > 0 {
                app.feed_selected = len - 1;
            }
            app.poll_sentinel();
        }
        KeyCode::Right | KeyCode::Tab => cycle_category(app, 1),
        KeyCode::Left | KeyCode::BackTab => cycle_category(app, -1),
        KeyCode::Char(c @ '1'..='7') => {
            let idx = (c as usize) - ('1' as usize);
            set_category(app, Category::ALL[idx]);
        }
        KeyCode::Enter => {
            if let Some(summary) = app.feed.items().get(app.feed_selected).cloned() {
                open_detail(app, summary, event_tx).await;
            }
        }
        KeyCode::Char('o') => open_selected_in_browser(app),
        KeyCode::Char('r') => {
            if app.feed.phase() == FeedPhase::Error {
                app.feed.retry();
            }
        }
        _ => {}
    }

    Ok(Action::Continue)
}

fn cycle_category(app: &mut App, step: isize) {
    let current = app.feed.query().category;
    let n = Category::ALL.len() as isize;
    let idx = Category::ALL.iter().position(|c| *c == current).unwrap_or(0) as isize;
    let next = (idx + step).rem_euclid(n) as usize;
    set_category(app, Category::ALL[next]);
}

fn set_category(app: &mut App, category: Category) {
    if app.feed.query().category == category {
        return;
    }

    app.feed.set_query(FeedQuery::new(category));
    app.feed_selected = 0;
    // Fresh observation for the new query's sentinel
    app.trigger.attach();
}

// ============================================================================
// Search Input Overlay
// ============================================================================

async fn handle_search_editing(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Esc => {
            app.search.editing = false;
            app.search.history_selected = None;
        }
        KeyCode::Enter => {
            let query = match app.search.history_selected {
                Some(i) => app
                    .search_history_entries
                    .get(i)
                    .cloned()
                    .unwrap_or_default(),
                None => app.search.input.trim().to_string(),
            };
            if query.is_empty() {
                return Ok(Action::Continue);
            }
            if query.len() > MAX_SEARCH_LENGTH {
                app.set_status(format!(
                    "Search query too long (max {} chars)",
                    MAX_SEARCH_LENGTH
                ));
                return Ok(Action::Continue);
            }
            submit_search(app, query, event_tx).await?;
        }
        KeyCode::Backspace => {
            app.search.input.pop();
            app.search.history_selected = None;
        }
        KeyCode::Down => {
            let n = app.search_history_entries.len();
            if n > 0 {
                app.search.history_selected = Some(match app.search.history_selected {
                    Some(i) if i + 1 < n => i + 1,
                    Some(i) => i,
                    None => 0,
                });
            }
        }
        KeyCode::Up => {
            app.search.history_selected = match app.search.history_selected {
                Some(0) | None => None,
                Some(i) => Some(i - 1),
            };
        }
        KeyCode::Delete => {
            if let Some(i) = app.search.history_selected {
                if let Some(term) = app.search_history_entries.get(i).cloned() {
                    app.search_history_entries = app.search_history.remove(&term).await?;
                    let n = app.search_history_entries.len();
                    app.search.history_selected = if n == 0 {
                        None
                    } else {
                        Some(i.min(n - 1))
                    };
                }
            }
        }
        KeyCode::Char('l') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_history.clear().await?;
            app.search_history_entries.clear();
            app.search.history_selected = None;
            app.set_status("Search history cleared");
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.search.input.push(c);
            app.search.history_selected = None;
        }
        _ => {}
    }

    Ok(Action::Continue)
}

async fn submit_search(
    app: &mut App,
    query: String,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<()> {
    // The trimmed term is both the dedup key and the stored payload.
    app.search_history_entries = app.search_history.insert(&query, query.clone()).await?;

    app.search.editing = false;
    app.search.history_selected = None;
    app.search.input = query.clone();
    app.view = View::Search;

    spawn_search(app, query, event_tx);
    Ok(())
}

// ============================================================================
// Search Results View
// ============================================================================

async fn handle_search_results_keys(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let len = app.search.results.len();

    match code {
        KeyCode::Down | KeyCode::Char('j') => {
            if len > 0 && app.search.selected + 1 < len {
                app.search.selected += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.search.selected = app.search.selected.saturating_sub(1);
        }
        KeyCode::Enter => {
            if let Some(summary) = app.search.results.get(app.search.selected).cloned() {
                open_detail(app, summary, event_tx).await;
            }
        }
        KeyCode::Char('o') => open_selected_in_browser(app),
        KeyCode::Esc => app.view = View::Feed,
        _ => {}
    }

    Ok(Action::Continue)
}

// ============================================================================
// Watch History View
// ============================================================================

async fn handle_history_keys(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let len = app.watch_entries.len();

    match code {
        KeyCode::Down | KeyCode::Char('j') => {
            if len > 0 && app.history_selected + 1 < len {
                app.history_selected += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.history_selected = app.history_selected.saturating_sub(1);
        }
        KeyCode::Enter => {
            // Re-watching moves the entry to the front via the store's dedup
            if let Some(summary) = app.watch_entries.get(app.history_selected).cloned() {
                open_detail(app, summary, event_tx).await;
            }
        }
        KeyCode::Char('x') | KeyCode::Delete => {
            if let Some(entry) = app.watch_entries.get(app.history_selected) {
                let id = entry.id.clone();
                app.watch_entries = app.watch_history.remove(&id).await?;
                let n = app.watch_entries.len();
                if n > 0 && app.history_selected >= n {
                    app.history_selected = n - 1;
                }
            }
        }
        KeyCode::Char('C') => {
            app.watch_history.clear().await?;
            app.watch_entries.clear();
            app.history_selected = 0;
            app.set_status("Watch history cleared");
        }
        KeyCode::Char('o') => open_selected_in_browser(app),
        KeyCode::Esc => app.view = View::Feed,
        _ => {}
    }

    Ok(Action::Continue)
}

// ============================================================================
// Detail View
// ============================================================================

async fn handle_detail_keys(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Esc | KeyCode::Backspace => {
            app.view = app.detail_return;
            app.detail_error = None;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if let Some(detail) = app.detail.as_mut() {
                if !detail.related.is_empty()
                    && detail.selected_related + 1 < detail.related.len()
                {
                    detail.selected_related += 1;
                }
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            if let Some(detail) = app.detail.as_mut() {
                detail.selected_related = detail.selected_related.saturating_sub(1);
            }
        }
        KeyCode::Enter => {
            let related = app
                .detail
                .as_ref()
                .and_then(|d| d.related.get(d.selected_related).cloned());
            if let Some(summary) = related {
                open_detail(app, summary, event_tx).await;
            }
        }
        KeyCode::Char('o') => {
            let id = app.detail.as_ref().map(|d| d.video.id.clone());
            if let Some(id) = id {
                open_in_browser(app, &id);
            }
        }
        _ => {}
    }

    Ok(Action::Continue)
}

// ============================================================================
// Browser
// ============================================================================

fn open_selected_in_browser(app: &mut App) {
    let id = app.selected_summary().map(|s| s.id.clone());
    if let Some(id) = id {
        open_in_browser(app, &id);
    }
}

fn open_in_browser(app: &mut App, video_id: &str) {
    let url = app.watch_url(video_id);
    if let Err(e) = open::that(&url) {
        tracing::warn!(url = %url, error = %e, "Failed to open browser");
        app.set_status(format!("Failed to open browser: {}", e));
    } else {
        app.set_status("Opened in browser");
    }
}
