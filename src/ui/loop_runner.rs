//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, feed-page completions, other background-task
//! completions, and a periodic tick over `tokio::select!`.

use crate::app::{App, AppEvent, DetailState, View, RELATED_PAGE_SIZE, SEARCH_PAGE_SIZE};
use crate::catalog::VideoSummary;
use crate::feed::{FeedEvent, FeedPhase};
use anyhow::Result;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::input::handle_input;
use super::render::render;

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Runs the TUI application event loop.
///
/// # Panic Safety
///
/// Installs a panic hook that restores terminal state before unwinding,
/// ensuring the terminal is not left in raw mode on panic.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
    mut feed_rx: mpsc::Receiver<FeedEvent>,
) -> Result<()> {
    // Install panic hook BEFORE setting up terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    // Signal handlers for graceful shutdown (Unix only)
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        // Drain pending completions before handling more input so a burst of
        // keystrokes cannot starve page applications.
        while let Ok(event) = feed_rx.try_recv() {
            app.needs_redraw = true;
            handle_feed_event(app, event);
        }
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event).await;
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;  // Process in order listed for predictable behavior

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    app.needs_redraw = true;
                    match handle_input(app, key.code, key.modifiers, &event_tx).await {
                        Ok(Action::Quit) => break,
                        Ok(Action::Continue) => {}
                        Err(e) => app.set_status(format!("Error: {}", e)),
                    }
                }
            }

            Some(event) = feed_rx.recv() => {
                app.needs_redraw = true;
                handle_feed_event(app, event);
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event).await;
            }

            // Periodic tick for status expiry
            _ = tick_interval.tick() => {}
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

/// Apply a feed-page completion and keep the scroll going.
fn handle_feed_event(app: &mut App, event: FeedEvent) {
    app.feed.handle(event);

    if app.feed.phase() == FeedPhase::Idle {
        let len = app.feed.items().len();
        if len > 0 && app.feed_selected >= len {
            app.feed_selected = len - 1;
        }
        // A short page can leave the sentinel on screen with no further
        // scroll event to sample it; re-arm and sample once here.
        app.trigger.rearm();
        app.poll_sentinel();
    }
}

/// Handle completion events from spawned background tasks.
async fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::SearchCompleted {
            generation,
            query,
            result,
        } => {
            if generation != app.search.generation {
                tracing::debug!(query = %query, "Discarding search results for a replaced query");
                return;
            }
            app.search.loading = false;
            match result {
                Ok(page) => {
                    app.search.results = page.items;
                    app.search.selected = 0;
                    app.search.error = None;
                }
                Err(e) => {
                    app.search.error = Some(e.to_string());
                }
            }
        }

        AppEvent::DetailLoaded {
            generation,
            summary,
            result,
        } => {
            if generation != app.detail_generation {
                tracing::debug!(video_id = %summary.id, "Discarding detail for a superseded open");
                return;
            }
            app.detail_loading = None;
            match result {
                Ok((video, related)) => {
                    app.detail_cache
                        .put(video.id.clone(), (video.clone(), related.clone()));
                    record_watch(app, &summary).await;
                    app.detail = Some(DetailState {
                        video,
                        related,
                        selected_related: 0,
                    });
                    app.detail_error = None;
                }
                Err(e) => {
                    app.detail_error = Some(e.to_string());
                }
            }
        }
    }
}

/// Insert the opened video into the watch-history store and refresh the
/// in-memory copy. Storage failures degrade to a status message; they never
/// block the detail view.
pub(super) async fn record_watch(app: &mut App, summary: &VideoSummary) {
    match app.watch_history.insert(&summary.id, summary.clone()).await {
        Ok(list) => app.watch_entries = list,
        Err(e) => {
            tracing::warn!(video_id = %summary.id, error = %e, "Failed to record watch history");
            app.set_status("Could not save watch history");
        }
    }
}

/// Spawn the one-shot search task for a submitted query.
///
/// The task sends results via `AppEvent::SearchCompleted` with a generation
/// counter so a slow earlier search cannot overwrite a newer one.
pub(super) fn spawn_search(app: &mut App, query: String, event_tx: &mpsc::Sender<AppEvent>) {
    app.search.generation = app.search.generation.wrapping_add(1);
    let generation = app.search.generation;
    app.search.loading = true;
    app.search.error = None;
    app.search.results.clear();
    app.search.selected = 0;
    app.search.query = Some(query.clone());

    let client = Arc::clone(&app.client);
    let tx = event_tx.clone();

    tracing::debug!(query = %query, generation, "Spawning search task");

    tokio::spawn(async move {
        let result = client.search(&query, SEARCH_PAGE_SIZE, None).await;
        let event = AppEvent::SearchCompleted {
            generation,
            query,
            result,
        };
        if tx.send(event).await.is_err() {
            tracing::debug!("Event receiver dropped, discarding search results");
        }
    });
}

/// Open the detail view for a video, fetching detail + related unless the
/// session cache already has them. Opening counts as a watch either way.
pub(super) async fn open_detail(
    app: &mut App,
    summary: VideoSummary,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    if app.view != View::Detail {
        app.detail_return = app.view;
    }

    if let Some((video, related)) = app.detail_cache.get(&summary.id) {
        let video = video.clone();
        let related = related.clone();
        record_watch(app, &summary).await;
        app.detail = Some(DetailState {
            video,
            related,
            selected_related: 0,
        });
        app.detail_error = None;
        app.detail_loading = None;
        app.view = View::Detail;
        return;
    }

    app.detail_generation = app.detail_generation.wrapping_add(1);
    let generation = app.detail_generation;
    app.detail_loading = Some(summary.id.clone());
    app.detail_error = None;
    app.detail = None;
    app.view = View::Detail;

    let client = Arc::clone(&app.client);
    let tx = event_tx.clone();

    tracing::debug!(video_id = %summary.id, generation, "Spawning detail task");

    tokio::spawn(async move {
        let (detail_res, related_res) = tokio::join!(
            client.video_detail(&summary.id),
            client.related(&summary.id, RELATED_PAGE_SIZE),
        );

        // A failed related list degrades to an empty sidebar; only the
        // detail fetch itself decides success.
        let result = match detail_res {
            Ok(video) => {
                let related = related_res.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Related list fetch failed");
                    Vec::new()
                });
                Ok((video, related))
            }
            Err(e) => Err(e),
        };

        let event = AppEvent::DetailLoaded {
            generation,
            summary,
            result,
        };
        if tx.send(event).await.is_err() {
            tracing::debug!("Event receiver dropped, discarding detail");
        }
    });
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
