use mswp::app::App;
use mswp::cli::{AppConfig, Args};
use mswp::config::UserConfig;
use mswp::domain::deletion::{DeletionCoordinator, DryRunAuthority, StorageAuthority, TrashAuthority};
use mswp::domain::swipe::Direction;
use mswp::domain::triage::TriageEngine;
use mswp::keep_store::{JsonKeepStore, KeepStore, MemoryKeepStore};
use mswp::library::{FsMediaIndex, ROOT_FOLDER_ID};
use mswp::logging;
use mswp::tui::{
    card_area, card_width_units, handle_confirm_input, handle_key_event, main_layout,
    pointer_from_mouse, render, render_consent_overlay, render_details_overlay,
    render_failure_overlay, render_help_overlay, render_summary_overlay, render_welcome_overlay,
    KeyAction, Screen, ViewState,
};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::io;
use tracing::{error, info, warn};

/// Short enough for smooth card animations
const FRAME_POLL: Duration = Duration::from_millis(16);

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let mut user_config = UserConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load user config: {}", e);
        UserConfig::default()
    });
    let config = AppConfig::from_args(args, &user_config);

    let _log_guard = match logging::default_log_dir().map(|dir| logging::init(&dir)) {
        Some(Ok(guard)) => Some(guard),
        Some(Err(e)) => {
            eprintln!("Warning: Logging disabled: {}", e);
            None
        }
        None => None,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    info!(directory = %config.directory.display(), dry_run = config.dry_run, "Starting");

    if config.dry_run {
        let authority = DryRunAuthority::new(config.always_confirm);
        run_app_with_config(&config, &mut user_config, &runtime, authority)
    } else {
        let authority = TrashAuthority::new(config.always_confirm);
        run_app_with_config(&config, &mut user_config, &runtime, authority)
    }
}

/// Opens the persistent keep store, falling back to memory. The second
/// value is the persistent store, which must be flushed before shutdown.
fn open_keep_store(
    config: &AppConfig,
    runtime: &tokio::runtime::Runtime,
) -> (Arc<dyn KeepStore>, Option<Arc<JsonKeepStore>>) {
    if !config.persist_keeps {
        return (Arc::new(MemoryKeepStore::new()), None);
    }
    let Some(path) = JsonKeepStore::default_path() else {
        warn!("No data directory; keep decisions will not be remembered");
        return (Arc::new(MemoryKeepStore::new()), None);
    };
    match JsonKeepStore::open(&path, runtime.handle()) {
        Ok(store) => {
            let store = Arc::new(store);
            let shared: Arc<dyn KeepStore> = store.clone();
            (shared, Some(store))
        }
        Err(e) => {
            warn!(error = %e, "Keep store unavailable; keep decisions will not be remembered");
            (Arc::new(MemoryKeepStore::new()), None)
        }
    }
}

/// Runs the TUI application with configuration
fn run_app_with_config<A: StorageAuthority + 'static>(
    config: &AppConfig,
    user_config: &mut UserConfig,
    runtime: &tokio::runtime::Runtime,
    authority: A,
) -> io::Result<()> {
    let index = Arc::new(FsMediaIndex::new(&config.directory).with_hidden(config.show_hidden));
    let (keep_store, persistent_keeps) = open_keep_store(config, runtime);

    let mut engine = TriageEngine::new(index, keep_store)
        .with_denied_policy(config.denied_policy)
        .with_show_kept(config.show_kept)
        .with_sort_key(config.sort_key)
        .with_folder(config.folder.clone());
    let snapshot = engine.reload();

    if snapshot.active_len == 0 {
        println!(
            "No photos or videos to review in: {}",
            config.directory.display()
        );
        if !config.show_kept {
            println!("(Items kept in earlier sessions are hidden - try --show-kept)");
        }
        return Ok(());
    }

    let coordinator = DeletionCoordinator::new(authority);
    let mut app = App::new(engine, coordinator, runtime.handle().clone(), 0.0);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, config, user_config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if app.is_busy() {
        println!("Waiting for the deletion in progress to finish...");
        app.drain_background();
    }
    if let Some(store) = persistent_keeps {
        store.flush_blocking(runtime.handle());
    }

    user_config.sort_key = app.snapshot().sort_key;
    if let Err(e) = user_config.save() {
        warn!(error = %e, "Failed to save user config");
    }

    let stats = app.engine().statistics();
    let prefix = if config.dry_run { "[DRY RUN] " } else { "" };
    println!("\n{}Session complete", prefix);
    println!("   Kept:    {} items", stats.kept);
    println!(
        "   Deleted: {} items ({})",
        stats.deleted,
        mswp::domain::format_megabytes(stats.bytes_freed)
    );
    if stats.pending > 0 {
        println!("   Left in queue (not deleted): {} items", stats.pending);
    }

    result
}

/// Suspends the TUI terminal to allow external programs to run
fn suspend_terminal<B: ratatui::backend::Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Resumes the TUI terminal after external program exits
fn resume_terminal<B: ratatui::backend::Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
) -> io::Result<()> {
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen, EnableMouseCapture)?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(())
}

fn folder_label(config: &AppConfig, app_folder: Option<&mswp::domain::FolderId>) -> String {
    match app_folder {
        None => "All folders".to_string(),
        Some(id) if id.0 == ROOT_FOLDER_ID => config
            .directory
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(ROOT_FOLDER_ID)
            .to_string(),
        Some(id) => id.0.clone(),
    }
}

/// Main application loop
fn run_loop<B: ratatui::backend::Backend + std::io::Write, A: StorageAuthority + 'static>(
    terminal: &mut Terminal<B>,
    app: &mut App<A>,
    config: &AppConfig,
    user_config: &mut UserConfig,
) -> io::Result<()> {
    let mut view_state = if user_config.welcome_shown {
        ViewState::Browsing
    } else {
        ViewState::Welcome
    };
    let started = Instant::now();
    let mut card_rect = Rect::default();

    loop {
        let now = started.elapsed();
        app.tick(now);

        if let Some(locator) = app.take_open_request() {
            // Suspend terminal before opening external program
            suspend_terminal(terminal)?;
            let open_result = open::that(locator.as_path());
            resume_terminal(terminal)?;
            if let Err(e) = open_result {
                error!(path = %locator, error = %e, "Failed to open item");
            }
            continue;
        }

        let snapshot = app.snapshot().clone();
        let label = folder_label(config, snapshot.folder.as_ref());
        let screen = Screen {
            snapshot: &snapshot,
            card: app.card_view(now),
            statistics: app.engine().statistics(),
            folder_label: &label,
            dry_run: config.dry_run,
        };
        let details = app.showing_details();

        terminal.draw(|frame| {
            let [_, content, _] = main_layout(frame.area());
            card_rect = card_area(content);

            render(frame, &screen);

            // Render overlays
            match view_state {
                ViewState::Welcome => render_welcome_overlay(frame),
                ViewState::Help => render_help_overlay(frame),
                ViewState::Browsing => {
                    if snapshot.consent().is_some() {
                        render_consent_overlay(frame, snapshot.pending_len, snapshot.pending_bytes);
                    } else if let Some(failure) = snapshot.failure.as_deref() {
                        render_failure_overlay(frame, failure);
                    } else if let Some(summary) = snapshot.summary.as_deref() {
                        render_summary_overlay(frame, summary, &screen.statistics);
                    } else if details {
                        if let Some(front) = snapshot.front.as_ref() {
                            render_details_overlay(frame, front);
                        }
                    }
                }
            }
        })?;
        app.set_card_width(card_width_units(card_rect));

        if !event::poll(FRAME_POLL)? {
            continue;
        }

        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            Event::Mouse(mouse) if view_state == ViewState::Browsing => {
                if let Some(pointer) = pointer_from_mouse(mouse, card_rect, started.elapsed()) {
                    app.handle_pointer(pointer);
                }
                continue;
            }
            _ => continue,
        };

        // Handle overlay-specific input
        match view_state {
            ViewState::Welcome => {
                view_state = ViewState::Browsing;

                // Mark welcome as shown and persist
                user_config.welcome_shown = true;
                if let Err(e) = user_config.save() {
                    warn!(error = %e, "Failed to save user config");
                }
                continue;
            }
            ViewState::Help => {
                let action = handle_key_event(key);
                if matches!(action, KeyAction::Help | KeyAction::Quit | KeyAction::None) {
                    view_state = ViewState::Browsing;
                }
                continue;
            }
            ViewState::Browsing => {}
        }

        if snapshot.consent().is_some() {
            match handle_confirm_input(key) {
                KeyAction::Accept => app.resolve_consent(true),
                KeyAction::Decline => app.resolve_consent(false),
                _ => {}
            }
            continue;
        }
        if snapshot.failure.is_some() {
            app.dismiss_failure();
            continue;
        }
        if snapshot.summary.is_some() {
            app.acknowledge_summary();
            continue;
        }

        let now = started.elapsed();
        match handle_key_event(key) {
            KeyAction::Quit => {
                if app.is_busy() {
                    info!("Quitting while a deletion is still in flight");
                }
                break;
            }
            KeyAction::Keep => app.swipe(Direction::Right, now),
            KeyAction::Delete => app.swipe(Direction::Left, now),
            KeyAction::Confirm => app.confirm(),
            KeyAction::Undo => app.undo(),
            KeyAction::Sort => app.cycle_sort(),
            KeyAction::Folder => app.cycle_folder(),
            KeyAction::Open => {
                if let Some(front) = snapshot.front.as_ref() {
                    suspend_terminal(terminal)?;
                    let open_result = open::that(front.locator.as_path());
                    resume_terminal(terminal)?;
                    if let Err(e) = open_result {
                        error!(path = %front.locator, error = %e, "Failed to open item");
                    }
                }
            }
            KeyAction::Help => view_state = ViewState::Help,
            KeyAction::Accept | KeyAction::Decline | KeyAction::None => {}
        }
    }

    Ok(())
}
