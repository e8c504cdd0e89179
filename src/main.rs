// ============================================================================
// Finboard - Tableau de bord de widgets financiers
// ============================================================================
// Programme TUI : chaque widget interroge périodiquement une API financière,
// normalise la réponse et l'affiche (tableau, JSON/graphique ou carte).
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements et rendering
// 3. Runtime tokio en arrière-plan : les cycles de fetch tournent sur le
//    runtime pendant que la boucle UI reste synchrone
// 4. RAII : les tâches de fetch sont annulées quand le superviseur les drop
// ============================================================================

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info};

use finboard::api::HttpClient;
use finboard::app::App;
use finboard::config::Settings;
use finboard::cycle::{CycleSupervisor, RefreshMode};
use finboard::store::WidgetStore;
use finboard::ui::{events::EventHandler, render};

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne.
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans `<log_dir>/finboard.log.<date>`.
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/finboard/logs/finboard.log.*
/// RUST_LOG=finboard=trace cargo run
/// ```
fn init_logging(settings: &Settings) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(&settings.log_dir)
        .context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &settings.log_dir, "finboard.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true) // Les cycles tournent sur le runtime tokio
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_new(&settings.log_filter)
                .unwrap_or_else(|_| finboard::config::DEFAULT_LOG_FILTER.into()),
        )
        .init();

    info!(log_dir = %settings.log_dir.display(), "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let settings = Settings::from_env();

    init_logging(&settings).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });
    info!(version = env!("CARGO_PKG_VERSION"), "Finboard starting up");

    // Un seul worker : les cycles sont coopératifs, un fetch en attente ne
    // bloque que son propre widget
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Échec de la création du runtime tokio")?;

    let store = WidgetStore::open(settings.store_path());
    let client = HttpClient::new(&settings.user_agent)?;
    let mut supervisor = CycleSupervisor::new(runtime.handle().clone(), store.clone(), Arc::new(client));
    let mut app = App::new(store);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();
    info!(widgets = app.widgets.len(), "Starting event loop");
    let result = run(&mut terminal, &mut app, &mut supervisor, &events);

    // Annule tous les timers avant de quitter
    supervisor.shutdown();

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }
    result
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   1. SYNC : aligne les cycles de fetch sur le store, transmet les refresh
//   2. RENDER : dessine l'interface
//   3. INPUT : traite les événements
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    supervisor: &mut CycleSupervisor,
    events: &EventHandler,
) -> Result<()> {
    while app.is_running() {
        // 1. SYNC
        let restarted = supervisor.sync();
        if restarted > 0 {
            debug!(restarted, "Widget cycles synced");
        }
        for (id, mode) in app.take_refresh_requests() {
            if !supervisor.refresh(&id, mode) {
                debug!(widget = %id, "Refresh requested for a widget without cycle");
            }
        }
        app.refresh_snapshot(supervisor.statuses());

        // 2. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 3. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event),
            Err(e) => error!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
fn handle_event(app: &mut App, event: finboard::ui::events::Event) {
    use finboard::ui::events::{
        get_char_from_event, is_add_event, is_backspace_event, is_delete_event, is_down_event,
        is_edit_event, is_enter_event, is_escape_event, is_force_refresh_event, is_move_down_event,
        is_move_up_event, is_next_choice_event, is_next_field_event, is_previous_choice_event,
        is_previous_field_event, is_quit_event, is_refresh_event, is_theme_event, is_up_event, Event,
    };

    // ========================================
    // Formulaire : capture toutes les touches
    // ========================================
    if app.is_in_form() {
        if is_escape_event(&event) {
            info!("User cancelled widget form");
            app.cancel_form();
        } else if is_enter_event(&event) {
            if app.submit_form() {
                info!("Widget form saved");
            }
        } else if let Some(form) = app.form.as_mut() {
            if is_next_field_event(&event) {
                form.focus_next();
            } else if is_previous_field_event(&event) {
                form.focus_previous();
            } else if is_next_choice_event(&event) {
                form.cycle_choice(true);
            } else if is_previous_choice_event(&event) {
                form.cycle_choice(false);
            } else if is_backspace_event(&event) {
                form.backspace();
            } else if let Some(c) = get_char_from_event(&event) {
                form.push_char(c);
            }
        }
        return;
    }

    // ========================================
    // Dashboard
    // ========================================
    match event {
        Event::Key(_) if is_quit_event(&event) => {
            app.cancel_delete();
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        Event::Key(_) if is_delete_event(&event) => {
            app.cancel_quit();
            if app.selected_widget().is_some() {
                if app.is_awaiting_delete_confirmation() {
                    let name = app.selected_widget().map(|w| w.config.name.clone()).unwrap_or_default();
                    info!(widget = %name, "User confirmed delete");
                    app.delete_selected();
                } else {
                    info!("User requested delete (awaiting confirmation)");
                    app.request_delete();
                }
            }
        }

        Event::Key(_) => {
            // Toute autre touche annule les confirmations en cours
            app.cancel_quit();
            app.cancel_delete();

            if is_up_event(&event) {
                app.navigate_up();
            } else if is_down_event(&event) {
                app.navigate_down();
            } else if is_move_up_event(&event) {
                app.move_selected(-1);
            } else if is_move_down_event(&event) {
                app.move_selected(1);
            } else if is_add_event(&event) {
                info!("User opened add form");
                app.open_add_form();
            } else if is_edit_event(&event) {
                info!("User opened edit form");
                app.open_edit_form();
            } else if is_force_refresh_event(&event) {
                app.request_refresh(RefreshMode::Force);
            } else if is_refresh_event(&event) {
                app.request_refresh(RefreshMode::IfStale);
            } else if is_theme_event(&event) {
                app.toggle_theme();
            }
        }

        Event::Tick | Event::Error => {}
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
///
/// Appelé dans main() même en cas d'erreur de la boucle.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
