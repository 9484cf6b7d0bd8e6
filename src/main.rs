// ============================================================================
// CAC40 Sentiment Dashboard
// ============================================================================
// Tableau de bord TUI : cartes des valeurs du CAC40 avec sparklines, vue
// détail avec historique, prévisions, sentiment, corrélation et articles
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements, résultats et rendering
// 3. Worker thread : runtime tokio dédié, une tâche par commande
// 4. Channels mpsc : commandes vers le worker, résultats vers l'UI
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use cac40_dashboard::api::{ApiClient, Fixtures};
use cac40_dashboard::app::{App, Generation};
use cac40_dashboard::config::Config;
use cac40_dashboard::loader::{Loader, StockDetail};
use cac40_dashboard::models::{Instrument, LatestPrices};
use cac40_dashboard::ui::events::{
    article_slot_from_event, get_char_from_event, is_backspace_event, is_down_event,
    is_enter_event, is_escape_event, is_open_event, is_performance_event, is_period_event,
    is_quit_event, is_reset_event, is_search_char_event, is_search_event, is_sector_event,
    is_up_event,
};
use cac40_dashboard::ui::{render, Event, EventHandler};

// ============================================================================
// AppCommand / AppResult : protocole du worker thread
// ============================================================================
// Chaque commande porte le jeton de génération émis par App ; le résultat
// le renvoie tel quel pour que l'UI puisse écarter les réponses obsolètes.
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Dernières cotations de toutes les valeurs
    LoadLatest { period_days: u32, token: Generation },

    /// Sparkline d'une carte
    LoadSparkline {
        name: &'static str,
        period_days: u32,
        token: Generation,
    },

    /// Vue détail d'une valeur
    LoadDetail {
        instrument: &'static Instrument,
        period_days: u32,
        token: Generation,
    },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    LatestLoaded {
        token: Generation,
        prices: Option<LatestPrices>,
    },

    SparklineLoaded {
        name: &'static str,
        token: Generation,
        prices: Vec<f64>,
        synthetic: bool,
    },

    /// Err : message de l'alerte à afficher
    DetailLoaded {
        token: Generation,
        result: Result<StockDetail, String>,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois la TUI lancée : on log vers un
// fichier, avec rotation quotidienne.
// ============================================================================

/// Répertoire des logs : CAC40_LOG_DIR, sinon le répertoire de données
/// local de l'utilisateur, sinon ./logs
///
/// - Linux : ~/.local/share/cac40-dashboard/logs
/// - macOS : ~/Library/Application Support/cac40-dashboard/logs
/// - Windows : C:\Users\<user>\AppData\Local\cac40-dashboard\logs
fn log_directory(config: &Config) -> PathBuf {
    config
        .log_dir
        .clone()
        .or_else(|| dirs::data_local_dir().map(|d| d.join("cac40-dashboard").join("logs")))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/cac40-dashboard/logs/cac40-dashboard.log.*
/// RUST_LOG=cac40_dashboard=trace cargo run
/// ```
fn init_logging(config: &Config) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_directory(config);
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "cac40-dashboard.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour le dashboard, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cac40_dashboard=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let (config, rejected) = Config::from_env();

    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    for setting in &rejected {
        warn!(key = setting.key, value = %setting.value, "Invalid setting, using default");
    }

    info!(
        api = %config.api_base_url,
        fixtures = %config.fixtures_dir.display(),
        period_days = config.period_days,
        "CAC40 dashboard starting up"
    );

    let fixtures = Arc::new(Fixtures::load(&config.fixtures_dir));
    let client = ApiClient::new(&config)?;
    let loader = Loader::new(client, fixtures.clone());

    // Le runtime est créé ici pour que son échec remonte proprement
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    let worker = spawn_background_worker(runtime, loader, command_rx, result_tx);

    let mut app = App::new(config.period_days);
    request_dashboard_data(&mut app, &command_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &fixtures, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    // command_tx a été consommé par run() : le worker sort de sa boucle
    if worker.join().is_err() {
        error!("Worker thread panicked");
    }

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : runtime.spawn plutôt que block_on
// - Le thread ne fait que recevoir des commandes et lancer des tâches
// - Les 36 sparklines se chargent en parallèle, sans ordre garanti
// - Chaque tâche envoie son résultat sur son propre clone de result_tx
// ============================================================================

/// Worker thread qui exécute les chargements en arrière-plan
fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    loader: Loader,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            debug!(?command, "Worker received command");

            let loader = loader.clone();
            let result_tx = result_tx.clone();
            runtime.spawn(async move {
                let result = execute(&loader, command).await;
                if result_tx.send(result).is_err() {
                    debug!("Result channel closed, dropping result");
                }
            });
        }

        info!("Worker thread exiting (channel closed)");
    })
}

/// Exécute une commande et construit son résultat
async fn execute(loader: &Loader, command: AppCommand) -> AppResult {
    match command {
        AppCommand::LoadLatest { period_days, token } => AppResult::LatestLoaded {
            token,
            prices: loader.load_latest(period_days).await,
        },

        AppCommand::LoadSparkline { name, period_days, token } => {
            let (prices, synthetic) = loader.load_sparkline(name, period_days).await;
            AppResult::SparklineLoaded {
                name,
                token,
                prices,
                synthetic,
            }
        }

        AppCommand::LoadDetail { instrument, period_days, token } => {
            let result = loader.load_detail(instrument, period_days).await.map_err(|e| {
                error!(stock = instrument.name, error = ?e, "Failed to load detail view");
                format!(
                    "Impossible de charger les données de {} : {}",
                    instrument.name,
                    e.root_cause()
                )
            });
            AppResult::DetailLoaded { token, result }
        }
    }
}

/// Demande les cotations et toutes les sparklines pour la période courante
fn request_dashboard_data(app: &mut App, command_tx: &mpsc::Sender<AppCommand>) {
    let period_days = app.period_days;
    send(command_tx, AppCommand::LoadLatest {
        period_days,
        token: app.start_latest_load(),
    });

    let names: Vec<&'static str> = app.cards.iter().map(|c| c.instrument.name).collect();
    for name in names {
        let token = app.requests.start_card(name);
        send(command_tx, AppCommand::LoadSparkline { name, period_days, token });
    }
}

fn send(command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    if command_tx.send(command).is_err() {
        error!("Worker thread disconnected, command dropped");
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   1. Appliquer tous les résultats disponibles du worker
//   2. Dessiner l'interface
//   3. Attendre un événement (au plus 250 ms)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    fixtures: &Fixtures,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    while app.is_running() {
        // ========================================
        // 1. RÉSULTATS
        // ========================================
        while worker_alive {
            match result_rx.try_recv() {
                Ok(result) => apply_result(app, result, fixtures),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    worker_alive = false;
                }
            }
        }

        // ========================================
        // 2. RENDER
        // ========================================
        let view: &App = app;
        terminal.draw(|frame| render(frame, view))?;

        // ========================================
        // 3. INPUT
        // ========================================
        match events.next() {
            Ok(event) => handle_event(app, event, &command_tx),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Applique un résultat du worker à l'état
fn apply_result(app: &mut App, result: AppResult, fixtures: &Fixtures) {
    match result {
        AppResult::LatestLoaded { token, prices } => {
            let available = prices.is_some();
            if app.apply_latest(token, prices, fixtures) {
                info!(available, visible = app.visible.len(), "Latest prices applied");
            }
        }
        AppResult::SparklineLoaded { name, token, prices, synthetic } => {
            if app.apply_sparkline(name, token, prices, synthetic) && synthetic {
                debug!(stock = name, "Synthetic sparkline applied");
            }
        }
        AppResult::DetailLoaded { token, result } => {
            if app.apply_detail(token, result) {
                debug!("Detail view result applied");
            }
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// Ordre de priorité : alerte (bloquante), saisie de la recherche, quit,
/// puis les raccourcis de l'écran courant.
fn handle_event(app: &mut App, event: Event, command_tx: &mpsc::Sender<AppCommand>) {
    if matches!(event, Event::Tick) {
        return;
    }

    // Toute touche autre que 'q' annule la confirmation de quit
    if !is_quit_event(&event) || app.is_in_search_mode() {
        app.cancel_quit();
    }

    // ========================================
    // Alerte : seul ESC la ferme
    // ========================================
    if app.has_alert() {
        if is_escape_event(&event) {
            debug!("User dismissed alert");
            app.dismiss_alert();
        }
        return;
    }

    // ========================================
    // Mode recherche
    // ========================================
    if app.is_in_search_mode() {
        if is_escape_event(&event) {
            info!("User cleared search");
            app.cancel_search();
        } else if is_enter_event(&event) {
            info!(search = %app.criteria.search, "User submitted search");
            app.submit_search();
        } else if is_backspace_event(&event) {
            app.backspace();
        } else if is_search_char_event(&event) {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }
        return;
    }

    // ========================================
    // Quit two-step
    // ========================================
    if is_quit_event(&event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return;
    }

    if app.is_on_detail() {
        handle_detail_event(app, &event);
        return;
    }

    // ========================================
    // Dashboard
    // ========================================
    if is_up_event(&event) {
        app.navigate_up();
    } else if is_down_event(&event) {
        app.navigate_down();
    } else if is_enter_event(&event) {
        if let Some((instrument, token)) = app.open_detail() {
            info!(stock = instrument.name, "User opened detail view");
            let period_days = app.period_days;
            send(command_tx, AppCommand::LoadDetail { instrument, period_days, token });
        }
    } else if is_search_event(&event) {
        app.start_search();
    } else if is_sector_event(&event) {
        app.cycle_sector();
        info!(sector = ?app.criteria.sector, "User changed sector filter");
    } else if is_performance_event(&event) {
        app.cycle_performance();
        info!(performance = ?app.criteria.performance, "User changed performance filter");
    } else if is_period_event(&event) {
        let period_days = app.next_period();
        info!(period_days, "User changed period");
        request_dashboard_data(app, command_tx);
    } else if is_reset_event(&event) {
        info!("User reset filters");
        app.reset_filters();
    }
}

/// Raccourcis de la vue détail
fn handle_detail_event(app: &mut App, event: &Event) {
    if is_escape_event(event) {
        debug!("User returned to dashboard");
        app.close_detail();
    } else if let Some(slot) = article_slot_from_event(event) {
        app.select_article(slot);
    } else if is_open_event(event) {
        let Some(url) = app.selected_article_url().map(str::to_string) else {
            debug!(slot = ?app.selected_article, "Selected article has no URL");
            return;
        };
        info!(%url, "Opening article in browser");
        if let Err(e) = open_in_browser(&url) {
            warn!(error = ?e, "Failed to open browser");
            app.raise_alert(format!("Impossible d'ouvrir le navigateur : {}", e));
        }
    }
}

/// Ouvre une URL http(s) dans le navigateur du système
fn open_in_browser(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url).with_context(|| format!("URL invalide : {}", url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Schéma non supporté : {}", parsed.scheme());
    }

    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };

    command
        .arg(parsed.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Échec du lancement du navigateur")?;
    Ok(())
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
