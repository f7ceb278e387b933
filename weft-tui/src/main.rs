//! Weft entry point: CLI parsing, startup connection retries, the
//! rendering loop.

use clap::Parser;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use weft_provider::{ConnectionConfig, HttpProvider, Provider, TlsConfig};
use weft_tui::app::App;
use weft_tui::config::{config_path, log_path, TuiConfig};
use weft_tui::events::{Ctx, TuiEvent, UiSender};
use weft_tui::screens::connecting::draw_connecting;
use weft_tui::supervisor::spawn_supervisor;
use weft_tui::theme::init_theme;

const STARTUP_MAX_ATTEMPTS: u32 = 5;
const STARTUP_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const STARTUP_MAX_BACKOFF: Duration = Duration::from_secs(10);
const CONNECT_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "weft", about = "Terminal client for a workflow orchestration service")]
struct Cli {
    /// Server address (default localhost:7233).
    #[arg(long)]
    address: Option<String>,

    /// Namespace to open on startup (default "default").
    #[arg(long)]
    namespace: Option<String>,

    /// Named connection profile from the config file. Explicit
    /// --address/--namespace flags override the profile.
    #[arg(long)]
    profile: Option<String>,

    #[arg(long)]
    tls_cert: Option<String>,

    #[arg(long)]
    tls_key: Option<String>,

    #[arg(long)]
    tls_ca: Option<String>,

    #[arg(long)]
    tls_server_name: Option<String>,

    #[arg(long)]
    tls_skip_verify: bool,
}

impl Cli {
    fn connection_config(&self, config: &TuiConfig) -> Result<ConnectionConfig, String> {
        let profile = match &self.profile {
            Some(name) => Some(
                config
                    .profiles
                    .iter()
                    .find(|p| &p.name == name)
                    .ok_or_else(|| format!("unknown connection profile: {name}"))?,
            ),
            None => None,
        };

        let address = self
            .address
            .clone()
            .or_else(|| profile.map(|p| p.address.clone()))
            .unwrap_or_else(|| "localhost:7233".to_string());
        let namespace = self
            .namespace
            .clone()
            .or_else(|| profile.map(|p| p.namespace.clone()))
            .unwrap_or_else(|| "default".to_string());

        Ok(ConnectionConfig {
            address,
            namespace,
            tls: TlsConfig {
                cert_path: self.tls_cert.clone().unwrap_or_default(),
                key_path: self.tls_key.clone().unwrap_or_default(),
                ca_path: self.tls_ca.clone().unwrap_or_default(),
                server_name: self.tls_server_name.clone().unwrap_or_default(),
                skip_verify: self.tls_skip_verify,
            },
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging();

    let cfg_path = config_path();
    let config = match TuiConfig::load_or_default(&cfg_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("weft: invalid config file ({err}); using defaults");
            TuiConfig::default()
        }
    };

    if let Err(err) = init_theme(&config.theme) {
        eprintln!("weft: {err}");
        return ExitCode::FAILURE;
    }

    let connection = match cli.connection_config(&config) {
        Ok(connection) => connection,
        Err(err) => {
            eprintln!("weft: {err}");
            return ExitCode::FAILURE;
        }
    };
    let namespace = connection.namespace.clone();

    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(err) => {
            eprintln!("weft: failed to initialize terminal: {err}");
            return ExitCode::FAILURE;
        }
    };
    let guard = TerminalGuard;

    let (tx, mut rx) = mpsc::unbounded_channel::<TuiEvent>();
    let sender = UiSender::new(tx);
    spawn_input_reader(sender.clone());

    // Bounded-retry first connection; the supervisor takes over only
    // once it succeeds.
    let provider = match connect_with_retries(&connection, &mut terminal, &mut rx).await {
        StartupOutcome::Connected(provider) => provider,
        StartupOutcome::QuitRequested => {
            drop(guard);
            return ExitCode::SUCCESS;
        }
        StartupOutcome::Exhausted(last_error) => {
            drop(guard);
            eprintln!(
                "weft: could not connect to {} after {STARTUP_MAX_ATTEMPTS} attempts: {last_error}",
                connection.address
            );
            return ExitCode::FAILURE;
        }
    };

    let provider: Arc<dyn Provider> = Arc::new(provider);
    let ctx = Ctx::new(Arc::clone(&provider), sender.clone(), config);
    let supervisor = spawn_supervisor(provider, sender);

    let mut app = App::new(ctx, cfg_path, &namespace);
    let run_result = run_loop(&mut app, &mut terminal, &mut rx).await;

    supervisor.stop();
    app.save_config();
    drop(guard);

    match run_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("weft: {err}");
            ExitCode::FAILURE
        }
    }
}

enum StartupOutcome {
    Connected(HttpProvider),
    QuitRequested,
    Exhausted(String),
}

async fn connect_with_retries(
    connection: &ConnectionConfig,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    rx: &mut mpsc::UnboundedReceiver<TuiEvent>,
) -> StartupOutcome {
    let mut backoff = STARTUP_INITIAL_BACKOFF;
    let mut last_error = String::new();

    for attempt in 1..=STARTUP_MAX_ATTEMPTS {
        let _ = terminal.draw(|f| {
            draw_connecting(
                f,
                &connection.address,
                attempt,
                STARTUP_MAX_ATTEMPTS,
                (!last_error.is_empty()).then_some(last_error.as_str()),
            )
        });

        let connect =
            tokio::time::timeout(CONNECT_DEADLINE, HttpProvider::connect(connection.clone()));
        tokio::pin!(connect);
        loop {
            tokio::select! {
                outcome = &mut connect => {
                    match outcome {
                        Ok(Ok(provider)) => return StartupOutcome::Connected(provider),
                        Ok(Err(err)) => last_error = err.to_string(),
                        Err(_) => last_error = "connection attempt timed out".to_string(),
                    }
                    break;
                }
                Some(event) = rx.recv() => {
                    if is_quit(&event) {
                        return StartupOutcome::QuitRequested;
                    }
                }
            }
        }

        if attempt < STARTUP_MAX_ATTEMPTS {
            let sleep = tokio::time::sleep(backoff);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    Some(event) = rx.recv() => {
                        if is_quit(&event) {
                            return StartupOutcome::QuitRequested;
                        }
                    }
                }
            }
            backoff = (backoff * 2).min(STARTUP_MAX_BACKOFF);
        }
    }

    StartupOutcome::Exhausted(last_error)
}

fn is_quit(event: &TuiEvent) -> bool {
    matches!(
        event,
        TuiEvent::Input(key)
            if key.code == KeyCode::Char('q')
                || (key.code == KeyCode::Char('c')
                    && key.modifiers.contains(crossterm::event::KeyModifiers::CONTROL))
    )
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    rx: &mut mpsc::UnboundedReceiver<TuiEvent>,
) -> io::Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        terminal.draw(|f| app.draw(f))?;

        tokio::select! {
            _ = ticker.tick() => {}
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else { break };
                app.handle_event(event);
                // Drain whatever else already arrived; messages execute
                // in submission order.
                while let Ok(event) = rx.try_recv() {
                    app.handle_event(event);
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: UiSender) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                match evt {
                    CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                        sender.send(TuiEvent::Input(key));
                    }
                    CrosstermEvent::Resize(width, height) => {
                        sender.send(TuiEvent::Resize { width, height });
                    }
                    _ => {}
                }
            }
        }
    });
}

fn init_logging() {
    let path = log_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::File::create(&path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
