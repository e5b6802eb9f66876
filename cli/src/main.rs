//! Sign-in CLI - binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The CLI bridges [`signin_engine`] (form state) and [`signin_tui`] (rendering),
//! providing RAII-based terminal management with guaranteed cleanup.
//!
//! ```text
//! main() -> Args -> SigninConfig -> HttpAuthClient
//!                                       |
//!                    +------------------+------------------+
//!                    v                                     v
//!        TerminalSession + run_app()              plain::run() (--plain)
//! ```
//!
//! # Event Loop
//!
//! The TUI uses a fixed 16ms render cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`signin_tui::InputPump`])
//! 3. Apply finished sign-in attempts (`app.process_results()`)
//! 4. Render frame
//! 5. Check for quit

mod plain;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::{
    fs::{self, OpenOptions},
    io::{self, Stdout, Write, stdout},
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use signin_config::SigninConfig;
use signin_engine::{App, AppSettings, SigninOutcome};
use signin_providers::{HttpAuthClient, HttpAuthConfig};
use signin_tui::{InputPump, draw, handle_events};

/// Sign in to the account service from the terminal.
#[derive(Debug, Parser)]
#[command(name = "signin", version, about)]
struct Args {
    /// Read credentials from stdin instead of opening the form.
    #[arg(long)]
    plain: bool,

    /// Email to pre-fill (overrides config and SIGNIN_EMAIL).
    #[arg(long)]
    email: Option<String>,

    /// Service base URL (overrides config and SIGNIN_BASE_URL).
    #[arg(long)]
    base_url: Option<String>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Without a log file, stay silent rather than draw over the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.signin/logs/signin.log
    if let Some(config_path) = SigninConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("signin.log"));
    }

    // Fallback: ./.signin/logs/signin.log
    candidates.push(PathBuf::from(".signin").join("logs").join("signin.log"));

    candidates
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// Enables raw mode, bracketed paste and the alternate screen; all of it is
/// restored on drop, including after panics and early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnableBracketedPaste, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen, DisableBracketedPaste);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

fn build_client(config: &SigninConfig, base_url: Option<String>) -> Result<HttpAuthClient> {
    let base_url = base_url
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .or_else(|| config.base_url())
        .ok_or_else(|| {
            anyhow!("no sign-in service configured: set [auth] base_url, SIGNIN_BASE_URL or --base-url")
        })?;

    let client = HttpAuthClient::new(&HttpAuthConfig {
        base_url,
        signin_path: config.signin_path(),
        connect_timeout: config.connect_timeout(),
        allow_http: config.allow_http(),
    })?;
    tracing::info!(endpoint = %client.endpoint(), "Sign-in client ready");
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing();

    let config = match SigninConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Ignoring config: {e}");
            SigninConfig::default()
        }
    };

    let client = build_client(&config, args.base_url)?;
    let email = args.email.or_else(|| config.prefill_email());
    let notification_title = config.notification_title().map(ToString::to_string);

    let signed_in = if args.plain {
        let stdin = io::stdin();
        let outcome = plain::run(
            client,
            email,
            notification_title,
            plain::PlainIo {
                input: stdin.lock(),
                out: io::stdout(),
                err: io::stderr(),
            },
        )
        .await
        .context("plain sign-in failed")?;
        tracing::info!(?outcome, "Plain sign-in finished");
        outcome == SigninOutcome::Authenticated
    } else {
        let mut app = App::new(
            client,
            AppSettings {
                prefill_email: email,
                notification_title,
                ui_options: config.ui_options(),
            },
        );

        let result = {
            let mut session = TerminalSession::new()?;
            run_app(&mut session.terminal, &mut app).await
        };
        app.shutdown();
        result?;

        match app.signed_in() {
            Some(email) => {
                println!("Signed in as {email}");
                true
            }
            None => false,
        }
    };

    Ok(if signed_in {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

const FRAME_DURATION: Duration = Duration::from_millis(16);

async fn run_app<B>(terminal: &mut Terminal<B>, app: &mut App<HttpAuthClient>) -> Result<()>
where
    B: Backend + Write,
    B::Error: Send + Sync + 'static,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut tick: usize = 0;

    let result: Result<()> = loop {
        frames.tick().await;
        tick = tick.wrapping_add(1);

        // Non-blocking input (drain queue only)
        let quit_now = match handle_events(app, &mut input) {
            Ok(q) => q,
            Err(e) => break Err(e),
        };
        if quit_now {
            break Ok(());
        }

        app.process_results();

        if let Err(e) = terminal.draw(|frame| draw(frame, app, tick)) {
            break Err(e.into());
        }

        if app.should_quit() {
            break Ok(());
        }
    };

    input.shutdown().await;
    result
}
