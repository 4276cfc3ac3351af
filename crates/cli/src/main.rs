//! CLI entrypoint and subcommand orchestration.

mod config;
#[cfg(test)]
mod test_support;
mod tui;

use std::path::Path;

use clap::{Parser, Subcommand};
use config::Config;
use proto::AssistantReply;
use session::{ChatSession, QUICK_ACTIONS, RejectReason, SubmitOutcome};
use tracing::warn;

#[cfg(not(test))]
use std::process::ExitCode;
#[cfg(not(test))]
use std::sync::Arc;

#[cfg(not(test))]
use session::HttpEndpoint;
#[cfg(not(test))]
use tracing::info;
#[cfg(not(test))]
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level command-line arguments for calchat.
#[derive(Parser)]
#[command(name = "calchat")]
#[command(about = "Terminal chat client for the AI calendar assistant", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging to ~/.calchat/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Assistant server base URL (overrides config and environment)
    #[arg(short, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands available in the application.
#[derive(Subcommand)]
enum Commands {
    /// Start the full-screen chat (default when no subcommand is given)
    Tui,

    /// Send a single message and print the assistant's answer
    Run {
        /// Message to send to the assistant
        #[arg(short = 'e', long)]
        exec: String,
    },

    /// List the built-in quick-action prompts
    Actions,
}

#[cfg(not(test))]
#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Tui);
    let is_tui = matches!(command, Commands::Tui);

    // Console output is suppressed in TUI mode so it cannot corrupt the display.
    // When --debug is passed, write debug-level logs to ~/.calchat/logs/debug.YYYY-MM-DD.log.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    let debug_writer = if cli.debug {
        let log_dir = Config::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from(".calchat"))
            .join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);
        Some(writer)
    } else {
        _file_guard = None;
        None
    };

    match (is_tui, debug_writer) {
        (true, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::sink)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (true, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::sink)
                .with_target(false)
                .init();
        }
        (false, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (false, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }

    if cli.debug {
        let cmd_label = match &command {
            Commands::Tui => "tui",
            Commands::Run { .. } => "run",
            Commands::Actions => "actions",
        };
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = cmd_label,
            log_level = %cli.log_level,
            "========== calchat session start =========="
        );
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(url) = cli.endpoint {
        config.endpoint.base_url = url;
    }

    match command {
        Commands::Tui => cmd_tui(config).await.map(|()| ExitCode::SUCCESS),
        Commands::Run { exec } => cmd_run(config, exec).await,
        Commands::Actions => {
            print!("{}", format_quick_actions());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads configuration. A file named with `--config` must load; a discovered
/// file that fails falls back to defaults with a warning.
fn load_config(path: Option<&Path>) -> proto::Result<Config> {
    match Config::load(path) {
        Ok(config) => Ok(config),
        Err(e) if path.is_none() => {
            warn!("Failed to load config ({e}), using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(test))]
/// Builds a chat session talking to the configured endpoint.
fn build_session(config: &Config) -> proto::Result<ChatSession> {
    let endpoint = HttpEndpoint::new(&config.endpoint.base_url, config.endpoint.timeout())?;
    info!(url = %endpoint.chat_url(), "Assistant endpoint configured");
    Ok(ChatSession::new(Arc::new(endpoint)))
}

#[cfg(not(test))]
/// Starts the full-screen chat.
async fn cmd_tui(config: Config) -> anyhow::Result<()> {
    let session = build_session(&config)?;
    if config.session.welcome {
        session.start_welcome(config.session.welcome_schedule());
    }
    tui::run_tui(
        session,
        config.endpoint.base_url.clone(),
        config.endpoint.login_url(),
    )
    .await
}

#[cfg(not(test))]
/// Sends one message, prints the answer, and exits non-zero unless it succeeded.
async fn cmd_run(config: Config, exec: String) -> anyhow::Result<ExitCode> {
    let session = build_session(&config)?;
    let answer = one_shot(&session, &exec, &config.endpoint.login_url()).await;
    session.dispose();
    let answer = answer?;

    if answer.status == 0 {
        println!("{}", answer.output);
    } else {
        eprintln!("{}", answer.output);
    }
    Ok(ExitCode::from(answer.status))
}

/// Printable result of `calchat run`.
#[derive(Debug)]
struct OneShot {
    output: String,
    status: u8,
}

/// Submits `exec` once and renders the outcome.
async fn one_shot(
    session: &ChatSession,
    exec: &str,
    login_url: &str,
) -> anyhow::Result<OneShot> {
    let reply = match session.submit(exec).await {
        SubmitOutcome::Completed(reply) => reply,
        SubmitOutcome::Rejected(RejectReason::Empty) => anyhow::bail!("message is empty"),
        SubmitOutcome::Rejected(reason) => anyhow::bail!("message rejected: {reason:?}"),
    };
    Ok(OneShot {
        output: format_one_shot(&reply, login_url),
        status: exit_code_for(&reply),
    })
}

/// Renders a one-shot answer, adding the sign-in URL when the endpoint asked for it.
fn format_one_shot(reply: &AssistantReply, login_url: &str) -> String {
    match reply {
        AssistantReply::AuthRequired => format!("{}\nSign in: {login_url}", reply.transcript_text()),
        _ => reply.transcript_text(),
    }
}

/// Process exit status for a one-shot answer.
fn exit_code_for(reply: &AssistantReply) -> u8 {
    match reply {
        AssistantReply::Success(_) => 0,
        AssistantReply::AuthRequired => 2,
        AssistantReply::ApplicationError(_) => 1,
        AssistantReply::TransportError(_) => 3,
    }
}

/// Numbered quick-action listing for `calchat actions`.
fn format_quick_actions() -> String {
    QUICK_ACTIONS
        .iter()
        .enumerate()
        .map(|(i, action)| format!("F{}  {action}\n", i + 1))
        .collect()
}
