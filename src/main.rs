//! Rafiq CLI
//!
//! Chat TUI by default; one-shot tools and a plain stdin/stdout chat
//! loop for scripting.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rafiq::credentials::{looks_like_api_key, CredentialStore, FileCredentialStore};
use rafiq::session::{ConversationMode, Session, SessionManager};
use rafiq::tools::{self, ToolInput, ToolKind};
use rafiq::tui::App;
use rafiq::{AppConfig, ChatClient};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Rafiq - Arabic-first AI assistant for the terminal
#[derive(Parser, Debug)]
#[command(name = "rafiq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Conversation mode (ASCII name or Arabic label)
    #[arg(short, long, default_value = "general")]
    mode: String,

    /// Run a one-shot tool instead of the chat (see --help for names)
    #[arg(short, long)]
    tool: Option<String>,

    /// Tool field as key=value (repeatable)
    #[arg(short = 'o', long = "opt", value_name = "KEY=VALUE")]
    opts: Vec<String>,

    /// Save the API key and exit
    #[arg(long, value_name = "KEY")]
    set_key: Option<String>,

    /// Override the app home directory (default: ~/.rafiq)
    #[arg(long)]
    home: Option<PathBuf>,

    /// Disable TUI and use plain text mode
    #[arg(long)]
    no_tui: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initial message (chat) or input text (tools)
    #[arg(trailing_var_arg = true)]
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app_home = match &cli.home {
        Some(home) => home.clone(),
        None => rafiq::config::app_home()?,
    };
    let config = AppConfig::load(&app_home);
    let credentials = Arc::new(FileCredentialStore::new(&app_home));

    if let Some(key) = &cli.set_key {
        return save_key(credentials.as_ref(), key);
    }

    let mode: ConversationMode = cli
        .mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;

    let client = ChatClient::new(&config);
    let manager = SessionManager::new(client, credentials);

    if cli.tool.is_some() {
        run_tool_mode(cli, manager).await
    } else if cli.no_tui {
        run_plain_mode(cli, manager, mode).await
    } else {
        run_tui_mode(manager, mode).await
    }
}

fn save_key(store: &dyn CredentialStore, key: &str) -> anyhow::Result<()> {
    if !looks_like_api_key(key) {
        anyhow::bail!("يرجى إدخال مفتاح OpenAI API صحيح يبدأ بـ sk-");
    }
    store.set(key)?;
    println!("تم الحفظ بنجاح!");
    Ok(())
}

async fn run_tui_mode(manager: SessionManager, mode: ConversationMode) -> anyhow::Result<()> {
    // No logging init here: the TUI owns the terminal.
    let mut app = App::new(manager, mode)?;
    app.run().await?;
    Ok(())
}

async fn run_tool_mode(cli: Cli, manager: SessionManager) -> anyhow::Result<()> {
    setup_logging(cli.verbose);

    let name = cli.tool.as_deref().unwrap_or_default();
    let kind: ToolKind = name.parse().map_err(|e: String| anyhow::anyhow!("{e}"))?;

    let mut input = ToolInput::new(cli.prompt.join(" "));
    for opt in &cli.opts {
        let (key, value) = parse_opt(opt)?;
        input.set_option(key, value);
    }

    info!("Running tool '{}'", kind.name());
    let result = tools::run(&manager, kind, &input).await;
    println!("{result}");
    Ok(())
}

async fn run_plain_mode(
    cli: Cli,
    manager: SessionManager,
    mode: ConversationMode,
) -> anyhow::Result<()> {
    setup_logging(cli.verbose);

    info!("Starting Rafiq (plain mode)");
    let mut session = Session::with_mode(mode);
    print_last_reply(&session);

    // Initial message from the command line, if any
    if !cli.prompt.is_empty() {
        let text = cli.prompt.join(" ");
        submit_and_print(&manager, &mut session, &text).await;
    }

    // Blocking stdin reads happen on their own thread; the async side
    // only sees an mpsc of lines.
    let (line_tx, mut line_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });

    while let Some(line) = line_rx.recv().await {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed {
            "/quit" | "/exit" => break,
            "/new" => {
                session.clear();
                print_last_reply(&session);
            }
            _ => submit_and_print(&manager, &mut session, trimmed).await,
        }
    }

    Ok(())
}

async fn submit_and_print(manager: &SessionManager, session: &mut Session, text: &str) {
    match manager.submit(session, text).await {
        Ok(()) => print_last_reply(session),
        Err(e) => warn!("submission rejected: {e}"),
    }
}

fn print_last_reply(session: &Session) {
    if let Some(msg) = session.transcript().last() {
        println!("{}", msg.text);
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Split a `key=value` CLI option.
fn parse_opt(opt: &str) -> anyhow::Result<(&str, &str)> {
    opt.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| anyhow::anyhow!("invalid --opt '{}', expected key=value", opt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_opt() {
        assert_eq!(parse_opt("to=الفرنسية").unwrap(), ("to", "الفرنسية"));
        assert_eq!(parse_opt("task = fix").unwrap(), ("task", "fix"));
        assert!(parse_opt("broken").is_err());
    }

    #[test]
    fn test_cli_parses_defaults() {
        let cli = Cli::parse_from(["rafiq"]);
        assert_eq!(cli.mode, "general");
        assert!(!cli.no_tui);
        assert!(cli.tool.is_none());
        assert!(cli.prompt.is_empty());
    }

    #[test]
    fn test_cli_parses_tool_invocation() {
        let cli = Cli::parse_from([
            "rafiq",
            "--tool",
            "translate",
            "--opt",
            "to=English",
            "--no-tui",
            "مرحبا",
        ]);
        assert_eq!(cli.tool.as_deref(), Some("translate"));
        assert_eq!(cli.opts, vec!["to=English".to_string()]);
        assert_eq!(cli.prompt, vec!["مرحبا".to_string()]);
    }
}
