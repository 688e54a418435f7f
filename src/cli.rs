//! CLI interface for voice-companion

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::watch;

use crate::agent::responder::{HttpResponder, Responder};
use crate::config::{self, Config, URL_ENV_VAR};
use crate::language::{self, Language};
use crate::turn::{
    ConnectionStatus, ControllerConfig, ControllerHandle, ControllerSnapshot, HandleError,
    TurnController, TurnState,
};
use crate::types::Role;
use crate::voice::capture::SpeechRecognizer;
use crate::voice::console::{ConsoleMicrophone, ConsoleSynthesizer};
use crate::voice::playback::SpeechSynthesizer;

#[derive(Parser)]
#[command(name = "voice-companion")]
#[command(about = "Multilingual voice companion (English, Hindi, Marathi)", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a conversation (default when no command given)
    Chat {
        /// Responder base URL
        #[arg(long, env = URL_ENV_VAR)]
        url: Option<String>,
        /// Conversation language tag (en, hi, mr)
        #[arg(short, long)]
        language: Option<String>,
        /// Run as if the platform had no speech recognition
        #[arg(long)]
        no_mic: bool,
        /// Run as if the platform had no speech synthesis
        #[arg(long)]
        no_speech: bool,
    },
    /// Check that the responder is reachable
    Probe {
        /// Responder base URL
        #[arg(long, env = URL_ENV_VAR)]
        url: Option<String>,
    },
    /// List supported languages
    Languages,
    /// Show or reset configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Print the configuration file path
        #[arg(long)]
        path: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => run_chat(None, None, false, false).await?,
        Some(Commands::Chat {
            url,
            language,
            no_mic,
            no_speech,
        }) => run_chat(url, language, no_mic, no_speech).await?,
        Some(Commands::Probe { url }) => run_probe(url).await?,
        Some(Commands::Languages) => print_languages(),
        Some(Commands::Config { show, path, reset }) => {
            for step in config_steps(show, path, reset) {
                match step {
                    ConfigStep::Reset => config::reset_config()?,
                    ConfigStep::Path => println!("{}", config::config_path()?.display()),
                    ConfigStep::Show => config::show_config()?,
                }
            }
        }
    }

    Ok(())
}

/// One action of the `config` subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigStep {
    Reset,
    Path,
    Show,
}

/// Requested config actions in run order; showing is the default
fn config_steps(show: bool, path: bool, reset: bool) -> Vec<ConfigStep> {
    let mut steps = Vec::new();
    if reset {
        steps.push(ConfigStep::Reset);
    }
    if path {
        steps.push(ConfigStep::Path);
    }
    if show || steps.is_empty() {
        steps.push(ConfigStep::Show);
    }
    steps
}

fn load_config(url: Option<String>, language: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = url {
        config.responder.base_url = url;
    }
    if let Some(tag) = language {
        config.voice.language = language::resolve(&tag)?.language;
    }
    Ok(config)
}

async fn run_probe(url: Option<String>) -> Result<()> {
    let config = load_config(url, None)?;
    let responder = HttpResponder::from_config(&config.responder)?;

    match responder.probe().await {
        Ok(()) => {
            println!("✓ Connected to {}", responder.base_url());
            Ok(())
        }
        Err(e) => anyhow::bail!("Disconnected from {}: {}", responder.base_url(), e),
    }
}

fn print_languages() {
    println!("Supported languages:\n");
    for language in Language::ALL {
        let info = language.info();
        println!(
            "  {}  {:<3} {:<8} {}",
            info.glyph,
            language.tag(),
            info.locale_code,
            info.display_name
        );
    }
}

async fn run_chat(
    url: Option<String>,
    language: Option<String>,
    no_mic: bool,
    no_speech: bool,
) -> Result<()> {
    let config = load_config(url, language)?;
    let responder = HttpResponder::from_config(&config.responder)?;

    let mic = ConsoleMicrophone::new();
    let recognizer: Option<Box<dyn SpeechRecognizer>> = if no_mic {
        None
    } else {
        Some(Box::new(mic.recognizer()))
    };
    let synthesizer: Option<Box<dyn SpeechSynthesizer>> = if no_speech {
        None
    } else {
        Some(Box::new(ConsoleSynthesizer::default()))
    };

    println!("Voice Companion ({})", responder.base_url());
    println!("Type a message, /mic to speak, /help for commands.\n");

    let controller = TurnController::new(
        ControllerConfig::from_config(&config),
        Arc::new(responder),
        recognizer,
        synthesizer,
    );
    let handle = controller.handle();

    let render = tokio::spawn(render_loop(handle.subscribe()));
    let controller_task = tokio::spawn(controller.run());

    let repl_handle = handle.clone();
    let repl = tokio::task::spawn_blocking(move || repl_loop(repl_handle, mic));
    let repl_result = repl.await.context("REPL task panicked")?;

    // the REPL may have exited on an error before asking for shutdown
    let _ = handle.shutdown();
    controller_task.await.context("Turn controller task panicked")?;
    render.abort();

    repl_result
}

fn repl_loop(handle: ControllerHandle, mic: ConsoleMicrophone) -> Result<()> {
    let editor_config = rustyline::Config::builder()
        .edit_mode(rustyline::EditMode::Emacs)
        .auto_add_history(true)
        .build();
    let mut rl = rustyline::DefaultEditor::with_config(editor_config)?;

    loop {
        let prompt = if mic.is_open() {
            "\x1b[31m🎤\x1b[0m "
        } else {
            "\x1b[32m❯\x1b[0m "
        };

        match rl.readline(prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                // an open microphone takes the next line as speech
                if mic.is_open() && !input.starts_with('/') {
                    mic.hear(input);
                    continue;
                }

                match ReplCommand::parse(input) {
                    ReplCommand::Quit => break,
                    ReplCommand::Help => print_help(),
                    ReplCommand::Mic => handle.toggle_capture()?,
                    ReplCommand::Language(tag) => match handle.set_language(&tag) {
                        Ok(()) => {}
                        Err(HandleError::Language(e)) => println!("✗ {}", e),
                        Err(e) => return Err(e.into()),
                    },
                    ReplCommand::Languages => print_languages(),
                    ReplCommand::Status => print_status(&handle.snapshot()),
                    ReplCommand::History => print_history(&handle.snapshot()),
                    ReplCommand::Probe => handle.probe()?,
                    ReplCommand::Unknown(command) => {
                        println!("Unknown command: {} (try /help)", command)
                    }
                    ReplCommand::Say(text) => handle.submit(text)?,
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    println!("Goodbye!");
    handle.shutdown()?;
    Ok(())
}

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Say(String),
    Mic,
    Language(String),
    Languages,
    Status,
    History,
    Probe,
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    fn parse(input: &str) -> Self {
        let input = input.trim();
        let Some(rest) = input.strip_prefix('/') else {
            return ReplCommand::Say(input.to_string());
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match command.as_str() {
            "mic" | "m" => ReplCommand::Mic,
            "lang" | "language" if arg.is_empty() => ReplCommand::Languages,
            "lang" | "language" => ReplCommand::Language(arg.to_string()),
            "languages" => ReplCommand::Languages,
            "status" => ReplCommand::Status,
            "history" => ReplCommand::History,
            "probe" => ReplCommand::Probe,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" | "q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(format!("/{}", command)),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /mic          Start or stop listening (the next line is your speech)");
    println!("  /lang TAG     Switch language (en, hi, mr)");
    println!("  /languages    List supported languages");
    println!("  /status       Show turn, connection and speech status");
    println!("  /history      Show the conversation so far");
    println!("  /probe        Re-check the responder connection");
    println!("  /quit         Exit");
}

fn print_status(snapshot: &ControllerSnapshot) {
    println!("State:       {}", snapshot.state);
    println!("Connection:  {}", snapshot.connection);
    println!(
        "Language:    {} ({})",
        snapshot.language.display_name(),
        snapshot.language
    );
    println!(
        "Microphone:  {}",
        if snapshot.capture_supported { "available" } else { "not supported" }
    );
    println!(
        "Speech:      {}",
        if snapshot.playback_supported { "available" } else { "not supported" }
    );
    println!("Messages:    {}", snapshot.messages.len());
}

fn print_history(snapshot: &ControllerSnapshot) {
    println!("\n=== Conversation History ===");
    for message in &snapshot.messages {
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M:%S"),
            message.role,
            message.content
        );
    }
    println!("============================\n");
}

async fn render_loop(mut snapshots: watch::Receiver<ControllerSnapshot>) {
    let mut renderer = Renderer::default();

    loop {
        let lines = renderer.render(&snapshots.borrow_and_update());
        for line in lines {
            println!("{}", line);
        }
        if snapshots.changed().await.is_err() {
            break;
        }
    }
}

/// Turns successive snapshots into the lines to print
#[derive(Debug, Default)]
struct Renderer {
    printed: usize,
    state: Option<TurnState>,
    connection: Option<ConnectionStatus>,
    error: Option<String>,
}

impl Renderer {
    fn render(&mut self, snapshot: &ControllerSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if self.connection != Some(snapshot.connection) {
            match snapshot.connection {
                ConnectionStatus::Checking => {}
                ConnectionStatus::Connected => lines.push("● Connected".to_string()),
                ConnectionStatus::Disconnected => lines.push("○ Disconnected".to_string()),
            }
            self.connection = Some(snapshot.connection);
        }

        for message in snapshot.messages.iter().skip(self.printed) {
            let line = match message.role {
                Role::User => format!("You: {}", message.content),
                Role::Assistant => format!("Assistant: {}", message.content),
            };
            lines.push(line);
        }
        self.printed = snapshot.messages.len();

        if self.state != Some(snapshot.state) {
            match snapshot.state {
                TurnState::Listening => lines.push("🎤 Listening... (type what you would say)".to_string()),
                TurnState::Processing => lines.push("⏳ Thinking...".to_string()),
                TurnState::Speaking => lines.push("🔊 Speaking...".to_string()),
                TurnState::Idle => {}
            }
            self.state = Some(snapshot.state);
        }

        if snapshot.error != self.error {
            if let Some(error) = &snapshot.error {
                lines.push(format!("✗ {}", error));
            }
            self.error = snapshot.error.clone();
        }

        lines
    }
}
