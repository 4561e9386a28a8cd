//! Timi chat CLI
//!
//! A command-line interface for the multi-provider chat core, with REPL
//! support. Plays the role of the UI orchestrator: it only talks to the
//! session, the stores, and the storage layer.

use anyhow::Result;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use timi_chat::{Provider, Session, Storage};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "timi-chat")]
#[command(about = "Timi - chat with any LLM provider from one prompt", long_about = None)]
struct Cli {
    /// Directory for persisted chats and settings (defaults to the
    /// platform data dir)
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug,hyper=info,reqwest=info,rustls=info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_help() {
    println!("Commands:");
    println!("  /new              - Start a new chat");
    println!("  /list             - List chats, newest first");
    println!("  /switch <n>       - Switch to chat <n> from /list");
    println!("  /delete           - Delete the current chat");
    println!("  /clear            - Clear the current chat's messages");
    println!("  /provider <id>    - Select provider ({})", provider_ids().join(", "));
    println!("  /model <id>       - Select model for the current provider");
    println!("  /key <value>      - Set API key for the current provider");
    println!("  /system <text>    - Set the system prompt");
    println!("  /reset-settings   - Restore default settings");
    println!("  /help             - Show this help");
    println!("  /quit, /exit      - Exit");
    println!();
}

fn provider_ids() -> Vec<&'static str> {
    Provider::ALL.iter().map(|p| p.id()).collect()
}

/// Look up a message's content once its call has settled
fn message_text(session: &Session, id: Uuid) -> Option<String> {
    let chats = session.chats();
    let chats = chats.lock();
    chats
        .chats()
        .iter()
        .flat_map(|c| c.messages.iter())
        .find(|m| m.id == id)
        .map(|m| m.content.clone())
}

fn persist(session: &Session, storage: &Storage) {
    if let Err(e) = storage.save_chats(&session.chats().lock()) {
        eprintln!("Warning: failed to save chats: {e:#}");
    }
    if let Err(e) = storage.save_settings(&session.settings().lock()) {
        eprintln!("Warning: failed to save settings: {e:#}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    init_logging(cli.verbose);

    let storage = match cli.data_dir {
        Some(dir) => Storage::with_dir(dir),
        None => Storage::new(),
    };
    let chats = storage.load_chats()?;
    let settings = storage.load_settings()?;
    let session = Session::new(chats, settings);

    {
        let settings = session.settings();
        let settings = settings.lock();
        let provider = settings.settings().current_provider;
        println!("Timi chat");
        println!(
            "Provider: {} ({})",
            provider.display_name(),
            settings.settings().models[&provider]
        );
        println!("Data dir: {}", storage.dir().display());
        println!();
    }
    print_help();

    let mut rl = DefaultEditor::new()?;
    let history_path = storage.dir().join("history.txt");
    let _ = rl.load_history(&history_path);

    loop {
        let readline = rl.readline("timi> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if let Some(command) = line.strip_prefix('/') {
                    let (cmd, arg) = match command.split_once(' ') {
                        Some((cmd, arg)) => (cmd, Some(arg.trim())),
                        None => (command, None),
                    };
                    match cmd {
                        "quit" | "exit" => {
                            println!("Goodbye!");
                            break;
                        }
                        "help" => print_help(),
                        "new" => {
                            session.chats().lock().create_chat();
                            println!("Started a new chat.");
                        }
                        "list" => {
                            let chats = session.chats();
                            let chats = chats.lock();
                            let active = chats.current_chat_id();
                            for (i, chat) in chats.list_visible().iter().enumerate() {
                                let marker = if Some(chat.id) == active { "*" } else { " " };
                                println!(
                                    "{marker} {i}: {} ({} messages)",
                                    chat.name,
                                    chat.messages.len()
                                );
                            }
                        }
                        "switch" => {
                            let index: Option<usize> = arg.and_then(|a| a.parse().ok());
                            let chats = session.chats();
                            let mut chats = chats.lock();
                            let id = index.and_then(|i| chats.list_visible().get(i).map(|c| c.id));
                            match id {
                                Some(id) => {
                                    chats.set_active(id);
                                    println!("Switched.");
                                }
                                None => eprintln!("Usage: /switch <n> (see /list)"),
                            }
                        }
                        "delete" => {
                            let chats = session.chats();
                            let mut chats = chats.lock();
                            match chats.current_chat_id() {
                                Some(id) => {
                                    chats.delete_chat(id);
                                    println!("Chat deleted.");
                                }
                                None => eprintln!("No active chat."),
                            }
                        }
                        "clear" => {
                            session.chats().lock().clear_active();
                            println!("Chat cleared.");
                        }
                        "provider" => match arg.map(str::parse::<Provider>) {
                            Some(Ok(provider)) => {
                                session.settings().lock().update_provider(provider);
                                println!("Provider set to {}.", provider.display_name());
                            }
                            Some(Err(e)) => eprintln!("{e}"),
                            None => eprintln!("Usage: /provider <{}>", provider_ids().join("|")),
                        },
                        "model" => match arg {
                            Some(model) => {
                                let settings = session.settings();
                                let mut settings = settings.lock();
                                let provider = settings.settings().current_provider;
                                settings.update_model(provider, model);
                                println!("Model set to {model}.");
                            }
                            None => eprintln!("Usage: /model <id>"),
                        },
                        "key" => match arg {
                            Some(key) => {
                                let settings = session.settings();
                                let mut settings = settings.lock();
                                let provider = settings.settings().current_provider;
                                settings.update_api_key(provider, key);
                                println!("API key set for {}.", provider.display_name());
                            }
                            None => eprintln!("Usage: /key <value>"),
                        },
                        "system" => match arg {
                            Some(prompt) => {
                                session.settings().lock().update_system_prompt(prompt);
                                println!("System prompt updated.");
                            }
                            None => eprintln!("Usage: /system <text>"),
                        },
                        "reset-settings" => {
                            session.settings().lock().reset();
                            println!("Settings reset to defaults.");
                        }
                        _ => eprintln!("Unknown command: /{cmd} (try /help)"),
                    }
                    persist(&session, &storage);
                    continue;
                }

                match session.send(line).await {
                    Ok(assistant_id) => {
                        if let Some(text) = message_text(&session, assistant_id) {
                            println!("\n{text}\n");
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
                persist(&session, &storage);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    persist(&session, &storage);
    Ok(())
}
