//! palaver CLI: terminal front-end for the palaver chat relay client

use clap::{Parser, Subcommand};
use palaver_engine::{default_sources, ChatClient, ChatError, ClientConfig, Role};
use std::io::{BufRead, Write};
use std::path::Path;

/// Chat client relaying conversations through a proxy with direct-API fallback
#[derive(Parser)]
#[command(name = "palaver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default when no command specified)
    Chat {
        /// Relay proxy endpoint (overrides config)
        #[arg(long)]
        proxy_url: Option<String>,

        /// Fallback API credential (overrides config)
        #[arg(long)]
        api_key: Option<String>,

        /// Model for the direct path (overrides config)
        #[arg(long)]
        model: Option<String>,
    },

    /// Initialize .palaver/ directory and config
    Init,

    /// Check configuration and credential sources
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

const PALAVER_DIR: &str = ".palaver";

fn main() {
    let cli = Cli::parse();

    match cli.command {
        None => cmd_chat(None, None, None),
        Some(Commands::Chat {
            proxy_url,
            api_key,
            model,
        }) => cmd_chat(proxy_url, api_key, model),
        Some(Commands::Init) => cmd_init(),
        Some(Commands::Doctor { json }) => cmd_doctor(json),
    }
}

/// Load the config file if present, otherwise fall back to defaults.
fn load_config() -> ClientConfig {
    let config_path = Path::new(PALAVER_DIR).join("config.json");
    if !config_path.exists() {
        return ClientConfig::default();
    }

    match ClientConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

fn cmd_chat(proxy_url: Option<String>, api_key: Option<String>, model: Option<String>) {
    let mut config = load_config();
    if let Some(url) = proxy_url {
        config.proxy_url = Some(url);
    }
    if let Some(key) = api_key {
        config.api_key = Some(key);
    }
    if let Some(name) = model {
        config.model = name;
    }

    if config.proxy_endpoint().is_none() {
        println!("No proxy configured; using the direct API only.");
    }

    let mut client = ChatClient::new(config);
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    // The seeded greeting is the first thing the user sees.
    if let Some(greeting) = client.history().get(1) {
        println!("assistant> {}\n", greeting.content);
    }
    println!("Type /history to review the conversation, /quit to exit.\n");

    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            // EOF ends the session
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {e}");
                break;
            }
        }

        let input = line.trim_end_matches(['\r', '\n']);
        match input.trim() {
            "/quit" | "/exit" => break,
            "/history" => {
                println!();
                for msg in client.history() {
                    println!("[{}] {}", role_label(msg.role), msg.content);
                }
                println!();
            }
            _ => match rt.block_on(client.send(input)) {
                Ok(reply) => {
                    // Replies are printed verbatim; literal newlines stay.
                    println!("assistant> {}", reply.content);
                    println!("           ({}, {}ms)\n", reply.route, reply.duration_ms);
                }
                // Blank input: nothing to send, nothing to report.
                Err(ChatError::EmptyInput) => {}
                Err(e) => {
                    eprintln!("error: {e}\n");
                }
            },
        }
    }

    println!("Bye.");
}

fn cmd_init() {
    let palaver_dir = Path::new(PALAVER_DIR);

    if let Err(e) = std::fs::create_dir_all(palaver_dir) {
        eprintln!("Failed to create {}: {e}", palaver_dir.display());
        std::process::exit(1);
    }

    let config_path = palaver_dir.join("config.json");
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config = ClientConfig::default();
        match config.save(&config_path) {
            Ok(()) => println!("Created {}", config_path.display()),
            Err(e) => {
                eprintln!("Failed to write config: {e}");
                std::process::exit(1);
            }
        }
    }

    println!("\nInitialization complete!");
    println!("Set proxy_url in {} to use a relay proxy,", config_path.display());
    println!("or provide a credential for the direct API (see `palaver doctor`).");
}

fn cmd_doctor(json: bool) {
    let config_path = Path::new(PALAVER_DIR).join("config.json");
    let config = load_config();

    let sources: Vec<(String, bool)> = default_sources()
        .iter()
        .map(|source| {
            let found = source
                .load()
                .is_some_and(|value| !value.trim().is_empty());
            (source.name().to_string(), found)
        })
        .collect();

    if json {
        let output = serde_json::json!({
            "config_file": config_path.exists(),
            "proxy_configured": config.proxy_endpoint().is_some(),
            "inline_credential": config.inline_credential().is_some(),
            "sources": sources
                .iter()
                .map(|(name, found)| serde_json::json!({"name": name, "found": found}))
                .collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).expect("failed to serialize")
        );
        return;
    }

    println!("Palaver Configuration Check\n");

    let config_status = if config_path.exists() {
        "present"
    } else {
        "not found (defaults in use)"
    };
    println!("  Config file: {config_status}");

    match config.proxy_endpoint() {
        Some(url) => println!("  Proxy endpoint: {url}"),
        None => println!("  Proxy endpoint: not configured (direct-only mode)"),
    }

    let credential_status = if config.inline_credential().is_some() {
        "configured"
    } else {
        "not configured"
    };
    println!("  Inline credential: {credential_status}");

    println!("\nCredential sources:");
    for (name, found) in &sources {
        let status = if *found { "found" } else { "not found" };
        println!("  {name} - {status}");
    }

    let found_count = sources.iter().filter(|(_, found)| *found).count();
    println!("\n{found_count} credential source(s) available");
}
