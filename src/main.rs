//! MailPilot — review unread Gmail with knowledge-grounded AI drafts.
//!
//! Subcommands: one-time OAuth setup, status, knowledge base
//! management, and an interactive review loop over unread mail.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mailpilot::assistant::{Assistant, GroundedDraft};
use mailpilot::config::{self, Config};
use mailpilot::error::AssistantError;
use mailpilot::google_api::{self, gmail};
use mailpilot::knowledge::{KnowledgeEntry, KnowledgeStore};
use mailpilot::session::ReviewSession;

#[derive(Parser)]
#[command(name = "mailpilot")]
#[command(version)]
#[command(about = "Review unread Gmail with knowledge-grounded AI summaries and draft replies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One-time Google OAuth setup
    Setup,

    /// Show authentication, configuration, and knowledge base status
    Status,

    /// Fetch unread emails and review them interactively
    Review {
        /// Maximum number of messages to fetch
        #[arg(long, default_value_t = 25)]
        max: u32,
    },

    /// Manage the knowledge base
    Kb {
        #[command(subcommand)]
        command: KbCommands,
    },

    /// Show or update configuration
    Config {
        /// Set the completion API key
        #[arg(long)]
        api_key: Option<String>,

        /// Set the completion model
        #[arg(long)]
        model: Option<String>,

        /// Set the chat-completions endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[derive(Subcommand)]
enum KbCommands {
    /// List knowledge base entries
    List,

    /// Add a single question/answer entry
    Add { question: String, answer: String },

    /// Import entries from a JSON file (a list of {question, answer} objects)
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Setup => cmd_setup().await,
        Commands::Status => cmd_status(),
        Commands::Review { max } => cmd_review(max).await,
        Commands::Kb { command } => cmd_kb(command),
        Commands::Config {
            api_key,
            model,
            endpoint,
        } => cmd_config(api_key, model, endpoint),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        eprintln!("{}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

// ============================================================================
// Setup + status
// ============================================================================

async fn cmd_setup() -> Result<(), AssistantError> {
    let creds_path = google_api::credentials_path();
    if !creds_path.exists() {
        println!("Missing {}", creds_path.display());
        println!();
        println!("To get this file:");
        println!("  1. Go to https://console.cloud.google.com/");
        println!("  2. Create a project (or select an existing one)");
        println!("  3. Enable the Gmail API");
        println!("  4. Credentials -> Create Credentials -> OAuth client ID");
        println!("  5. Choose 'Desktop application'");
        println!("  6. Download the JSON and save it to the path above");
        println!("  7. Run 'mailpilot setup' again");
        return Err(AssistantError::Config(
            "Google client credentials not found".into(),
        ));
    }

    println!("Opening your browser for Google consent...");
    let email = google_api::auth::run_consent_flow().await?;
    println!("Gmail authentication successful. Connected as {}.", email);
    Ok(())
}

fn cmd_status() -> Result<(), AssistantError> {
    match google_api::token_store::peek_account_email() {
        Some(email) => println!("Gmail: connected as {}", email),
        None => println!("Gmail: not connected (run 'mailpilot setup')"),
    }

    let config = config::load_config()?;
    println!("Completion model: {}", config.resolved_model());
    println!("Completion endpoint: {}", config.resolved_endpoint());
    println!(
        "Completion API key: {}",
        if config.resolved_api_key().is_some() {
            "set"
        } else {
            "not set"
        }
    );

    let kb_path = config.knowledge_base_path()?;
    match KnowledgeStore::new(&kb_path).load() {
        Ok(entries) => println!(
            "Knowledge base: {} entries at {}",
            entries.len(),
            kb_path.display()
        ),
        Err(e) => println!("Knowledge base: {}", e),
    }
    Ok(())
}

// ============================================================================
// Knowledge base
// ============================================================================

fn cmd_kb(command: KbCommands) -> Result<(), AssistantError> {
    let config = config::load_config()?;
    let store = KnowledgeStore::new(config.knowledge_base_path()?);

    match command {
        KbCommands::List => {
            let entries = store.load()?;
            if entries.is_empty() {
                println!("Knowledge base is empty.");
                return Ok(());
            }
            for (i, entry) in entries.iter().enumerate() {
                println!("{}. Q: {}", i + 1, entry.question);
                println!("   A: {}", entry.answer);
            }
        }
        KbCommands::Add { question, answer } => {
            let added = store.update(&[KnowledgeEntry { question, answer }])?;
            if added == 1 {
                println!("Added 1 entry.");
            } else {
                println!("Nothing added (question empty or already present).");
            }
        }
        KbCommands::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let added = store.import_json(&text)?;
            println!("Imported {} new {}.", added, plural(added, "entry", "entries"));
        }
    }
    Ok(())
}

// ============================================================================
// Config
// ============================================================================

fn cmd_config(
    api_key: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
) -> Result<(), AssistantError> {
    let mut config = config::load_config()?;

    if api_key.is_none() && model.is_none() && endpoint.is_none() {
        print_config(&config);
        return Ok(());
    }

    if let Some(key) = api_key {
        config.completion_api_key = Some(key);
    }
    if let Some(model) = model {
        config.completion_model = Some(model);
    }
    if let Some(endpoint) = endpoint {
        config.completion_endpoint = Some(endpoint);
    }

    config::save_config(&config)?;
    println!("Configuration updated.");
    print_config(&config);
    Ok(())
}

fn print_config(config: &Config) {
    println!("Model: {}", config.resolved_model());
    println!("Endpoint: {}", config.resolved_endpoint());
    println!(
        "API key: {}",
        if config.resolved_api_key().is_some() {
            "set"
        } else {
            "not set"
        }
    );
}

// ============================================================================
// Review loop
// ============================================================================

async fn cmd_review(max: u32) -> Result<(), AssistantError> {
    let config = config::load_config()?;
    let store = KnowledgeStore::new(config.knowledge_base_path()?);
    let assistant = Assistant::new(store, config);

    let mut session = ReviewSession::new();
    fetch_into_session(&mut session, max).await?;
    print_email_list(&session);
    if session.is_empty() {
        return Ok(());
    }

    println!("Type 'help' for commands.");
    let stdin = std::io::stdin();
    loop {
        print!("mailpilot> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next();

        // Commands addressing a specific email take a 1-based number.
        let idx = if matches!(command, "show" | "sum" | "draft" | "ground" | "edit" | "send") {
            match parse_index(arg, session.emails().len()) {
                Ok(idx) => idx,
                Err(msg) => {
                    println!("{}", msg);
                    continue;
                }
            }
        } else {
            0
        };

        let result = match command {
            "quit" | "q" | "exit" => break,
            "help" => {
                print_help();
                Ok(())
            }
            "list" => {
                print_email_list(&session);
                Ok(())
            }
            "reload" => {
                let r = fetch_into_session(&mut session, max).await;
                if r.is_ok() {
                    print_email_list(&session);
                }
                r
            }
            "show" => {
                show_email(&session, idx);
                Ok(())
            }
            "sum" => summarize_action(&mut session, &assistant, idx).await,
            "draft" => draft_action(&mut session, &assistant, idx).await,
            "ground" => ground_action(&mut session, &assistant, idx).await,
            "edit" => edit_action(&mut session, &stdin, idx),
            "send" => send_action(&mut session, idx).await,
            other => {
                println!("Unknown command '{}'. Type 'help' for commands.", other);
                Ok(())
            }
        };

        if let Err(e) = result {
            eprintln!("Error: {}", e);
            eprintln!("{}", e.recovery_suggestion());
        }
    }

    Ok(())
}

async fn fetch_into_session(
    session: &mut ReviewSession,
    max: u32,
) -> Result<(), AssistantError> {
    println!("Connecting to Gmail and fetching unread emails...");
    let token = google_api::get_valid_access_token().await?;
    let emails = gmail::list_unread(&token, max).await?;
    println!("Fetched {} unread email(s).", emails.len());
    session.load(emails);
    Ok(())
}

fn print_email_list(session: &ReviewSession) {
    for (i, email) in session.emails().iter().enumerate() {
        println!("{}. {} — from {}", i + 1, email.subject, email.sender);
    }
}

fn print_help() {
    println!("Commands (N is the email number from 'list'):");
    println!("  show N    print the full email");
    println!("  sum N     AI summary of the email");
    println!("  draft N   AI draft reply");
    println!("  ground N  AI draft grounded in matching knowledge base entries");
    println!("  edit N    type a reply by hand (end with a single '.' line)");
    println!("  send N    send the current draft as a threaded reply");
    println!("  list      reprint the email list");
    println!("  reload    refetch unread emails (discards drafts)");
    println!("  quit      leave the review loop");
}

/// Parse a 1-based index argument into a zero-based index.
fn parse_index(arg: Option<&str>, len: usize) -> Result<usize, String> {
    let arg = arg.ok_or_else(|| "Give an email number, e.g. 'show 1'.".to_string())?;
    let n: usize = arg
        .parse()
        .map_err(|_| format!("'{}' is not an email number.", arg))?;
    if n == 0 || n > len {
        return Err(format!("No email #{} (have {}).", n, len));
    }
    Ok(n - 1)
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn show_email(session: &ReviewSession, idx: usize) {
    let Some(email) = session.email(idx) else {
        return;
    };
    println!("From: {}", email.sender);
    println!("Date: {}", email.date);
    println!("Subject: {}", email.subject);
    println!();
    println!("{}", email.body);
    if let Some(summary) = session.summary(&email.id) {
        println!();
        println!("Summary: {}", summary);
    }
    if let Some(draft) = session.draft(&email.id) {
        println!();
        println!("Draft reply:");
        println!("{}", draft);
    }
}

async fn summarize_action(
    session: &mut ReviewSession,
    assistant: &Assistant,
    idx: usize,
) -> Result<(), AssistantError> {
    let Some(email) = session.email(idx).cloned() else {
        return Ok(());
    };

    println!("Summarizing...");
    let summary = assistant.summarize(&email).await?;
    println!("{}", summary);
    session.set_summary(&email.id, summary);
    Ok(())
}

async fn draft_action(
    session: &mut ReviewSession,
    assistant: &Assistant,
    idx: usize,
) -> Result<(), AssistantError> {
    let Some(email) = session.email(idx).cloned() else {
        return Ok(());
    };

    println!("Drafting...");
    let draft = assistant.draft_reply(&email).await?;
    println!("{}", draft);
    println!(
        "Saved as the draft for #{}. Edit with 'edit {}', send with 'send {}'.",
        idx + 1,
        idx + 1,
        idx + 1
    );
    session.set_draft(&email.id, draft);
    Ok(())
}

async fn ground_action(
    session: &mut ReviewSession,
    assistant: &Assistant,
    idx: usize,
) -> Result<(), AssistantError> {
    let Some(email) = session.email(idx).cloned() else {
        return Ok(());
    };

    println!("Matching knowledge base...");
    match assistant.grounded_draft(&email).await? {
        GroundedDraft::NoMatch => {
            println!("No knowledge base entries matched this email; no draft generated.");
        }
        GroundedDraft::Draft { matched, text } => {
            println!(
                "Grounded in {} matching {}.",
                matched,
                plural(matched, "entry", "entries")
            );
            println!("{}", text);
            println!("Saved as the draft for #{}.", idx + 1);
            session.set_draft(&email.id, text);
        }
    }
    Ok(())
}

fn edit_action(
    session: &mut ReviewSession,
    stdin: &std::io::Stdin,
    idx: usize,
) -> Result<(), AssistantError> {
    let Some(email) = session.email(idx).cloned() else {
        return Ok(());
    };

    println!("Enter the reply text. End with a single '.' on its own line.");
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "." {
            break;
        }
        lines.push(trimmed.to_string());
    }

    let text = lines.join("\n");
    if text.trim().is_empty() {
        println!("Empty reply discarded.");
        return Ok(());
    }
    session.set_draft(&email.id, text);
    println!("Draft saved for #{}. Send with 'send {}'.", idx + 1, idx + 1);
    Ok(())
}

async fn send_action(
    session: &mut ReviewSession,
    idx: usize,
) -> Result<(), AssistantError> {
    let Some(email) = session.email(idx).cloned() else {
        return Ok(());
    };

    let Some(draft) = session.draft(&email.id).map(str::to_string) else {
        println!(
            "No draft for #{}. Use 'draft', 'ground', or 'edit' first.",
            idx + 1
        );
        return Ok(());
    };

    let token = google_api::get_valid_access_token().await?;
    gmail::send_reply(
        &token,
        &email.sender,
        &format!("Re: {}", email.subject),
        &draft,
        &email.thread_id,
    )
    .await?;

    session.take_draft(&email.id);
    println!("Reply sent.");
    Ok(())
}
