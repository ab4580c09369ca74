//! AgentFlow CLI
//!
//! A command-line interface for the supervisor-routed agent workflow.

use agentflow_agents::{
    CannedSearch, ChatAgent, ChatClient, ChatModel, DuckDuckGoClient, SessionStore, StepEvent,
    TemplateModel, Toolbox, WebSearch, Workflow, WorkflowConfig, WorkflowRun,
};
use agentflow_core::{Message, Plan, RoutingScope};
use agentflow_db::{init_memory, init_persistent, Repository};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// AgentFlow - a supervisor routing requests through research, calculation and summary
#[derive(Parser)]
#[command(name = "agentflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (defaults to ~/.agentflow/data)
    #[arg(short, long)]
    db_path: Option<PathBuf>,

    /// Use in-memory database (for testing)
    #[arg(long)]
    memory: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Use canned search results and a template model instead of network services
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the workflow on a session until every planned task is done
    Run {
        /// Request to add to the session (resumes the session if omitted)
        message: Option<String>,

        /// Session id
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Task order, e.g. "research,calculate,summarize"
        #[arg(short, long)]
        plan: Option<String>,

        /// Only count completions since the latest user message
        #[arg(long)]
        latest_turn: bool,

        /// Maximum specialist steps per run
        #[arg(long)]
        max_steps: Option<usize>,
    },

    /// Ask the chat agent, with the session history as memory and search/calculator tools
    Chat {
        /// Question
        message: String,

        /// Session id
        #[arg(short, long, default_value = "default")]
        session: String,
    },

    /// Show a session's messages
    Show {
        /// Session id
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Print the raw conversation state as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent sessions
    Sessions {
        /// Maximum results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete a session
    Delete {
        /// Session id
        session: String,
    },

    /// Show database statistics
    Stats,

    /// Interactive mode
    Interactive {
        /// Session to start in
        #[arg(short, long, default_value = "default")]
        session: String,
    },

    /// Delete the local database (fresh start)
    ResetDb {
        /// Database path (defaults to ~/.agentflow/data)
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },
}

/// Search backend and model shared by the agents
struct Capabilities {
    search: Arc<dyn WebSearch>,
    model: Arc<dyn ChatModel>,
}

impl Capabilities {
    async fn connect(offline: bool) -> Result<Self> {
        if offline {
            info!("Offline mode: canned search and template model");
            return Ok(Self {
                search: Arc::new(CannedSearch),
                model: Arc::new(TemplateModel),
            });
        }

        let model = ChatClient::from_env()?;
        let model_ok = model.health().await.unwrap_or(false);
        if !model_ok {
            eprintln!("Error: model service is not reachable.");
            eprintln!("  Chat completions: {}", model.base_url());
            eprintln!("Set OPENAI_API_BASE and OPENAI_API_KEY, or pass --offline");
            anyhow::bail!("Model service unavailable");
        }

        Ok(Self {
            search: Arc::new(DuckDuckGoClient::from_env()),
            model: Arc::new(model),
        })
    }
}

fn default_db_path() -> Result<PathBuf> {
    let mut path = dirs::home_dir().context("Could not find home directory")?;
    path.push(".agentflow");
    path.push("data");
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging; stdout is kept for command output
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::ResetDb { db_path } = &cli.command {
        let path = match db_path.clone().or_else(|| cli.db_path.clone()) {
            Some(path) => path,
            None => default_db_path()?,
        };

        if path.exists() {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove db at {}", path.display()))?;
            println!("✓ Removed database at {}", path.display());
        } else {
            println!("Database not found at {}, nothing to remove", path.display());
        }
        return Ok(());
    }

    // Initialize database
    let db = if cli.memory {
        info!("Using in-memory database");
        init_memory().await?
    } else {
        let db_path = match cli.db_path {
            Some(path) => path,
            None => default_db_path()?,
        };

        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Using database at: {}", db_path.display());
        init_persistent(&db_path).await?
    };

    let repo = Repository::new(db);
    let offline = cli.offline;

    // Execute command
    match cli.command {
        Commands::Run { message, session, plan, latest_turn, max_steps } => {
            let config = workflow_config(plan, latest_turn, max_steps)?;
            let capabilities = Capabilities::connect(offline).await?;
            cmd_run(repo, capabilities, config, session, message).await?;
        }
        Commands::Chat { message, session } => {
            let config = WorkflowConfig::from_env()?;
            let capabilities = Capabilities::connect(offline).await?;
            cmd_chat(repo, capabilities, config, session, message).await?;
        }
        Commands::Show { session, json } => {
            cmd_show(repo, session, json).await?;
        }
        Commands::Sessions { limit } => {
            cmd_sessions(repo, limit).await?;
        }
        Commands::Delete { session } => {
            repo.delete_session(&session).await?;
            println!("✓ Deleted session {}", session);
        }
        Commands::Stats => {
            cmd_stats(repo).await?;
        }
        Commands::Interactive { session } => {
            let config = WorkflowConfig::from_env()?;
            let capabilities = Capabilities::connect(offline).await?;
            cmd_interactive(repo, capabilities, config, session).await?;
        }
        Commands::ResetDb { .. } => {
            // Handled before database init.
        }
    }

    Ok(())
}

/// Environment settings with command-line overrides on top
fn workflow_config(
    plan: Option<String>,
    latest_turn: bool,
    max_steps: Option<usize>,
) -> Result<WorkflowConfig> {
    let mut config = WorkflowConfig::from_env()?;
    if let Some(plan) = plan {
        let plan = Plan::parse(&plan).with_context(|| format!("Invalid plan: {}", plan))?;
        config = config.with_plan(plan);
    }
    if latest_turn {
        config = config.with_scope(RoutingScope::LatestTurn);
    }
    if let Some(max_steps) = max_steps {
        config = config.with_max_steps(max_steps);
    }
    Ok(config)
}

fn build_workflow(
    store: Arc<dyn SessionStore>,
    capabilities: &Capabilities,
    config: WorkflowConfig,
) -> Result<Workflow> {
    Ok(Workflow::with_capabilities(
        config,
        store,
        capabilities.search.clone(),
        capabilities.model.clone(),
    )?)
}

/// Run the workflow, printing each step as it completes
async fn run_with_progress(
    workflow: &Workflow,
    session: &str,
    input: Vec<Message>,
) -> Result<WorkflowRun> {
    let (tx, mut rx) = mpsc::unbounded_channel::<StepEvent>();

    let printer = async {
        while let Some(event) = rx.recv().await {
            println!("--- Step {}: {} ---", event.step, event.task);
            println!("{}", event.message.content);
            println!();
        }
    };

    let (run, ()) = tokio::join!(workflow.run_streaming(session, input, tx), printer);
    Ok(run?)
}

fn report_run(run: &WorkflowRun) {
    if run.is_noop() && run.appended > 0 {
        println!(
            "Recorded {} new message(s) in session '{}'; nothing was pending ({} messages).",
            run.appended,
            run.session_id,
            run.state.len()
        );
    } else if run.is_noop() {
        println!(
            "Session '{}' is already complete ({} messages).",
            run.session_id,
            run.state.len()
        );
    } else {
        println!(
            "✓ Session '{}' finished after {} steps ({} messages)",
            run.session_id,
            run.dispatched.len(),
            run.state.len()
        );
    }
}

async fn cmd_run(
    repo: Repository,
    capabilities: Capabilities,
    config: WorkflowConfig,
    session: String,
    message: Option<String>,
) -> Result<()> {
    let workflow = build_workflow(Arc::new(repo), &capabilities, config)?;
    let input: Vec<Message> = message.map(Message::user).into_iter().collect();

    println!("Plan: {}\n", workflow.router().plan());

    let run = run_with_progress(&workflow, &session, input)
        .await
        .with_context(|| format!("Workflow failed for session '{}'", session))?;
    report_run(&run);

    Ok(())
}

async fn cmd_chat(
    repo: Repository,
    capabilities: Capabilities,
    config: WorkflowConfig,
    session: String,
    message: String,
) -> Result<()> {
    let tools = Toolbox::new(capabilities.search.clone(), config.capability_timeout);
    let agent = ChatAgent::new(capabilities.model, Arc::new(repo), config.capability_timeout).with_tools(tools);
    let reply = agent.ask(&session, &message).await?;
    println!("{}", reply.content);
    Ok(())
}

fn describe(message: &Message) -> String {
    match message.produced_by {
        Some(task) if message.completes(task) => format!("[{} ✓] {}", task, message.content),
        Some(task) => format!("[{} ✗] {}", task, message.content),
        None => format!("[{}] {}", message.role, message.content),
    }
}

async fn cmd_show(repo: Repository, session: String, json: bool) -> Result<()> {
    let stored = repo
        .get_session(&session)
        .await?
        .with_context(|| format!("Session '{}' not found", session))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stored.state)?);
        return Ok(());
    }

    println!("Session {} ({} messages):\n", stored.session_id, stored.state.len());
    for message in stored.state.messages() {
        println!("{}", describe(message));
    }

    Ok(())
}

async fn cmd_sessions(repo: Repository, limit: usize) -> Result<()> {
    let sessions = repo.list_sessions(limit).await?;

    if sessions.is_empty() {
        println!("No sessions yet. Start one with: agentflow run \"<request>\"");
        return Ok(());
    }

    println!("Recent sessions ({}):\n", sessions.len());

    for session in sessions {
        let updated = session
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("• {} - {} messages, updated {}", session.session_id, session.message_count, updated);
    }

    Ok(())
}

async fn cmd_stats(repo: Repository) -> Result<()> {
    let stats = repo.get_stats().await?;

    println!("Database Statistics:");
    println!("  • Sessions: {}", stats.session_count);
    println!("  • Messages: {}", stats.message_count);

    Ok(())
}

async fn cmd_interactive(
    repo: Repository,
    capabilities: Capabilities,
    config: WorkflowConfig,
    session: String,
) -> Result<()> {
    let store: Arc<dyn SessionStore> = Arc::new(repo.clone());
    let timeout = config.capability_timeout;
    let workflow = build_workflow(store.clone(), &capabilities, config)?;
    let chat = ChatAgent::new(capabilities.model.clone(), store, timeout)
        .with_tools(Toolbox::new(capabilities.search.clone(), timeout))
        .with_locks(workflow.locks().clone());

    let mut session = session;

    println!("AgentFlow - Interactive Mode");
    println!("Plan: {} (scope: {:?})", workflow.router().plan(), workflow.router().scope());
    println!("Commands: run, chat, show, session, sessions, stats, help, quit");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("agentflow[{}]> ", session);
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let parts: Vec<&str> = line.trim().splitn(2, ' ').collect();
        let cmd = parts.first().copied().unwrap_or("");
        let arg = parts.get(1).copied().unwrap_or("").trim();

        match cmd {
            "" => continue,

            "run" | "r" => {
                let input: Vec<Message> = if arg.is_empty() {
                    Vec::new()
                } else {
                    vec![Message::user(arg)]
                };
                match run_with_progress(&workflow, &session, input).await {
                    Ok(run) => report_run(&run),
                    Err(e) => println!("Error: {}", e),
                }
            }

            "chat" | "c" => {
                if arg.is_empty() {
                    println!("Usage: chat <message>");
                    continue;
                }
                match chat.ask(&session, arg).await {
                    Ok(reply) => println!("{}", reply.content),
                    Err(e) => println!("Error: {}", e),
                }
            }

            "show" => match repo.get_session(&session).await {
                Ok(Some(stored)) => {
                    for message in stored.state.messages() {
                        println!("{}", describe(message));
                    }
                }
                Ok(None) => println!("Session {} is empty.", session),
                Err(e) => println!("Error: {}", e),
            },

            "session" => {
                if arg.is_empty() {
                    println!("Current session: {}", session);
                } else {
                    session = arg.to_string();
                    println!("Switched to session {}", session);
                }
            }

            "sessions" | "l" => match repo.list_sessions(10).await {
                Ok(sessions) if sessions.is_empty() => println!("No sessions yet."),
                Ok(sessions) => {
                    for s in sessions {
                        println!("• {} - {} messages", s.session_id, s.message_count);
                    }
                }
                Err(e) => println!("Error: {}", e),
            },

            "stats" => match repo.get_stats().await {
                Ok(s) => println!("Sessions: {}, Messages: {}", s.session_count, s.message_count),
                Err(e) => println!("Error: {}", e),
            },

            "help" | "h" | "?" => {
                println!("Commands:");
                println!("  run [request]    - Add a request and run the workflow");
                println!("  chat <message>   - Ask the chat agent");
                println!("  show             - Show the current session");
                println!("  session [id]     - Show or switch the current session");
                println!("  sessions         - List recent sessions");
                println!("  stats            - Show statistics");
                println!("  quit             - Exit");
            }

            "quit" | "q" | "exit" => {
                println!("Goodbye!");
                break;
            }

            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", cmd);
            }
        }

        println!();
    }

    Ok(())
}
