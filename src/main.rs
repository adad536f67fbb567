//! Puzzup status CLI
//!
//! Entry point for the `puzzup-status` command-line tool.

use clap::{Parser, Subcommand};
use puzzup_status::{registry, table, Blocker, StatusCode, TransitionContext};
use puzzup_workflow::model::{Role, SessionId, TestsolveSession};
use puzzup_workflow::{
    dispatch, EffectiveConfig, LogNotifier, MemoryStore, Puzzle, PuzzleId, User, UserId,
    WorkflowEngine,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "puzzup-status")]
#[command(about = "Puzzle status workflow tools", version)]
struct Cli {
    /// Path to site config file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every status in pipeline order
    States {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show one status
    Show {
        code: String,

        #[arg(long)]
        json: bool,
    },

    /// Show the transition menu for a status
    Transitions {
        code: String,

        /// Resolve as if the puzzle has editors assigned
        #[arg(long)]
        has_editors: bool,

        #[arg(long)]
        json: bool,
    },

    /// List statuses blocked on a role
    BlockedOn {
        /// Blocker name or label, e.g. "editors" or "editor(s)"
        blocker: String,

        #[arg(long)]
        json: bool,
    },

    /// Run one transition against an in-memory puzzle and print the effects
    Simulate {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        has_editors: bool,

        #[arg(long)]
        postprod_url: Option<String>,

        /// Number of joinable testsolve sessions on the puzzle
        #[arg(long, default_value_t = 0)]
        joinable_sessions: u64,

        /// Email subscribed to the target status (repeatable)
        #[arg(long)]
        subscriber: Vec<String>,

        /// Testsolve coordinator email (repeatable)
        #[arg(long)]
        coordinator: Vec<String>,
    },

    /// Print the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let config = match EffectiveConfig::build(cli.config.as_deref(), None) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };
    init_logging(&config.settings.logging.filter);

    match cli.command {
        Commands::States { json } => run_states(json),
        Commands::Show { code, json } => run_show(&code, json),
        Commands::Transitions {
            code,
            has_editors,
            json,
        } => run_transitions(&code, has_editors, json),
        Commands::BlockedOn { blocker, json } => run_blocked_on(&blocker, json),
        Commands::Simulate {
            from,
            to,
            has_editors,
            postprod_url,
            joinable_sessions,
            subscriber,
            coordinator,
        } => run_simulate(
            config,
            SimulateArgs {
                from,
                to,
                has_editors,
                postprod_url,
                joinable_sessions,
                subscribers: subscriber,
                coordinators: coordinator,
            },
        ),
        Commands::Config => run_config(&config),
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_code(raw: &str) -> StatusCode {
    match StatusCode::parse(raw) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Invalid status code {:?}: {}", raw, e);
            process::exit(2);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_states(json: bool) {
    let rows: Vec<serde_json::Value> = registry()
        .iter()
        .map(|info| {
            serde_json::json!({
                "code": info.status.code(),
                "display": info.display_name,
                "emoji": info.emoji,
                "rank": info.rank,
                "blocker": table().blocker(&info.status.into()).label(),
            })
        })
        .collect();

    if json {
        print_json(&rows);
        return;
    }

    for info in registry().iter() {
        let blocker = table().blocker(&info.status.into());
        println!(
            "{:>2}  {:<3} {:<4} {:<45} blocked on {}",
            info.rank,
            info.status.code(),
            info.emoji,
            info.display_name,
            blocker.label()
        );
    }
}

fn run_show(raw: &str, json: bool) {
    let code = parse_code(raw);
    let view = registry().view(&code);

    if json {
        print_json(&view);
        return;
    }

    println!("Code:     {}", view.code);
    println!("Display:  {}", view.display_name);
    println!("Emoji:    {}", view.emoji);
    println!("Rank:     {}", view.rank);
    println!("Blocker:  {}", table().blocker(&code).label());
    println!("Past writing:     {}", registry().past_writing(&code));
    println!("Past testsolving: {}", registry().past_testsolving(&code));
}

fn run_transitions(raw: &str, has_editors: bool, json: bool) {
    let code = parse_code(raw);
    let ctx = TransitionContext {
        has_editors_assigned: has_editors,
    };
    let options = puzzup_status::get_legal_transitions(&code, &ctx);

    if json {
        print_json(&options);
        return;
    }

    if options.is_empty() {
        println!("No transitions from {}", registry().display_name(&code));
        return;
    }
    for option in options {
        println!("{:<3} {:<45} {}", option.status, option.status_display, option.description);
    }
}

fn run_blocked_on(raw: &str, json: bool) {
    let blocker: Blocker = match raw.parse() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };
    let statuses = table().statuses_blocked_on(blocker);

    if json {
        print_json(&statuses);
        return;
    }

    for status in statuses {
        println!("{:<3} {}", status.code(), registry().info(status).display_name);
    }
}

struct SimulateArgs {
    from: String,
    to: String,
    has_editors: bool,
    postprod_url: Option<String>,
    joinable_sessions: u64,
    subscribers: Vec<String>,
    coordinators: Vec<String>,
}

fn run_simulate(config: EffectiveConfig, args: SimulateArgs) {
    let from = parse_code(&args.from);
    let to = parse_code(&args.to);

    let store = MemoryStore::new();
    if let Err(e) = seed_simulation(&store, &args, from, &to) {
        eprintln!("Error preparing simulation: {}", e);
        process::exit(1);
    }

    let engine = match WorkflowEngine::new(store, config.settings) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    let actor = User::new(UserId(1), "simulator").with_role(Role::EditorInChief);

    let bundle = match engine.attempt_transition(PuzzleId(1), &to, &actor) {
        Ok(bundle) => bundle,
        Err(e) => {
            eprintln!("Transition failed: {}", e);
            process::exit(1);
        }
    };

    let report = dispatch(&LogNotifier, &bundle);
    print_json(&serde_json::json!({
        "effects": bundle,
        "dispatch": report,
    }));
}

fn seed_simulation(
    store: &MemoryStore,
    args: &SimulateArgs,
    from: StatusCode,
    to: &StatusCode,
) -> Result<(), puzzup_workflow::store::StoreError> {
    let actor = User::new(UserId(1), "simulator").with_role(Role::EditorInChief);
    store.insert_user(actor)?;

    let editor = UserId(2);
    store.insert_user(User::new(editor, "editor").with_role(Role::Editor))?;
    let editors = if args.has_editors { vec![editor] } else { Vec::new() };

    let mut next_user = 3;

    for email in &args.subscribers {
        let id = UserId(next_user);
        next_user += 1;
        store.insert_user(User::new(id, email.as_str()).with_email(email.as_str()))?;
        store.subscribe(id, to)?;
    }
    for email in &args.coordinators {
        let id = UserId(next_user);
        next_user += 1;
        store.insert_user(
            User::new(id, email.as_str())
                .with_email(email.as_str())
                .with_role(Role::TestsolveCoordinator),
        )?;
    }

    let mut puzzle = Puzzle::new(PuzzleId(1), "Simulated puzzle", chrono::Utc::now())
        .with_status(from)
        .with_editors(editors);
    if let Some(url) = &args.postprod_url {
        puzzle = puzzle.with_postprod_url(url.as_str());
    }
    store.insert_puzzle(puzzle)?;

    for n in 0..args.joinable_sessions {
        store.insert_session(TestsolveSession {
            id: SessionId(n + 1),
            puzzle: PuzzleId(1),
            joinable: true,
        })?;
    }
    Ok(())
}

fn run_config(config: &EffectiveConfig) {
    match config.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            process::exit(1);
        }
    }
}
