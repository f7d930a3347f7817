use clap::{Parser, Subcommand};

mod bridge;
mod commands;

#[derive(Parser)]
#[command(name = "tabwarden", version, about = "Tabwarden: tab timers, lockdown and intent log")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host the background service over stdin/stdout JSON lines
    Run,
    /// Print the state of every timer as JSON
    Status,
    /// Focus timer control
    Focus {
        #[command(subcommand)]
        action: commands::timer::FocusAction,
    },
    /// Self-destruct countdown control
    Destruct {
        #[command(subcommand)]
        action: commands::timer::DestructAction,
    },
    /// Tab lockdown control
    Lockdown {
        #[command(subcommand)]
        action: commands::timer::LockdownAction,
    },
    /// Tab cap management
    Tabs {
        #[command(subcommand)]
        action: commands::tabs::TabsAction,
    },
    /// Intent and browsing-time log
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr; stdout carries protocol lines and command output.
fn init_tracing() {
    let filter = std::env::var("TABWARDEN_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run => commands::run::run(),
        Commands::Status => commands::status::run(),
        Commands::Focus { action } => commands::timer::run_focus(action),
        Commands::Destruct { action } => commands::timer::run_destruct(action),
        Commands::Lockdown { action } => commands::timer::run_lockdown(action),
        Commands::Tabs { action } => commands::tabs::run(action),
        Commands::Activity { action } => commands::activity::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
