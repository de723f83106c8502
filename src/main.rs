//! Flowdeck CLI - terminal dashboard for CI workflows

use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use colored::Colorize;

use flowdeck::config::{mask_token, DashConfig};
use flowdeck::error::{FixSuggestion, FlowdeckError};
use flowdeck::github::{GitHubApi, GitHubClient, MockGitHub};
use flowdeck::schema::FieldKind;
use flowdeck::{parse_workflow, Dashboard, DashboardOptions, DispatchSerializer, InputFieldModel};

#[derive(Parser)]
#[command(name = "flowdeck")]
#[command(about = "Flowdeck - terminal dashboard for CI workflows")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// API token (overrides GITHUB_TOKEN / GH_TOKEN and the config file)
    #[arg(long, global = true)]
    token: Option<String>,

    /// REST API base URL (GitHub Enterprise)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Seconds between live history refreshes
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Start with live refresh enabled
    #[arg(long)]
    live: bool,

    /// Use built-in sample data instead of the network
    #[arg(long)]
    demo: bool,

    /// Open directly on a repository (owner/name)
    #[arg(short, long)]
    repo: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a local workflow file and show its dispatch inputs
    Check {
        /// Path to a workflow YAML file
        file: String,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Check { file }) => check_workflow(file),
        Some(Commands::Config) => load_config(&cli).map(|config| show_config(&config)),
        None => run_dashboard(&cli).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// Config file, then environment, then flags
fn load_config(cli: &Cli) -> Result<DashConfig, FlowdeckError> {
    let mut config = DashConfig::load()?.with_env();
    if let Some(token) = &cli.token {
        config.github.token = Some(token.clone());
    }
    if let Some(api_url) = &cli.api_url {
        config.github.api_url = api_url.clone();
        config.github.api_base()?;
    }
    if let Some(secs) = cli.poll_interval {
        config.sync.poll_interval_secs = secs;
    }
    if cli.live {
        config.sync.live_on_start = true;
    }
    Ok(config)
}

/// The terminal is owned by the TUI, so logs go to a file
fn init_logging() -> Result<(), FlowdeckError> {
    let dir = DashConfig::state_dir();
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("flowdeck.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_dashboard(cli: &Cli) -> Result<(), FlowdeckError> {
    let config = load_config(cli)?;
    init_logging()?;

    let api: Arc<dyn GitHubApi> = if cli.demo {
        tracing::info!("Using demo data");
        Arc::new(MockGitHub::demo())
    } else {
        if !config.has_token() {
            return Err(FlowdeckError::ConfigError {
                reason: "no API token (set GITHUB_TOKEN, GH_TOKEN or github.token)".to_string(),
            });
        }
        Arc::new(GitHubClient::new(&config.github)?)
    };

    let mut dashboard = Dashboard::new(api, DashboardOptions::from(&config.sync));
    if let Some(repo) = &cli.repo {
        dashboard.open_repository(repo).await?;
    }

    flowdeck::tui::run(dashboard)
        .await
        .map_err(|e| FlowdeckError::ConfigError {
            reason: format!("terminal: {}", e),
        })
}

fn check_workflow(file: &str) -> Result<(), FlowdeckError> {
    let source = fs::read_to_string(file)?;
    let schema = parse_workflow(&source, file)?;

    println!(
        "{} '{}' declares {} dispatch input(s)",
        "✓".green(),
        schema.name.cyan().bold(),
        schema.fields.len()
    );
    for field in &schema.fields {
        let required = if field.required {
            "required".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<24} {:<8} {:<10} {}",
            field.key.bold(),
            field.kind_name().dimmed(),
            required,
            field.description
        );
        match &field.kind {
            FieldKind::Choice { options } => {
                println!("  {:<24} options: {}", "", options.join(", "));
            }
            FieldKind::ObjectMap { entries } => {
                for entry in entries {
                    println!(
                        "  {:<24} .{} = {}",
                        "",
                        entry.subkey,
                        entry.default.dimmed()
                    );
                }
            }
            _ => {}
        }
    }

    // what a dispatch with untouched defaults would send
    let inputs = InputFieldModel::new(schema).finalize();
    let payload = DispatchSerializer::to_value(&inputs)?;
    println!("{}", "Default payload:".cyan().bold());
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn show_config(config: &DashConfig) {
    println!("{}", "Configuration".cyan().bold());
    println!("  File:           {}", DashConfig::config_path().display());
    println!("  API URL:        {}", config.github.api_url);
    println!(
        "  Token:          {}",
        config
            .github
            .token
            .as_deref()
            .map(|t| mask_token(t, 4))
            .unwrap_or_else(|| "(not set)".red().to_string())
    );
    println!("  Poll interval:  {}s", config.sync.poll_interval().as_secs());
    println!("  Fetch timeout:  {}s", config.sync.fetch_timeout().as_secs());
    println!("  Fan-out limit:  {}", config.sync.fan_out_limit());
    println!("  Live on start:  {}", config.sync.live_on_start);
}
