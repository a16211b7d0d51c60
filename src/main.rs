//! gh2yt - GitHub to YouTrack issue mirror
//!
//! Main entry point for the gh2yt CLI.

use clap::{Parser, Subcommand};
use gh2yt::config::{validate_config, validate_config_result, SyncConfig};
use gh2yt::integrations::{DestinationTracker, GitHubAdapter, SourceTracker, YouTrackAdapter};
use gh2yt::model::{IssueEvent, SourceIssue};
use gh2yt::sync::{Bootstrap, BootstrapSummary, ImportOutcome, SyncEngine, WebhookRegistration};
use gh2yt::webhook::WebhookServer;
use gh2yt::SyncError;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// gh2yt - Mirror GitHub issues into YouTrack
#[derive(Parser, Debug)]
#[command(name = "gh2yt")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/gh2yt/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a configuration template
    Init,

    /// Check the configuration without contacting GitHub or YouTrack
    Validate,

    /// Bootstrap, then serve webhook deliveries
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Register the webhook and import issues into a new project
    Bootstrap,

    /// Provision the project and import issues, unless it already exists
    Import,

    /// Register the webhook, or reuse an existing one
    Webhook,

    /// Sync a single issue from a saved webhook payload or issue JSON
    Sync {
        /// Path to the JSON file
        file: PathBuf,
    },
}

/// Everything a networked command needs
struct Runtime {
    config: SyncConfig,
    engine: Arc<SyncEngine>,
    bootstrap: Bootstrap,
}

impl Runtime {
    fn build(config: SyncConfig) -> gh2yt::Result<Self> {
        validate_config_result(&config)?;

        let source: Arc<dyn SourceTracker> = Arc::new(GitHubAdapter::new(&config)?);
        let destination: Arc<dyn DestinationTracker> = Arc::new(YouTrackAdapter::new(&config)?);
        let engine = Arc::new(SyncEngine::new(&config, destination.clone()));
        let bootstrap = Bootstrap::new(&config, source, destination, engine.clone());

        Ok(Self {
            config,
            engine,
            bootstrap,
        })
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    if let Err(e) = gh2yt::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> gh2yt::Result<()> {
    if let Commands::Init = cli.command {
        return handle_init_command(cli.config.as_deref());
    }

    let config = SyncConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Validate => handle_validate_command(&config),
        Commands::Serve { bind } => {
            let runtime = Runtime::build(config)?;
            let summary = runtime.bootstrap.run().await?;
            print_bootstrap_summary(summary);

            let addr = bind.unwrap_or_else(|| runtime.config.server.bind.clone());
            WebhookServer::new(&runtime.config, runtime.engine)
                .run(&addr)
                .await
        }
        Commands::Bootstrap => {
            let runtime = Runtime::build(config)?;
            let summary = runtime.bootstrap.run().await?;
            print_bootstrap_summary(summary);
            Ok(())
        }
        Commands::Import => {
            let runtime = Runtime::build(config)?;
            let outcome = runtime.bootstrap.import_or_skip().await?;
            print_import_outcome(&outcome);
            Ok(())
        }
        Commands::Webhook => {
            let runtime = Runtime::build(config)?;
            let registration = runtime.bootstrap.ensure_webhook().await?;
            print_webhook_registration(&registration);
            Ok(())
        }
        Commands::Sync { file } => {
            let runtime = Runtime::build(config)?;
            let issue = read_issue_file(&file)?;
            let outcome = runtime
                .engine
                .sync_issue(&issue, runtime.config.project_name())
                .await?;
            let verb = if outcome.was_created() { "Created" } else { "Updated" };
            println!(
                "✓ {} {} from GitHub issue {}",
                verb,
                outcome.issue().display_id(),
                issue.id
            );
            Ok(())
        }
    }
}

fn handle_init_command(config_path: Option<&Path>) -> gh2yt::Result<()> {
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(SyncConfig::default_path);

    if config_file.exists() {
        println!("Configuration already exists at {}", config_file.display());
        return Ok(());
    }

    // Seed from the environment so existing deployments carry over
    let config = SyncConfig::from_env();
    config.save(&config_file)?;

    println!("✓ Created configuration at {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. Fill in the repository, YouTrack and webhook settings");
    println!("  2. Check them:");
    println!("     gh2yt validate");
    println!("  3. Start mirroring:");
    println!("     gh2yt serve");

    Ok(())
}

fn handle_validate_command(config: &SyncConfig) -> gh2yt::Result<()> {
    match validate_config(config) {
        Ok(()) => {
            println!("✓ Configuration is valid");
            println!("  Repository:  {}", config.repo_slug());
            println!(
                "  Project:     {} ({})",
                config.project_name(),
                config.project_short_code()
            );
            println!("  YouTrack:    {}", config.destination_base_url);
            println!("  Webhook:     {}", config.webhook_target_url);
            Ok(())
        }
        Err(errors) => {
            println!("Configuration has {} problem(s):", errors.len());
            for error in &errors {
                println!("  ✗ {}", error);
            }
            Err(SyncError::Config("Configuration validation failed".to_string()))
        }
    }
}

/// Accepts either a full `issues` delivery or a bare issue object
fn read_issue_file(path: &Path) -> gh2yt::Result<SourceIssue> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;

    if value.get("issue").is_some() {
        let event: IssueEvent = serde_json::from_value(value)?;
        Ok(event.issue)
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

fn print_webhook_registration(registration: &WebhookRegistration) {
    match registration {
        WebhookRegistration::Created(hook) => {
            println!("✓ Registered webhook {} → {}", hook.id, hook.url)
        }
        WebhookRegistration::Reused(hook) => {
            println!("✓ Reusing webhook {} → {}", hook.id, hook.url)
        }
    }
}

fn print_import_outcome(outcome: &ImportOutcome) {
    match outcome {
        ImportOutcome::Imported { report, .. } => {
            println!("✓ {}", report.summary());
            for failure in &report.failures {
                println!(
                    "  ✗ issue {} \"{}\": {}",
                    failure.source_id, failure.title, failure.error
                );
            }
        }
        ImportOutcome::Skipped { project, .. } => {
            println!(
                "✓ Project '{}' ({}) already exists, import skipped",
                project.name, project.short_name
            );
        }
    }
}

fn print_bootstrap_summary(summary: &BootstrapSummary) {
    print_webhook_registration(&summary.webhook);
    print_import_outcome(&summary.import);
}
