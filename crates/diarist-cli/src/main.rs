//! Diarist CLI - diary annotation with relationship graphs

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use diarist_core::annotation::Annotator;
use diarist_core::config::{API_KEY_ENV, Config};
use diarist_core::llm::LlmClient;
use diarist_core::pipeline::{AnnotateRequest, AnnotateResponse, DiaryPipeline};
use diarist_core::profile::HttpProfileClient;
use diarist_core::reconcile::Reconciler;
use diarist_core::storage::{Database, SqliteStoryRepository, Story, StoryRepository};
use tracing::warn;

#[derive(Parser)]
#[command(name = "diarist")]
#[command(author, version, about = "Diary annotation with relationship graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a diary entry and store the story
    Annotate {
        /// Profile id of the diary's subject
        #[arg(short, long)]
        personal_id: i64,
        /// Read the entry from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Entry text (stdin is read when neither --file nor --text is given)
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Manage stored stories
    Stories {
        #[command(subcommand)]
        action: StoryAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum StoryAction {
    /// List all stories
    List,
    /// Show story details
    Show { id: i64 },
    /// Count stored stories
    Count,
    /// Delete a story
    Delete {
        id: i64,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show the configuration file path
    Path,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "diarist=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        report_error(&err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Annotate {
            personal_id,
            file,
            text,
        } => {
            let diary_entry = read_entry(file, text)?;
            cmd_annotate(personal_id, diary_entry, cli.format, cli.quiet).await
        }

        Commands::Stories { action } => {
            let db = open_database(&Config::load()?).await?;
            let stories = SqliteStoryRepository::new(db.pool().clone());
            let result = cmd_stories(&stories, action, cli.format, cli.quiet).await;
            db.close().await;
            result
        }

        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Doctor => cmd_doctor(cli.quiet).await,
    }
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<diarist_core::Error>() {
        Some(core) => {
            eprintln!("Error [{}]: {}", core.code(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Suggestion: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn read_entry(file: Option<PathBuf>, text: Option<String>) -> anyhow::Result<String> {
    use anyhow::Context;

    match (file, text) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read diary entry: {}", path.display())),
        (None, Some(text)) => Ok(text),
        (None, None) => {
            let mut entry = String::new();
            std::io::stdin()
                .read_to_string(&mut entry)
                .context("Failed to read diary entry from stdin")?;
            Ok(entry)
        }
    }
}

async fn open_database(config: &Config) -> anyhow::Result<Database> {
    let path = config.database_path()?;
    Ok(Database::open(path).await?)
}

fn build_pipeline(config: &Config, db: &Database) -> anyhow::Result<DiaryPipeline> {
    let profiles = HttpProfileClient::new(&config.profile)?;

    let mut llm = LlmClient::builder().config(config.llm.clone());
    if let Some(key) = config.llm.resolved_api_key()? {
        llm = llm.api_key(key);
    }
    let reconciler = Reconciler::new(Arc::new(llm.build()?));

    Ok(DiaryPipeline::new(
        Arc::new(profiles),
        Annotator::default(),
        reconciler,
        Arc::new(SqliteStoryRepository::new(db.pool().clone())),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    match first_line.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &first_line[..idx]),
        None => first_line.to_string(),
    }
}

fn print_annotations(annotations: &[serde_json::Value]) {
    if annotations.is_empty() {
        println!("  (none)");
    }
    for annotation in annotations {
        let field = |name: &str| {
            annotation
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or("?")
                .to_string()
        };
        println!("  {} - {}", field("entity"), field("relationship"));
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_annotate(
    personal_id: i64,
    diary_entry: String,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = open_database(&config).await?;
    let pipeline = build_pipeline(&config, &db)?;

    let request = AnnotateRequest::new(diary_entry, personal_id);
    let result = pipeline.annotate(&request).await;
    db.close().await;
    let response = result?;

    if format == OutputFormat::Json {
        return print_json(&response);
    }
    print_annotated(&response, quiet);
    Ok(())
}

fn print_annotated(response: &AnnotateResponse, quiet: bool) {
    if quiet {
        println!("{}", response.story_id);
        return;
    }
    println!("Story {} saved.", response.story_id);
    println!();
    println!("{}", response.annotated_story);
    println!();
    println!("Annotations:");
    print_annotations(&response.annotations);
}

async fn cmd_stories(
    stories: &dyn StoryRepository,
    action: StoryAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        StoryAction::List => {
            let all = stories.list().await?;
            if format == OutputFormat::Json {
                return print_json(&all);
            }
            if all.is_empty() {
                if !quiet {
                    println!("No stories found.");
                    println!("\nCreate one with: diarist annotate --personal-id <ID> --file <PATH>");
                }
            } else {
                if !quiet {
                    println!("Stories:");
                }
                for story in all {
                    println!(
                        "  {} - {} - {}",
                        story.id,
                        story.created_at.format("%Y-%m-%d %H:%M:%S"),
                        preview(&story.diary_text, 60)
                    );
                }
            }
        }
        StoryAction::Show { id } => {
            let story = stories
                .get(id)
                .await?
                .ok_or(diarist_core::Error::StoryNotFound(id))?;
            if format == OutputFormat::Json {
                return print_json(&story);
            }
            print_story(&story);
        }
        StoryAction::Count => {
            let count = stories.count().await?;
            if format == OutputFormat::Json {
                return print_json(&serde_json::json!({ "count": count }));
            }
            println!("{}", count);
        }
        StoryAction::Delete { id, force } => {
            if !force && !quiet {
                println!("Warning: This will permanently delete story {}.", id);
                println!("Use --force to confirm deletion.");
                return Ok(());
            }
            if !stories.delete(id).await? {
                return Err(diarist_core::Error::StoryNotFound(id).into());
            }
            if !quiet {
                println!("Story {} deleted.", id);
            }
        }
    }
    Ok(())
}

fn print_story(story: &Story) {
    let subject = story
        .personal_data
        .get("full_name")
        .and_then(|v| v.as_str())
        .unwrap_or("(unknown)");

    println!("Story: {}", story.id);
    println!("  Subject: {}", subject);
    println!("  Created: {}", story.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
    println!("Diary entry:");
    println!("{}", story.diary_text);
    println!();
    println!("Annotated story:");
    println!("{}", story.annotated_story);
    println!();
    println!("Annotations:");
    print_annotations(&story.annotations);
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Diarist Health Check");
        println!("====================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            if !quiet {
                println!("[!!] Configuration: Error - {:#}", e);
                println!();
                println!("Some checks failed. See above for details.");
            }
            return Ok(());
        }
    };

    // API key is optional for local model hosts
    match config.llm.redacted_api_key() {
        Ok(Some(redacted)) => {
            if !quiet {
                println!("[OK] API Key: Configured ({})", redacted);
            }
        }
        Ok(None) => {
            if !quiet {
                println!("[--] API Key: Not set (set {} if your host needs one)", API_KEY_ENV);
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] API Key: Error - {}", e);
            }
        }
    }

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: Error - {}", e),
        }
    }

    // Check database
    match open_database(&config).await {
        Ok(db) => {
            match db.health_check().await {
                Ok(()) => {
                    let count = SqliteStoryRepository::new(db.pool().clone())
                        .count()
                        .await
                        .unwrap_or_default();
                    if !quiet {
                        println!("[OK] Database: Connected");
                        println!("     Path: {}", db.path().display());
                        println!("     Stories: {}", count);
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Database: Health check failed - {}", e);
                    }
                }
            }
            db.close().await;
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Failed to initialize - {:#}", e);
            }
        }
    }

    // Check profile service
    let profile_check = match HttpProfileClient::new(&config.profile) {
        Ok(client) => client.health_check().await,
        Err(e) => Err(e),
    };
    match profile_check {
        Ok(()) => {
            if !quiet {
                println!("[OK] Profile service: {}", config.profile.base_url);
            }
        }
        Err(e) => {
            all_ok = false;
            warn!(error = %e, "Profile service unreachable");
            if !quiet {
                println!("[!!] Profile service: {}", e);
            }
        }
    }

    // Check completion service
    let llm_check = match LlmClient::new(config.llm.clone()) {
        Ok(client) => client.health_check().await,
        Err(e) => Err(e),
    };
    match llm_check {
        Ok(()) => {
            if !quiet {
                println!("[OK] Completion service: {} ({})", config.llm.base_url, config.llm.model);
            }
        }
        Err(e) => {
            all_ok = false;
            warn!(error = %e, "Completion service unreachable");
            if !quiet {
                println!("[!!] Completion service: {}", e);
            }
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
