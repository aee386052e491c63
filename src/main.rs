//! resume-rag CLI entry point

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use resume_rag::{
    commands::{
        cmd_add_job, cmd_add_resume, cmd_batch, cmd_clear, cmd_context, cmd_init, cmd_insights,
        cmd_knowledge, cmd_match, cmd_search, cmd_status, print_batch, print_clear_report,
        print_context, print_ingest_report, print_init_report, print_insights, print_knowledge,
        print_match, print_search_results, print_status, read_document, InitOptions,
        SearchTarget,
    },
    config::{Config, EmbeddingBackend, StoreBackend},
    metadata::UploadContext,
    progress::LogWriterFactory,
    rag::ContextRequest,
    ResumeRag,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "resume-rag")]
#[command(version, about = "Retrieval-augmented context for resume screening", long_about = None)]
struct Cli {
    /// Path to config file (or its directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration, collections and the knowledge base
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,

        /// Vector store backend
        #[arg(long, value_enum)]
        store: Option<StoreBackend>,

        /// Embedding backend
        #[arg(long, value_enum)]
        embedding: Option<EmbeddingBackend>,
    },

    /// Show system status and collection sizes
    Status,

    /// Store a resume (plain-text file)
    AddResume {
        /// Path to the resume text
        path: PathBuf,

        /// The resume was submitted together with a job description
        #[arg(long)]
        jd_match: bool,
    },

    /// Store a job description (plain-text file)
    AddJob {
        /// Path to the job description text
        path: PathBuf,

        /// File name of the resume submitted alongside it
        #[arg(long)]
        resume_filename: String,
    },

    /// Search one collection
    Search {
        /// Collection to search
        #[arg(value_enum)]
        target: SearchTarget,

        /// The search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Knowledge texts relevant to a query
    Knowledge {
        /// The search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Score a resume against a job description
    Match {
        /// Path to the resume text
        resume: PathBuf,

        /// Path to the job description text
        jd: PathBuf,
    },

    /// Knowledge insights for a resume
    Insights {
        /// Path to the resume text
        resume: PathBuf,
    },

    /// Rank resumes against a job description
    Batch {
        /// Path to the job description text
        jd: PathBuf,

        /// Paths to the resume texts
        #[arg(required = true)]
        resumes: Vec<PathBuf>,
    },

    /// Build the prompt context for an analysis
    Context {
        /// JSON file with the model's structured answer to score
        #[arg(long)]
        analytics: Option<PathBuf>,

        #[command(subcommand)]
        request: ContextCommand,
    },

    /// Drop all collections and reseed the knowledge base
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ContextCommand {
    /// Context for a standalone resume analysis
    Resume {
        /// Path to the resume text
        path: PathBuf,
    },

    /// Context for matching against a job description
    JdMatch {
        /// Path to the job description text
        path: PathBuf,
    },

    /// Context for a chat message about a resume
    Chat {
        /// The user's message
        message: String,

        /// Path to the resume under discussion
        #[arg(long)]
        resume: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(LogWriterFactory))
            .with(filter)
            .init();
    }

    // Handle commands that don't need an existing config
    match cli.command {
        Commands::Init {
            force,
            store,
            embedding,
        } => {
            let (base_dir, _) = resolve_config_path(cli.config.as_deref());
            let report = cmd_init(InitOptions {
                base_dir,
                force,
                store_backend: store,
                embedding_backend: embedding,
            })
            .await?;
            return emit(cli.json, &report, print_init_report);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "resume-rag", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Clear { yes: false } => {
            eprintln!("⚠️  This will delete ALL stored resumes and job descriptions!");
            eprintln!("Run with --yes to confirm.");
            std::process::exit(1);
        }
        _ => {}
    }

    let config = load_config(cli.config.as_deref())?;
    let rag = ResumeRag::connect(&config).await;

    match cli.command {
        Commands::Status => {
            let status = cmd_status(&config, &rag).await;
            emit(cli.json, &status, print_status)?;
        }

        Commands::AddResume { path, jd_match } => {
            let context = if jd_match {
                UploadContext::JdMatch
            } else {
                UploadContext::Resume
            };
            let report = cmd_add_resume(&rag, &path, context)
                .await
                .with_context(|| format!("Failed to add resume {}", path.display()))?;
            emit(cli.json, &report, print_ingest_report)?;
        }

        Commands::AddJob {
            path,
            resume_filename,
        } => {
            let report = cmd_add_job(&rag, &path, &resume_filename)
                .await
                .with_context(|| format!("Failed to add job description {}", path.display()))?;
            emit(cli.json, &report, print_ingest_report)?;
        }

        Commands::Search { target, query, k } => {
            let results = cmd_search(&rag, target, &query, k).await;
            emit(cli.json, &results, print_search_results)?;
        }

        Commands::Knowledge { query, k } => {
            let knowledge = cmd_knowledge(&rag, &query, k).await;
            emit(cli.json, &knowledge, |knowledge| {
                print_knowledge(&query, knowledge)
            })?;
        }

        Commands::Match { resume, jd } => {
            let outcome = cmd_match(&rag, &resume, &jd).await?;
            emit(cli.json, &outcome, print_match)?;
        }

        Commands::Insights { resume } => {
            let outcome = cmd_insights(&rag, &resume).await?;
            emit(cli.json, &outcome, print_insights)?;
        }

        Commands::Batch { jd, resumes } => {
            let outcome = cmd_batch(&rag, &jd, &resumes).await?;
            emit(cli.json, &outcome, print_batch)?;
        }

        Commands::Context { analytics, request } => {
            let request = context_request(request).await?;
            let analytics = match analytics {
                Some(path) => Some(load_analytics(&path)?),
                None => None,
            };
            let report = cmd_context(&rag, &request, analytics.as_ref()).await;
            emit(cli.json, &report, print_context)?;
        }

        Commands::Clear { .. } => {
            let outcome = cmd_clear(&rag).await.context("Failed to clear database")?;
            emit(cli.json, &outcome, print_clear_report)?;
        }

        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

/// Print `value` as pretty JSON or through the console printer
fn emit<T: Serialize>(json: bool, value: &T, print: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

/// Base directory and config file for `--config`, which may name either
/// the TOML file or the directory holding it.
fn resolve_config_path(path: Option<&Path>) -> (PathBuf, PathBuf) {
    match path {
        Some(path) if path.extension().is_some_and(|e| e == "toml") => {
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir);
            (base, path.to_path_buf())
        }
        Some(dir) => (dir.to_path_buf(), dir.join("config.toml")),
        None => {
            let base = Config::default_base_dir();
            let config = base.join("config.toml");
            (base, config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let (_, config_path) = resolve_config_path(path);

    if !config_path.exists() {
        eprintln!(
            "Config file not found: {}\nRun 'resume-rag init' first.",
            config_path.display()
        );
        std::process::exit(1);
    }

    Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))
}

fn load_analytics(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))
}

async fn context_request(command: ContextCommand) -> Result<ContextRequest> {
    let request = match command {
        ContextCommand::Resume { path } => ContextRequest::Resume {
            resume_text: read_document(&path).await?.text,
        },
        ContextCommand::JdMatch { path } => ContextRequest::JdMatch {
            jd_text: read_document(&path).await?.text,
        },
        ContextCommand::Chat { message, resume } => {
            let resume_text = match resume {
                Some(path) => read_document(&path).await?.text,
                None => String::new(),
            };
            ContextRequest::Chat {
                message,
                resume_text,
            }
        }
    };
    Ok(request)
}
