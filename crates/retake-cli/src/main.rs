//! retake command-line front end.
//!
//! Edits projects in the local SQLite store. Every command prints JSON on
//! stdout; logs go to stderr (`RUST_LOG` controls the level).
//!
//! Usage:
//!   retake --user <uuid> project create "My podcast" --media audio
//!   retake --user <uuid> block list <project>
//!   retake --user <uuid> block add <project> <anchor-block> --placement before
//!   retake --user <uuid> export <project> --current-only -o notes.txt
//!
//! `--user` falls back to `RETAKE_USER`; `--db` and `--config` fall back to
//! `RETAKE_DB` and `RETAKE_CONFIG`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use retake_doc::{ExportScope, NewBlockId, NewCurrentAlternativeId};
use retake_store::{SnapshotRepository, StoreConfig, StoreError};
use retake_types::{MediaType, UserId};

const USER_ENV: &str = "RETAKE_USER";

/// Arrange projects from blocks of competing takes.
#[derive(Parser, Debug)]
#[command(name = "retake")]
#[command(about = "Edit retake projects: blocks, alternatives and exports")]
struct Cli {
    /// Config file (RON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overriding the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Acting user id (canonical UUID)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, list and manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Edit the block sequence of a project
    #[command(subcommand)]
    Block(BlockCommand),

    /// Edit the alternatives of a block
    #[command(subcommand)]
    Alt(AltCommand),

    /// Export block and alternative descriptions as text
    Export(ExportArgs),

    /// Show the effective configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    Create {
        name: String,
        /// audio or video
        #[arg(long, default_value = "audio")]
        media: String,
    },
    List,
    Show {
        project: String,
    },
    Rename {
        project: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        project: String,
    },
}

#[derive(Subcommand, Debug)]
enum BlockCommand {
    List {
        project: String,
    },
    /// Insert a new block next to an existing one
    Add {
        project: String,
        anchor: String,
        #[arg(long, default_value = "after")]
        placement: String,
    },
    Remove {
        project: String,
        block: String,
    },
    /// Move a block; the index counts blocks with this one taken out
    Move {
        project: String,
        block: String,
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
    Update {
        project: String,
        block: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Alternative to make current
        #[arg(long)]
        current: String,
    },
    Disable {
        project: String,
        block: String,
    },
    Enable {
        project: String,
        block: String,
    },
}

#[derive(Subcommand, Debug)]
enum AltCommand {
    List {
        project: String,
        block: String,
    },
    Add {
        project: String,
        block: String,
    },
    Remove {
        project: String,
        block: String,
        alternative: String,
    },
    Update {
        project: String,
        block: String,
        alternative: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ExportArgs {
    project: String,
    /// Only each block's current alternative
    #[arg(long)]
    current_only: bool,
    /// Write the text here instead of printing JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let kind = e.downcast_ref::<StoreError>().map(StoreError::kind);
        match kind {
            Some(kind) => eprintln!("error ({kind}): {e:#}"),
            None => eprintln!("error: {e:#}"),
        }
        let code = match kind {
            Some(kind) if kind.is_caller_error() => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = StoreConfig::resolve(cli.config.as_deref())
        .context("loading configuration")?
        .with_database_override(cli.db);

    if let Command::Config(ConfigCommand::Show) = cli.command {
        print!("{}", config.to_ron()?);
        println!();
        return Ok(());
    }

    let owner = resolve_user(cli.user)?;
    let repo = SnapshotRepository::open(config).context("opening project database")?;
    tracing::debug!(db = %repo.database_path().display(), user = %owner, "ready");

    match cli.command {
        Command::Project(cmd) => project(&repo, owner, cmd),
        Command::Block(cmd) => block(&repo, owner, cmd),
        Command::Alt(cmd) => alt(&repo, owner, cmd),
        Command::Export(args) => export(&repo, owner, args),
        Command::Config(_) => Ok(()),
    }
}

fn resolve_user(flag: Option<String>) -> Result<UserId> {
    let raw = flag
        .or_else(|| std::env::var(USER_ENV).ok())
        .with_context(|| format!("no user given; pass --user or set {USER_ENV}"))?;
    UserId::parse_canonical(&raw).with_context(|| format!("user id {raw:?} is not a canonical UUID"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn project(repo: &SnapshotRepository, owner: UserId, cmd: ProjectCommand) -> Result<()> {
    match cmd {
        ProjectCommand::Create { name, media } => {
            let media_type = MediaType::from_str(&media)
                .with_context(|| format!("unknown media type {media:?}; use audio or video"))?;
            print_json(&repo.create_project(owner, &name, media_type)?)
        }
        ProjectCommand::List => print_json(&repo.list_projects(owner)?),
        ProjectCommand::Show { project } => print_json(&repo.project_details(&project, owner)?),
        ProjectCommand::Rename {
            project,
            name,
            description,
        } => print_json(&repo.update_project(&project, owner, &name, description.as_deref())?),
        ProjectCommand::Delete { project } => {
            repo.delete_project(&project, owner)?;
            print_json(&serde_json::json!({ "deleted": project }))
        }
    }
}

fn block(repo: &SnapshotRepository, owner: UserId, cmd: BlockCommand) -> Result<()> {
    match cmd {
        BlockCommand::List { project } => print_json(&repo.list_blocks(&project, owner)?),
        BlockCommand::Add {
            project,
            anchor,
            placement,
        } => {
            let new_block_id = repo.add_block(&project, owner, &anchor, &placement)?;
            print_json(&NewBlockId { new_block_id })
        }
        BlockCommand::Remove { project, block } => {
            let new_block_id = repo.remove_block(&project, owner, &block)?;
            print_json(&NewBlockId { new_block_id })
        }
        BlockCommand::Move {
            project,
            block,
            index,
        } => {
            repo.move_block(&project, owner, &block, index)?;
            print_json(&repo.list_blocks(&project, owner)?)
        }
        BlockCommand::Update {
            project,
            block,
            name,
            description,
            current,
        } => {
            repo.update_block(
                &project,
                owner,
                &block,
                &name,
                description.as_deref(),
                &current,
            )?;
            print_json(&repo.list_blocks(&project, owner)?)
        }
        BlockCommand::Disable { project, block } => {
            repo.set_block_disabled(&project, owner, &block, true)?;
            print_json(&repo.list_blocks(&project, owner)?)
        }
        BlockCommand::Enable { project, block } => {
            repo.set_block_disabled(&project, owner, &block, false)?;
            print_json(&repo.list_blocks(&project, owner)?)
        }
    }
}

fn alt(repo: &SnapshotRepository, owner: UserId, cmd: AltCommand) -> Result<()> {
    match cmd {
        AltCommand::List { project, block } => {
            print_json(&repo.list_alternatives(&project, owner, &block)?)
        }
        AltCommand::Add { project, block } => {
            let new_current_alternative_id = repo.add_alternative(&project, owner, &block)?;
            print_json(&NewCurrentAlternativeId {
                new_current_alternative_id,
            })
        }
        AltCommand::Remove {
            project,
            block,
            alternative,
        } => {
            let new_current_alternative_id =
                repo.remove_alternative(&project, owner, &block, &alternative)?;
            print_json(&NewCurrentAlternativeId {
                new_current_alternative_id,
            })
        }
        AltCommand::Update {
            project,
            block,
            alternative,
            name,
            description,
        } => {
            repo.update_alternative(
                &project,
                owner,
                &block,
                &alternative,
                &name,
                description.as_deref(),
            )?;
            print_json(&repo.list_alternatives(&project, owner, &block)?)
        }
    }
}

fn export(repo: &SnapshotRepository, owner: UserId, args: ExportArgs) -> Result<()> {
    let scope = if args.current_only {
        ExportScope::CurrentOnly
    } else {
        ExportScope::AllAlternatives
    };
    let export = repo.export_descriptions(&args.project, owner, scope)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &export.body)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote export");
            print_json(&serde_json::json!({
                "fileName": export.file_name,
                "path": path,
            }))
        }
        None => print_json(&serde_json::json!({
            "fileName": export.file_name,
            "body": export.body,
        })),
    }
}
