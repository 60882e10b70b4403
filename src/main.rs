use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use roadmap_board::board::{Board, BoardError, DropOutcome, EditOutcome};
use roadmap_board::config::{get_config_path, BoardConfig};
use roadmap_board::models::*;
use roadmap_board::store::RestStore;
use roadmap_board::{api, db, render};

#[derive(Parser)]
#[command(name = "roadmap")]
#[command(about = "Roadmap planning board over a hosted table backend")]
struct Cli {
    /// Backend project URL (overrides config file and ROADMAP_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Public API key (overrides config file and ROADMAP_ANON_KEY)
    #[arg(long, global = true)]
    anon_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a local SQLite-backed copy of the tables
    Serve {
        /// Port for the REST API
        #[arg(short, long, default_value = "54321")]
        port: u16,

        /// Database file (defaults to the user data directory)
        #[arg(long)]
        db: Option<PathBuf>,

        /// JSON file of teams, domains, sprints and items to import on start
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Print the board
    Board {
        #[command(flatten)]
        filters: FilterArgs,

        /// How many times to retry a failed load
        #[arg(long, default_value = "0")]
        retries: u32,
    },
    /// Create a roadmap item
    Add(AddArgs),
    /// Change fields of an item; each field is persisted separately
    Edit(EditArgs),
    /// Move an item onto a sprint
    Move {
        item: Uuid,
        /// Drop target; anything but a known sprint id is ignored
        target: String,
    },
    /// Move an item back to its team's backlog
    Backlog { item: Uuid },
    /// Delete an item
    Delete { item: Uuid },
    /// Show the resolved configuration, or save the given flags to the config file
    Config {
        /// Write --backend-url / --anon-key to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Only show items of these teams
    #[arg(long = "team")]
    teams: Vec<Uuid>,

    /// Only show items in these domains
    #[arg(long = "domain")]
    domains: Vec<Uuid>,

    /// Only show items whose domain belongs to these super-domains
    #[arg(long = "super-domain")]
    super_domains: Vec<Uuid>,
}

#[derive(Args)]
struct AddArgs {
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "planned")]
    status: ItemStatus,
    #[arg(long, default_value = "medium")]
    priority: Priority,
    #[arg(long, default_value = "medium")]
    effort: Effort,
    /// Due date as YYYY-MM-DD
    #[arg(long)]
    due: Option<NaiveDate>,
    #[arg(long)]
    team: Option<Uuid>,
    #[arg(long)]
    domain: Option<Uuid>,
    #[arg(long)]
    sprint: Option<Uuid>,
}

#[derive(Args)]
struct EditArgs {
    item: Uuid,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    domain: Option<Uuid>,
    #[arg(long)]
    priority: Option<Priority>,
    #[arg(long)]
    effort: Option<Effort>,
    #[arg(long)]
    status: Option<ItemStatus>,
    /// Due date as YYYY-MM-DD
    #[arg(long)]
    due: Option<NaiveDate>,
    #[arg(long, conflicts_with = "due")]
    clear_due: bool,
}

impl EditArgs {
    fn edits(self) -> Vec<ItemEdit> {
        [
            self.title.map(ItemEdit::Title),
            self.description.map(ItemEdit::Description),
            self.domain.map(|id| ItemEdit::DomainId(Some(id))),
            self.priority.map(ItemEdit::Priority),
            self.effort.map(ItemEdit::Effort),
            self.status.map(ItemEdit::Status),
            self.due.map(|date| ItemEdit::DueDate(Some(date))),
            self.clear_due.then_some(ItemEdit::DueDate(None)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Initialize tracing with output to stderr (board commands) or stdout (server)
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "roadmap_board=info,tower_http=info".into()),
    );

    if use_stderr {
        // Board output goes to stdout; keep logs out of it
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(!matches!(cli.command, Commands::Serve { .. }));

    let config = BoardConfig::load().with_overrides(cli.backend_url.clone(), cli.anon_key.clone());

    match cli.command {
        Commands::Serve { port, db, fixture } => serve(port, db, fixture).await?,
        Commands::Board { filters, retries } => {
            let board = connect(&config);
            let mut result = board.load().await;
            let mut attempts = 0;
            while result.is_err() && attempts < retries {
                attempts += 1;
                tracing::warn!("Retrying load ({}/{})", attempts, retries);
                result = board.retry_load().await;
            }
            if let Err(e) = result {
                print!("{}", board.read(render::render_board));
                return Err(e.into());
            }
            board.update(|state| {
                state.set_filters(FilterPatch {
                    teams: Some(filters.teams.into_iter().collect()),
                    domains: Some(filters.domains.into_iter().collect()),
                    super_domains: Some(filters.super_domains.into_iter().collect()),
                })
            });
            print!("{}", board.read(render::render_board));
        }
        Commands::Add(args) => {
            let board = loaded_board(&config).await?;
            let item = board
                .add_item(NewRoadmapItem {
                    title: args.title,
                    description: args.description,
                    status: args.status,
                    priority: args.priority,
                    effort: args.effort,
                    due_date: args.due,
                    team_id: args.team,
                    domain_id: args.domain,
                    sprint_id: args.sprint,
                })
                .await?;
            println!("Created {} '{}'", item.id, item.title);
        }
        Commands::Edit(args) => {
            let board = loaded_board(&config).await?;
            let item_id = args.item;
            let edits = args.edits();
            if edits.is_empty() {
                anyhow::bail!("Nothing to change; pass at least one field option");
            }
            for edit in edits {
                let field = edit.field();
                match board.edit_item(item_id, edit).await? {
                    EditOutcome::Persisted => println!("Updated {}", field),
                    EditOutcome::Unchanged => println!("{} unchanged", field),
                }
            }
        }
        Commands::Move { item, target } => {
            let board = loaded_board(&config).await?;
            match board.drop_item(item, &target).await? {
                DropOutcome::Moved => println!("Moved {} to sprint {}", item, target),
                DropOutcome::Unchanged => println!("{} is already in that sprint", item),
                DropOutcome::Ignored => println!("{} is not a sprint; nothing moved", target),
            }
        }
        Commands::Backlog { item } => {
            let board = loaded_board(&config).await?;
            match board.move_to_backlog(item).await? {
                EditOutcome::Persisted => println!("Moved {} to the backlog", item),
                EditOutcome::Unchanged => println!("{} is already in the backlog", item),
            }
        }
        Commands::Delete { item } => {
            let board = loaded_board(&config).await?;
            board.delete_item(item).await?;
            println!("Deleted {}", item);
        }
        Commands::Config { save } => {
            let path = get_config_path()?;
            if save {
                BoardConfig::try_load(&path)?
                    .with_overrides(cli.backend_url, cli.anon_key)
                    .save(&path)?;
                println!("Saved {}", path.display());
            } else {
                println!("Config file: {}", path.display());
                println!("Backend URL: {}", config.backend_url);
                println!(
                    "Anon key:    {}",
                    if config.anon_key.is_some() { "set" } else { "not set" }
                );
            }
        }
    }

    Ok(())
}

fn connect(config: &BoardConfig) -> Board<RestStore> {
    tracing::debug!("Using backend {}", config.backend_url);
    Board::new(RestStore::from_config(config))
}

async fn loaded_board(config: &BoardConfig) -> Result<Board<RestStore>, BoardError> {
    let board = connect(config);
    board.load().await?;
    Ok(board)
}

async fn serve(port: u16, path: Option<PathBuf>, fixture: Option<PathBuf>) -> anyhow::Result<()> {
    let db = match path {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    if let Some(fixture) = fixture {
        let content = std::fs::read_to_string(&fixture)
            .with_context(|| format!("Failed to read fixture {}", fixture.display()))?;
        let data: BoardData = serde_json::from_str(&content).context("Failed to parse fixture")?;
        db.import(&data)?;
    }

    let app = api::create_router(db);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Roadmap backend listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
