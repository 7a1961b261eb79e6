//! C64 Game of the Day
//!
//! Picks today's game from the catalog, records the pick in the play
//! history and drives the emulator lifecycle for it. Without a browser the
//! emulator runs against the in-memory document host.

mod tui;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gotd_config::{GotdConfig, RotationPolicy};
use gotd_emulator::mock::{MockDocument, MockRuntime};
use gotd_emulator::{EmulatorManager, EmulatorOptions, render_boot_page};
use gotd_launcher::logutil::escape_log;
use gotd_launcher::{GameManager, GameState, RatingService};
use gotd_library::{
    BundledCatalogStore, Clock, DirectoryCatalogStore, GameCatalog, GameCatalogStore, GameDatabase,
    GameHistoryManager, GameInfo, KeyValueHistoryStore, SystemClock, bundled_games,
};
use gotd_network::{ApiClient, HttpCatalogStore};
use gotd_storage::{JsonFileStore, KeyValueStore, get_or_create_user_id};

#[derive(Parser)]
#[command(name = "gotd", version, about = "C64 game of the day")]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State file holding history and user id
    #[arg(long)]
    state: Option<PathBuf>,

    /// Scan a directory of .d64 images for the catalog
    ///
    /// Ratings are still stored locally, in gotd-games.db next to the
    /// state file.
    #[arg(long, conflicts_with_all = ["db", "api"])]
    games_dir: Option<PathBuf>,

    /// SQLite catalog and ratings database
    #[arg(long, conflicts_with = "api")]
    db: Option<PathBuf>,

    /// Use the HTTP backend for catalog and ratings
    #[arg(long)]
    api: bool,

    /// Rotate every minute instead of the configured policy
    #[arg(long)]
    dev_rotation: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show today's game (default)
    Today,
    /// List the catalog
    List,
    /// Show the play history
    History,
    /// Clear the play history
    Reset,
    /// Rate today's game (0-5 stars)
    Rate { stars: i64 },
    /// Write a standalone page that boots today's game
    Page { out: PathBuf },
    /// Show the backend's own game of the day
    Server,
    /// Run today's game through the emulator lifecycle headlessly
    Play,
    /// Interactive terminal front end
    Tui,
}

/// Wired default instances
struct App {
    config: GotdConfig,
    manager: GameManager,
    ratings: RatingService,
    user_id: String,
    api: Option<Arc<ApiClient>>,
    db: Option<Arc<GameDatabase>>,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => GotdConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GotdConfig::load_default().context("loading config")?,
        };
        if cli.dev_rotation {
            config.rotation = RotationPolicy::development();
        }

        let state_file = cli
            .state
            .clone()
            .unwrap_or_else(|| config.storage.state_file.clone());
        let kv: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileStore::open(&state_file)
                .with_context(|| format!("opening state file {}", state_file.display()))?,
        );
        let user_id = get_or_create_user_id(kv.as_ref(), &config.storage.user_id_key)?;

        let history = Arc::new(GameHistoryManager::new(Arc::new(KeyValueHistoryStore::new(
            kv,
            config.storage.history_key.clone(),
        ))));

        let (store, ratings, api, db) = if cli.api {
            let client = Arc::new(ApiClient::new(&config.api).context("creating API client")?);
            let store: Arc<dyn GameCatalogStore> = Arc::new(HttpCatalogStore::new(client.clone()));
            (
                store,
                RatingService::Remote(client.clone()),
                Some(client),
                None,
            )
        } else {
            let db_path = cli
                .db
                .clone()
                .unwrap_or_else(|| sibling(&state_file, "gotd-games.db"));
            // A scanned directory supplies its own catalog; the database only keeps ratings
            let db = open_database(&db_path, cli.games_dir.is_none())?;

            let store: Arc<dyn GameCatalogStore> = match (&cli.games_dir, &cli.db) {
                (Some(dir), _) => Arc::new(DirectoryCatalogStore::new(dir)),
                (None, Some(_)) => db.clone(),
                (None, None) => Arc::new(BundledCatalogStore::default()),
            };
            (store, RatingService::Local(db.clone()), None, Some(db))
        };

        let runtime = Arc::new(MockRuntime::new());
        let document = Arc::new(
            MockDocument::new()
                .with_container(&config.emulator.container_id)
                .with_runtime(runtime.clone()),
        );
        let emulator = Arc::new(EmulatorManager::new(
            config.emulator.clone(),
            document,
            runtime,
        ));

        let manager = GameManager::new(GameCatalog::new(store), history, emulator)
            .with_clock(Arc::new(SystemClock))
            .with_rotation(config.rotation);

        Ok(Self {
            config,
            manager,
            ratings,
            user_id,
            api,
            db,
        })
    }

    /// Today's game or an error for an empty catalog
    async fn todays_game(&self) -> Result<GameInfo> {
        match self.manager.todays_game().await {
            Some(game) => Ok(game),
            None => bail!("no games available"),
        }
    }

    /// Boot page for `game`
    fn boot_page(&self, game: &GameInfo) -> String {
        let options = EmulatorOptions::from_config(&self.config.emulator, self.manager.game_url(game));
        render_boot_page(&self.config.emulator, &options, &game.name)
    }
}

/// Open the local database, seeding an empty one with the bundled games
fn open_database(path: &Path, seed: bool) -> Result<Arc<GameDatabase>> {
    let db = GameDatabase::open(path)
        .with_context(|| format!("opening database {}", path.display()))?;
    if seed {
        db.populate_with(&bundled_games())?;
    }
    Ok(Arc::new(db))
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

fn print_game(game: &GameInfo) {
    println!("{}", game.name);
    if let Some(description) = &game.description {
        println!("  {}", description);
    }
    let mut details = Vec::new();
    if let Some(year) = game.year {
        details.push(year.to_string());
    }
    details.extend(game.publisher.clone());
    details.extend(game.genre.clone());
    details.extend(game.players.clone());
    if !details.is_empty() {
        println!("  {}", details.join(" | "));
    }
    println!("  image: {}", game.image_path);
}

async fn run(app: App, command: Command) -> Result<()> {
    match command {
        Command::Today => {
            let game = app.todays_game().await?;
            print_game(&game);
            let average = app.ratings.average(&game.id).await;
            let mine = app.ratings.rating(&game.id, &app.user_id).await;
            println!("  rating: {}/5 (average {:.1})", mine, average);
        }
        Command::List => {
            for game in app.manager.available_games().await {
                println!("{:<28} {}", game.id, game.name);
            }
        }
        Command::History => {
            let history = app.manager.history();
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Command::Reset => {
            app.manager.reset_history();
            println!("History cleared");
        }
        Command::Rate { stars } => {
            let game = app.todays_game().await?;
            let stored = app.ratings.rate(&game.id, &app.user_id, stars).await?;
            println!("Rated {} {}/5", game.name, stored);
        }
        Command::Page { out } => {
            let game = app.todays_game().await?;
            std::fs::write(&out, app.boot_page(&game))
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {}", out.display());
        }
        Command::Server => {
            let game = match (&app.api, &app.db) {
                (Some(client), _) => client.game_of_the_day().await,
                (None, Some(db)) => db.game_of_the_day(SystemClock.today())?,
                (None, None) => bail!("no backend configured"),
            };
            print_game(&game);
        }
        Command::Play => {
            let _sub = app.manager.on_state_change(|state: GameState| {
                println!("state: {}", state.as_str());
            });
            let game = app.todays_game().await?;
            app.manager
                .start_game(&game)
                .await
                .with_context(|| format!("starting {}", game.name))?;
            app.manager.stop_game().await?;
        }
        Command::Tui => tui::run(app).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Command::Today);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // The terminal front end owns the screen
    if matches!(command, Command::Tui) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let app = App::new(&cli)?;
    info!("Game of the day for user {}", escape_log(&app.user_id));

    run(app, command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_games_dir_keeps_database_unseeded() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cli = Cli::parse_from(["gotd", "--games-dir", "/srv/c64", "list"]);
        let path = temp_dir.path().join("gotd-games.db");

        let db = open_database(&path, cli.games_dir.is_none()).unwrap();
        assert_eq!(db.game_count().unwrap(), 0);

        db.set_rating("luna", "user-1", 4).unwrap();
        assert_eq!(db.get_rating("luna", "user-1").unwrap(), 4);
    }

    #[test]
    fn test_default_database_is_seeded() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cli = Cli::parse_from(["gotd", "list"]);
        let path = temp_dir.path().join("gotd-games.db");

        let db = open_database(&path, cli.games_dir.is_none()).unwrap();
        assert_eq!(db.game_count().unwrap(), bundled_games().len() as i64);
    }

    #[test]
    fn test_sibling_of_bare_file_name() {
        assert_eq!(
            sibling(Path::new("state.json"), "gotd-games.db"),
            PathBuf::from("gotd-games.db")
        );
        assert_eq!(
            sibling(Path::new("/var/lib/gotd/state.json"), "gotd-games.db"),
            PathBuf::from("/var/lib/gotd/gotd-games.db")
        );
    }
}
