mod app;
mod bulk;
mod cli;
mod config;
mod engine;
mod error;
mod github;
mod input;
mod models;
mod theme;
mod ui;
mod utils;

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use arboard::Clipboard;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{App, Worker};
use crate::config::Settings;
use crate::github::{DEFAULT_API_URL, GitHubClient, RepoCollection};
use crate::input::Command;
use crate::models::{
    BulkAction, FilterCriteria, LanguageFilter, Notification, RepoView, SortField, SortOrder,
};
use crate::theme::Theme;

#[derive(Parser)]
#[command(name = "ghclean")]
#[command(version)]
#[command(about = "Browse, filter and bulk unstar/delete your GitHub repositories")]
#[command(after_long_help = r#"CONFIGURATION
    ghclean reads settings from, in increasing priority:
      1. built-in defaults
      2. ~/.config/ghclean/ghclean.toml
      3. ./ghclean.toml
      4. GHCLEAN_* environment variables (e.g. GHCLEAN_PER_PAGE=100)

    The token comes from --token, github_token in the config, or GITHUB_TOKEN.
    Logging goes to log_file; set GHCLEAN_LOG=debug for more detail.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// GitHub personal access token (overrides config)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Which collection to show. `unstar` defaults to starred.
    #[arg(long, value_enum, global = true)]
    view: Option<RepoView>,

    /// Initial search term (name or description, case-insensitive)
    #[arg(long, global = true, default_value = "")]
    search: String,

    /// Initial language filter ("all" to disable)
    #[arg(long, global = true, default_value = "all")]
    language: String,

    #[arg(long, value_enum, global = true)]
    sort: Option<SortField>,

    #[arg(long, value_enum, global = true)]
    order: Option<SortOrder>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive view (default)
    Tui,
    /// Print the filtered, sorted list and exit
    List,
    /// Unstar repositories by full name (owner/repo)
    Unstar {
        #[arg(required = true)]
        names: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete repositories by full name (owner/repo). Needs the delete_repo scope.
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Store a token in the user config
    Login {
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token from the user config
    Logout,
}

/// `--view` wins; otherwise `unstar` looks at starred repositories and
/// everything else uses the configured default.
fn initial_view(cli: &Cli, configured: RepoView) -> RepoView {
    match (cli.view, &cli.command) {
        (Some(view), _) => view,
        (None, Some(Commands::Unstar { .. })) => RepoView::Starred,
        (None, _) => configured,
    }
}

fn init_logging(settings: &Settings, interactive: bool) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_env("GHCLEAN_LOG") {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("ghclean=info"),
    };

    match settings.log_path() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Could not open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // The terminal belongs to the UI, so without a log file there is nowhere to write.
        None if interactive => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Asks for a token on stdin when none is configured. An empty answer stops future prompts.
fn prompt_for_token(settings: &mut Settings) -> anyhow::Result<()> {
    if settings.github_token.is_some() || !settings.prompt_for_token {
        return Ok(());
    }
    let path = config::get_user_config_path()?;
    print!("No GitHub token configured. ");
    print!("Paste a token with repo and delete_repo scopes (empty to skip): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let token = line.trim();
    if token.is_empty() {
        config::disable_token_prompt(&path)?;
    } else {
        config::save_token(&path, token)?;
        settings.github_token = Some(token.to_string());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::new()?;

    match &cli.command {
        Some(Commands::Login { token }) => {
            let path = config::get_user_config_path()?;
            config::save_token(&path, token)?;
            println!("Token saved to {}", path.display());
            return Ok(());
        }
        Some(Commands::Logout) => {
            let path = config::get_user_config_path()?;
            config::clear_token(&path)?;
            println!("Token removed from {}", path.display());
            if std::env::var_os("GITHUB_TOKEN").is_some() {
                println!("GITHUB_TOKEN is still set in the environment");
            }
            return Ok(());
        }
        _ => {}
    }

    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    init_logging(&settings, interactive)?;

    if let Some(token) = &cli.token {
        settings.github_token = Some(token.clone());
    }
    prompt_for_token(&mut settings)?;
    let token = settings
        .github_token
        .clone()
        .context("No GitHub token. Use --token, GITHUB_TOKEN or `ghclean login --token ...`")?;

    let client = if settings.api_url == DEFAULT_API_URL {
        GitHubClient::new(token)
    } else {
        GitHubClient::with_base_url(token, settings.api_url.clone())
    };
    let view = initial_view(&cli, settings.default_view);
    let criteria = FilterCriteria {
        search_term: cli.search.clone(),
        language: LanguageFilter::parse(&cli.language),
    };
    let mut sort = settings.sort_spec();
    if let Some(field) = cli.sort {
        sort.field = field;
    }
    if let Some(order) = cli.order {
        sort.order = order;
    }
    let rt = Runtime::new()?;
    info!(?view, api = %client.base_url(), "starting");

    match cli.command {
        None | Some(Commands::Tui) => {
            run_tui(&rt, client, &settings, App::new(view, sort, criteria))
        }
        Some(Commands::List) => {
            let collection = fetch_collection(&rt, &client, view, &settings)?;
            print!("{}", cli::list(&collection, &criteria, sort));
            Ok(())
        }
        Some(Commands::Unstar { names, yes }) => {
            let collection = fetch_collection(&rt, &client, view, &settings)?;
            rt.block_on(cli::bulk(&client, &collection, BulkAction::Unstar, &names, yes))
        }
        Some(Commands::Delete { names, yes }) => {
            let collection = fetch_collection(&rt, &client, view, &settings)?;
            rt.block_on(cli::bulk(&client, &collection, BulkAction::Delete, &names, yes))
        }
        Some(Commands::Login { .. }) | Some(Commands::Logout) => Ok(()),
    }
}

fn fetch_collection(
    rt: &Runtime,
    client: &GitHubClient,
    view: RepoView,
    settings: &Settings,
) -> anyhow::Result<RepoCollection> {
    rt.block_on(client.fetch(view, settings.per_page, settings.max_pages))
        .map_err(|e| {
            if e.is_unauthorized() {
                anyhow::Error::new(e).context(
                    "GitHub rejected the token. Run `ghclean login --token ...` with a valid one",
                )
            } else {
                e.into()
            }
        })
}

fn run_tui(
    rt: &Runtime,
    client: GitHubClient,
    settings: &Settings,
    mut app: App,
) -> anyhow::Result<()> {
    let (worker, mut events) =
        Worker::new(client, rt.handle().clone(), settings.per_page, settings.max_pages);
    worker.fetch_user();
    worker.fetch(app.view);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let theme = Theme::default();

    let result = (|| -> anyhow::Result<()> {
        loop {
            while let Ok(app_event) = events.try_recv() {
                if let Some(view) = app.handle_event(app_event) {
                    worker.fetch(view);
                }
            }
            app.expire_snackbar(Instant::now());

            terminal.draw(|f| ui::render(f, &app, &theme))?;

            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key_event) = event::read()? {
                    if key_event.kind != KeyEventKind::Press {
                        continue;
                    }
                    match input::handle_key(key_event.code, key_event.modifiers, &mut app) {
                        Command::Quit => break,
                        Command::Fetch(view) => worker.fetch(view),
                        Command::RunBatch(dispatch) => {
                            info!(
                                action = %dispatch.action,
                                count = dispatch.full_names.len(),
                                "dispatching batch"
                            );
                            worker.run_batch(dispatch);
                        }
                        Command::CopyToClipboard(text) => {
                            match Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
                                Ok(()) => {
                                    app.notify(Notification::success("Copied URL to clipboard"))
                                }
                                Err(e) => {
                                    warn!("clipboard unavailable: {}", e);
                                    app.notify(Notification::error("Clipboard unavailable"));
                                }
                            }
                        }
                        Command::None => {}
                    }
                }
            }
        }
        Ok(())
    })();

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}
