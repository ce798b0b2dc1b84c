//! Bloggit terminal client
//!
//! Reads, writes, and comments on Bloggit posts from the terminal, with a rich-text editor and a
//! debounced grammar check.

mod api;
mod app;
mod auth;
mod cli;
mod config;
mod editor;
mod errors;
mod grammar;
mod models;
mod notify;
mod routes;
mod session;
mod views;

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::ApiClient;
use app::{App, Page};
use auth::TokenStore;
use cli::{render, Command, Flow};
use config::Config;
use errors::AppError;
use grammar::IssueSet;
use notify::Notifier;
use session::SessionStore;

/// Application state shared by every view.
#[derive(Debug, Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub session: SessionStore,
    pub notifier: Notifier,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, tokens: TokenStore) -> Result<Self, AppError> {
        let api = ApiClient::new(&config, tokens)?;
        Ok(Self {
            session: SessionStore::new(api.clone()),
            notifier: Notifier::new(config.toast_ttl),
            api,
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging; stdout belongs to the pages
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!("Starting Bloggit client");
    tracing::info!("Backend: {}", config.api_base_url);
    tracing::info!("Token path: {:?}", config.token_path);

    let tokens = TokenStore::open(&config.token_path).await?;
    let state = AppState::new(config, tokens)?;
    let mut app = App::start(state).await;

    println!("{}", render::app(&app));
    println!("Type help for commands.");
    run(&mut app).await?;

    tracing::info!("Bye");
    Ok(())
}

/// Read commands until stdin closes or the user quits, redrawing the grammar panel whenever the
/// open editor's issues change.
async fn run(app: &mut App) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = app.grammar_updates();

    loop {
        prompt(app);

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = issues_changed(&mut updates) => {
                if let Page::Form(form) = app.page_mut() {
                    form.sync_marks();
                    println!();
                    print!("{}", render::grammar_panel(&**form));
                }
                continue;
            }
        };
        let Some(line) = line else {
            return Ok(());
        };
        if handle_line(app, &line).await == Flow::Quit {
            return Ok(());
        }
        updates = keep_subscription(updates, app.grammar_updates());
    }
}

/// Keep listening on the same receiver while the same editor stays open, so a result published
/// during a command is still seen. A new editor gets the new receiver.
fn keep_subscription(
    current: Option<watch::Receiver<IssueSet>>,
    latest: Option<watch::Receiver<IssueSet>>,
) -> Option<watch::Receiver<IssueSet>> {
    match (current, latest) {
        (Some(current), Some(latest)) if current.same_channel(&latest) => Some(current),
        (_, latest) => latest,
    }
}

async fn handle_line(app: &mut App, line: &str) -> Flow {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{}", e.message());
            return Flow::Continue;
        }
    };

    let show_help = command == Command::Help;
    let show_toolbar = command == Command::Toolbar;
    let flow = match cli::execute(app, command).await {
        Ok(flow) => flow,
        Err(e) => {
            tracing::debug!("Command failed: {}", e);
            println!("{}", e.message());
            Flow::Continue
        }
    };
    if flow == Flow::Quit {
        return flow;
    }

    print!("{}", render::toasts(&app.state().notifier.visible()));
    app.state().notifier.drain();
    if show_help {
        println!("{}", render::HELP);
    } else if show_toolbar {
        println!("{}", render::toolbar(&editor::Toolbar::standard()));
    } else {
        println!("{}", render::app(app));
    }
    flow
}

async fn issues_changed(updates: &mut Option<watch::Receiver<IssueSet>>) {
    if let Some(rx) = updates {
        if rx.changed().await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}

fn prompt(app: &App) {
    print!("{}> ", app.route());
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests;
