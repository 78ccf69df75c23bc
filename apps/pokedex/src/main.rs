use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    routes::{HOME_ROUTE, POKEMON_ID_PARAM},
    search::normalize_term,
    Collaborators, HttpPokemonGateway, LifecycleRegistry, Navigator, RouteTable, Router,
    SearchController, SearchOutcome,
};
use tracing_subscriber::EnvFilter;

mod config;
mod console;
mod session;

use console::ConsoleAlerts;
use session::{DetailSession, Settled};

/// How long a detail view may take to settle after its last navigation.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "pokedex", about = "Look up pokemon from the terminal")]
struct Cli {
    /// Settings file; defaults to ./pokedex.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search by name or number and open the detail view on success.
    Search { term: String },
    /// Navigate the detail view through each id in order; the last one wins.
    Show {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Pause between navigations, in milliseconds.
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },
}

struct App {
    registry: Arc<LifecycleRegistry>,
    router: Arc<Router>,
    alerts: Arc<ConsoleAlerts>,
    collaborators: Collaborators,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = config::load_settings(cli.config.as_deref())
        .context("failed to load settings")?;
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let routes = RouteTable::new(&settings.detail_route, &settings.error_route)
        .context("invalid route settings")?;
    let gateway = HttpPokemonGateway::new(&settings.api_base_url, settings.request_timeout())
        .context("failed to build pokemon gateway")?;
    let router = Arc::new(Router::new(routes.clone(), HOME_ROUTE));
    let alerts = Arc::new(ConsoleAlerts::default());

    let app = App {
        registry: Arc::new(LifecycleRegistry::new()),
        collaborators: Collaborators::new(
            Arc::new(gateway),
            router.clone(),
            alerts.clone(),
            routes,
        ),
        router,
        alerts,
    };
    tracing::info!(api = %settings.api_base_url, "pokedex starting");

    match cli.command {
        Command::Search { term } => run_search(&app, &term).await,
        Command::Show { ids, interval_ms } => {
            run_show(&app, &ids, Duration::from_millis(interval_ms)).await
        }
    }
}

async fn run_search(app: &App, term: &str) -> Result<()> {
    let search = SearchController::new(&app.registry, app.collaborators.clone());
    search.set_term(term);

    let path = match search.submit().await {
        SearchOutcome::Navigated(path) => path,
        SearchOutcome::Ignored => bail!("nothing to search for"),
        other => bail!("search did not complete: {other:?}"),
    };
    search.teardown();

    let params = app.router.routes().match_path(&path);
    let Some(key) = params.get(POKEMON_ID_PARAM).map(str::to_string) else {
        bail!("search navigated to unexpected path {path}");
    };

    // The router is already sitting on the detail path, so mounting picks it up.
    let session = DetailSession::open(&app.registry, app.collaborators.clone(), &app.router);
    finish(app, session, &key).await
}

async fn run_show(app: &App, ids: &[String], interval: Duration) -> Result<()> {
    let keys = show_keys(ids);
    let Some(last) = keys.last().cloned() else {
        bail!("no pokemon id given");
    };

    let session = DetailSession::open(&app.registry, app.collaborators.clone(), &app.router);
    for (index, key) in keys.iter().enumerate() {
        if index > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        app.router.navigate_to(&app.router.routes().detail_path(key));
    }

    finish(app, session, &last).await
}

/// Route keys in the same normalized form the detail view matches against.
fn show_keys(ids: &[String]) -> Vec<String> {
    ids.iter().filter_map(|id| normalize_term(id)).collect()
}

async fn finish(app: &App, session: DetailSession, key: &str) -> Result<()> {
    let settled = session.settle(&app.router, key, SETTLE_TIMEOUT).await;
    let result = match &settled {
        Settled::Shown(pokemon) => {
            println!("{}", session.render(pokemon));
            Ok(())
        }
        Settled::Redirected => Err(anyhow::anyhow!(
            "could not load {key} ({}); redirected to {}",
            app.alerts.last().unwrap_or_else(|| "no alert raised".into()),
            app.router.current_path()
        )),
        Settled::Closed => Err(anyhow::anyhow!("detail view closed before {key} loaded")),
        Settled::TimedOut => Err(anyhow::anyhow!("timed out waiting for {key}")),
    };
    session.close().await;
    tracing::debug!(owners = app.registry.active_owners(), "pokedex done");
    result
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
