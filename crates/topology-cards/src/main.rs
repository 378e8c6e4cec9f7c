//! topology-cards: load a topology scope and print its cards
//!
//! Plays the part of the dashboard's cards page: takes the same query
//! parameters the page URL carries, loads the scope through the view
//! controller, applies the stored (or given) sort preference and prints the
//! result.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

use config::Config;
use topology_client::{
    CardSize, JsonFileStorage, MemoryStorage, Notice, PageQuery, PreferenceStorage, Preferences,
    SortOrder, TopologyClient, TopologySnapshot, TopologyView,
};

#[derive(Parser)]
#[command(name = "topology-cards")]
#[command(about = "Load a topology scope and print its cards")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "topology-cards.toml")]
    config: PathBuf,

    /// Component to show the children of (global list when omitted)
    #[arg(long)]
    id: Option<String>,

    /// Page query string, e.g. "type=Pod&team=ops&showHiddenComponents=no"
    #[arg(short, long, default_value = "")]
    query: String,

    /// Sort key to select and remember
    #[arg(long)]
    sort_by: Option<String>,

    /// Sort direction to select and remember
    #[arg(long)]
    sort_order: Option<SortOrder>,

    /// Card width to remember
    #[arg(long)]
    card_size: Option<CardSize>,

    /// Print the cards as JSON
    #[arg(long)]
    json: bool,

    /// Canary checker URL (overrides config file)
    #[arg(long, env = "TOPOLOGY_CANARY_CHECKER_URL")]
    canary_checker_url: Option<String>,

    /// Incident commander URL (overrides config file)
    #[arg(long, env = "TOPOLOGY_INCIDENT_COMMANDER_URL")]
    incident_commander_url: Option<String>,

    /// Preference file (overrides config file)
    #[arg(long, env = "TOPOLOGY_PREFERENCES_PATH")]
    preferences: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("topology_cards=info".parse()?)
                .add_directive("topology_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(url) = cli.canary_checker_url {
        config.backends.canary_checker_url = url;
    }
    if let Some(url) = cli.incident_commander_url {
        config.backends.incident_commander_url = url;
    }
    if let Some(path) = cli.preferences {
        config.preferences.path = Some(path);
    }

    info!("Canary checker: {}", config.backends.canary_checker_url);

    let storage: Arc<dyn PreferenceStorage> = match &config.preferences.path {
        Some(path) => {
            info!("Preferences: {}", path.display());
            Arc::new(JsonFileStorage::open(path))
        }
        None => {
            warn!("no preference location available, preferences will not persist");
            Arc::new(MemoryStorage::new())
        }
    };

    let client = TopologyClient::new(config.backends.clone())?;
    let view = TopologyView::new(client, Preferences::new(storage));
    let mut notices = view.notices();

    if let Some(size) = cli.card_size {
        view.preferences().save_card_width(size)?;
    }

    let page = PageQuery::parse(&cli.query);
    // sort params in the query act as a selection, same as the flags
    let sort_by = cli.sort_by.or_else(|| page.sort_by.clone());
    let sort_order = cli
        .sort_order
        .or_else(|| page.sort_order.as_deref().and_then(|s| s.parse().ok()));

    let result = view.load(cli.id.as_deref(), page).await;
    drain_notices(&mut notices);
    if let Err(e) = result {
        if e.is_network() {
            warn!(
                "could not reach {}; check --canary-checker-url",
                config.backends.canary_checker_url
            );
        }
        return Err(e.into());
    }

    if let Some(sort_by) = &sort_by {
        view.set_sort_by(sort_by)?;
    }
    if let Some(order) = sort_order {
        view.set_sort_order(order)?;
    }

    let Some(snapshot) = view.snapshot() else {
        anyhow::bail!("topology was not loaded");
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.sorted)?);
    } else {
        print_cards(&snapshot, view.preferences().get_card_width());
    }

    Ok(())
}

fn drain_notices(notices: &mut tokio::sync::broadcast::Receiver<Notice>) {
    loop {
        match notices.try_recv() {
            Ok(Notice::Warning(anomaly)) => eprintln!("warning: {}", anomaly),
            Ok(Notice::Error(message)) => eprintln!("error: {}", message),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

fn print_cards(snapshot: &TopologySnapshot, size: CardSize) {
    println!(
        "# sorted by {} {} ({} cards, {} view)",
        snapshot.sort_by,
        snapshot.sort_order,
        snapshot.sorted.len(),
        size
    );
    println!("# ?{}", snapshot.page.to_query_string());

    if snapshot.sorted.is_empty() {
        println!("There are no components matching this criteria");
        return;
    }

    for node in &snapshot.sorted {
        let headline: Vec<String> = node
            .headline_properties()
            .filter_map(|p| {
                let value = match p.sort_value()? {
                    topology_client::PropertyValue::Bool(b) => b.to_string(),
                    topology_client::PropertyValue::Number(n) => n.to_string(),
                    topology_client::PropertyValue::Text(t) => t,
                };
                Some(format!("{}={}{}", p.display_label(), value, p.unit.as_deref().unwrap_or("")))
            })
            .collect();

        println!(
            "{:<10} {:<40} {:<24} {}",
            node.status.as_str(),
            node.display_name().unwrap_or(&node.id),
            node.node_type.as_deref().unwrap_or("-"),
            headline.join(" ")
        );
    }
}
