//! Topology cards pipeline for the operations dashboard
//!
//! Fetches topology components from the canary checker, decides which nodes
//! to show for a requested scope, derives the sortable fields, orders the
//! cards and remembers the user's sort choice between sessions.
//!
//! # Example
//!
//! ```rust,no_run
//! use topology_client::{
//!     ClientConfig, JsonFileStorage, PageQuery, Preferences, TopologyClient, TopologyView,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TopologyClient::new(ClientConfig {
//!     canary_checker_url: "http://localhost:8080".into(),
//!     ..Default::default()
//! })?;
//! let prefs = Preferences::new(JsonFileStorage::open("/tmp/topology-prefs.json"));
//!
//! let view = TopologyView::new(client, prefs);
//! view.load(Some("root-component"), PageQuery::parse("team=ops")).await?;
//!
//! if let Some(snapshot) = view.snapshot() {
//!     for node in &snapshot.sorted {
//!         println!("{} {}", node.status.as_str(), node.display_name().unwrap_or(&node.id));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod page;
pub mod params;
pub mod preference;
pub mod scope;
pub mod sort;
pub mod types;
pub mod view;

// Re-export main types
pub use client::{TopologyClient, TopologySource};
pub use error::{Result, TopologyError};
pub use page::PageQuery;
pub use params::{TopologyParams, ALL};
pub use preference::{CardSize, JsonFileStorage, MemoryStorage, PreferenceStorage, Preferences};
pub use scope::{resolve_displayed_nodes, DataAnomaly, Resolution};
pub use sort::{derive_sort_labels, sort_topology, SortLabel, SortOrder};
pub use types::*;
pub use view::{LoadOutcome, Notice, TopologySnapshot, TopologyView};
