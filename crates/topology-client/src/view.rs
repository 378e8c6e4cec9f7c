//! Topology cards view controller
//!
//! Runs fetch -> scope -> labels -> sort and publishes the outcome:
//!
//! ```text
//! load(id, page)
//!     │
//!     ├─► TopologySource::fetch_topology
//!     │
//!     ├─► resolve_displayed_nodes ─► derive_sort_labels ─► sort_topology
//!     │
//!     ├─► watch channel   (latest TopologySnapshot)
//!     └─► broadcast       (Notice: warnings and errors)
//! ```
//!
//! Every load gets a generation number. A response is applied only if no
//! newer load was started meanwhile, so a slow stale response can never
//! overwrite newer state. A failed load leaves the last good snapshot in
//! place.

use crate::client::TopologySource;
use crate::error::Result;
use crate::page::PageQuery;
use crate::preference::{PreferenceStorage, Preferences};
use crate::scope::{resolve_displayed_nodes, DataAnomaly};
use crate::sort::{derive_sort_labels, sort_topology, SortLabel, SortOrder};
use crate::types::{TopologyNode, TopologyResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

const NOTICE_CAPACITY: usize = 64;

/// Everything needed to render the cards page for one load
#[derive(Debug, Clone, PartialEq)]
pub struct TopologySnapshot {
    /// Generation of the load that produced this snapshot
    pub generation: u64,
    pub requested_id: Option<String>,
    /// Page query after sort seeding; what the URL should be replaced with
    pub page: PageQuery,
    /// Full backend response (filter bar data lives here)
    pub response: TopologyResponse,
    /// First top-level node, shown in the details sidebar
    pub current: Option<TopologyNode>,
    /// Nodes to show, in backend order
    pub displayed: Vec<TopologyNode>,
    pub sort_labels: Vec<SortLabel>,
    pub sort_by: String,
    pub sort_order: SortOrder,
    /// `displayed` in the effective sort order
    pub sorted: Vec<TopologyNode>,
}

/// User-facing, non-blocking notification
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Warning(DataAnomaly),
    Error(String),
}

/// What happened to a load's response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was started before this one finished
    Stale,
}

pub struct TopologyView<S, P> {
    source: S,
    prefs: Preferences<P>,
    generation: AtomicU64,
    refreshes: AtomicU64,
    last_request: Mutex<Option<(Option<String>, PageQuery)>>,
    state_tx: watch::Sender<Option<Arc<TopologySnapshot>>>,
    notice_tx: broadcast::Sender<Notice>,
}

impl<S: TopologySource, P: PreferenceStorage> TopologyView<S, P> {
    pub fn new(source: S, prefs: Preferences<P>) -> Self {
        let (state_tx, _) = watch::channel(None);
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            source,
            prefs,
            generation: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            last_request: Mutex::new(None),
            state_tx,
            notice_tx,
        }
    }

    pub fn preferences(&self) -> &Preferences<P> {
        &self.prefs
    }

    /// Latest snapshot; `None` until the first successful load
    pub fn snapshot(&self) -> Option<Arc<TopologySnapshot>> {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<TopologySnapshot>>> {
        self.state_tx.subscribe()
    }

    /// Subscribe to warnings and errors
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    /// Number of explicit refreshes so far
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Load the cards for `id` (or the global list) with the given page state.
    pub async fn load(&self, id: Option<&str>, page: PageQuery) -> Result<LoadOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some((id.map(str::to_string), page.clone()));
        }

        let params = page.to_params(id);
        let response = match self.source.fetch_topology(&params).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, generation, "failed to load topology");
                if self.is_latest(generation) {
                    let _ = self.notice_tx.send(Notice::Error(e.to_string()));
                }
                return Err(e);
            }
        };

        if !self.is_latest(generation) {
            debug!(generation, "dropping stale topology response");
            return Ok(LoadOutcome::Stale);
        }

        let (snapshot, anomaly) = self.build_snapshot(generation, id, page, response);
        let applied = self.state_tx.send_if_modified(|state| {
            if self.is_latest(generation) {
                *state = Some(Arc::new(snapshot));
                true
            } else {
                false
            }
        });
        if !applied {
            debug!(generation, "dropping stale topology response");
            return Ok(LoadOutcome::Stale);
        }

        if let Some(anomaly) = anomaly {
            let _ = self.notice_tx.send(Notice::Warning(anomaly));
        }
        Ok(LoadOutcome::Applied)
    }

    /// Reload with the last requested parameters
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        let last = self.last_request.lock().ok().and_then(|last| last.clone());
        let (id, page) = last.unwrap_or_default();
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        info!(id = ?id, "refreshing topology");
        self.load(id.as_deref(), page).await
    }

    /// Persist a new sort key and re-sort the current snapshot
    pub fn set_sort_by(&self, value: &str) -> Result<()> {
        let labels = self
            .snapshot()
            .map(|s| s.sort_labels.clone())
            .unwrap_or_default();
        self.prefs.save_sort_by(value, &labels)?;
        self.resort();
        Ok(())
    }

    /// Persist a new sort order and re-sort the current snapshot
    pub fn set_sort_order(&self, order: SortOrder) -> Result<()> {
        self.prefs.save_sort_order(order)?;
        self.resort();
        Ok(())
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn resort(&self) {
        self.state_tx.send_if_modified(|state| {
            let Some(current) = state else {
                return false;
            };
            let sort_by = self.prefs.get_sort_by(&current.sort_labels);
            let sort_order = self.prefs.get_sort_order();
            if sort_by == current.sort_by && sort_order == current.sort_order {
                return false;
            }

            let mut next = (**current).clone();
            next.sorted = sort_topology(&next.displayed, &sort_by, sort_order);
            next.page.sort_by = Some(sort_by.clone());
            next.page.sort_order = Some(sort_order.to_string());
            next.sort_by = sort_by;
            next.sort_order = sort_order;
            *state = Some(Arc::new(next));
            true
        });
    }

    fn build_snapshot(
        &self,
        generation: u64,
        id: Option<&str>,
        mut page: PageQuery,
        response: TopologyResponse,
    ) -> (TopologySnapshot, Option<DataAnomaly>) {
        let resolution = resolve_displayed_nodes(&response.components, id);
        if let Some(anomaly) = &resolution.anomaly {
            warn!(%anomaly, "topology data anomaly");
        }

        let sort_labels = derive_sort_labels(&resolution.nodes);
        if page.seed_sort(&sort_labels, &self.prefs) {
            debug!(query = %page.to_query_string(), "seeded sort parameters from preferences");
        }

        let sort_by = self.prefs.get_sort_by(&sort_labels);
        let sort_order = self.prefs.get_sort_order();
        let sorted = sort_topology(&resolution.nodes, &sort_by, sort_order);

        let snapshot = TopologySnapshot {
            generation,
            requested_id: id.map(str::to_string),
            page,
            current: response.components.first().cloned(),
            response,
            displayed: resolution.nodes,
            sort_labels,
            sort_by,
            sort_order,
            sorted,
        };
        (snapshot, resolution.anomaly)
    }
}
