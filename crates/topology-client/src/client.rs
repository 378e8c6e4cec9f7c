//! HTTP client for the canary checker and incident commander APIs

use crate::error::{Result, TopologyError};
use crate::params::TopologyParams;
use crate::types::*;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can answer a topology query.
///
/// The view controller only depends on this, so it can run against a fake
/// source in tests.
#[async_trait]
pub trait TopologySource: Send + Sync {
    async fn fetch_topology(&self, params: &TopologyParams) -> Result<TopologyResponse>;
}

/// HTTP client for the topology backends
///
/// # Example
///
/// ```rust,no_run
/// use topology_client::{ClientConfig, TopologyClient, TopologyParams};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TopologyClient::new(ClientConfig {
///     canary_checker_url: "http://localhost:8080".into(),
///     ..Default::default()
/// })?;
///
/// let response = client
///     .fetch_topology(&TopologyParams::new().with_team("All"))
///     .await?;
/// println!("{} top-level components", response.components.len());
/// # Ok(())
/// # }
/// ```
pub struct TopologyClient {
    config: ClientConfig,
    client: Client,
}

impl TopologyClient {
    /// Create a new topology client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| TopologyError::Config(format!("invalid API key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TopologyError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ==================== Topology API ====================

    /// Fetch the topology for the given parameters.
    ///
    /// A `null` body normalizes to an empty response, so callers never have
    /// to check the top-level shape.
    pub async fn fetch_topology(&self, params: &TopologyParams) -> Result<TopologyResponse> {
        let url = self.topology_url(params);
        debug!(%url, "fetching topology");

        let response = self.client.get(&url).send().await?;
        let body: Option<TopologyResponse> = self.handle_response(response).await?;
        Ok(body.unwrap_or_default())
    }

    /// Fetch only the raw component list for the given parameters.
    pub async fn fetch_topology_without_unroll(
        &self,
        params: &TopologyParams,
    ) -> Result<Vec<TopologyNode>> {
        let url = self.topology_url(params);
        let response = self.client.get(&url).send().await?;
        let body: Option<TopologyResponse> = self.handle_response(response).await?;
        match body {
            Some(body) => Ok(body.components),
            None => {
                warn!(%url, "topology endpoint returned null, returning empty");
                Ok(Vec::new())
            }
        }
    }

    fn topology_url(&self, params: &TopologyParams) -> String {
        format!(
            "{}/api/topology?{}",
            self.config.canary_checker_url,
            params.to_query_string()
        )
    }

    // ==================== Components API ====================

    /// Hide or unhide a component
    pub async fn update_component_visibility(&self, component_id: &str, hide: bool) -> Result<()> {
        self.update_component(
            component_id,
            &ComponentPatch {
                hidden: Some(hide),
                ..Default::default()
            },
        )
        .await
    }

    /// Apply a partial update to a component
    pub async fn update_component(&self, component_id: &str, patch: &ComponentPatch) -> Result<()> {
        let url = format!(
            "{}/components?id=eq.{}",
            self.config.incident_commander_url,
            urlencoding::encode(component_id)
        );

        let response = self
            .client
            .patch(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(patch)
            .send()
            .await?;

        self.check_status(response).await?;
        Ok(())
    }

    /// Topology definition that created the component, if any
    pub async fn get_components_topology(&self, component_id: &str) -> Result<Option<TopologyRef>> {
        let url = format!(
            "{}/components?id=eq.{}&select=id,topologies(id,name)",
            self.config.incident_commander_url,
            urlencoding::encode(component_id)
        );

        let response = self.client.get(&url).send().await?;
        let rows: Option<Vec<ComponentTopologyRow>> = self.handle_response(response).await?;
        Ok(rows
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.topologies))
    }

    /// All component names, ordered by name
    pub async fn list_component_names(&self) -> Result<Vec<ComponentItem>> {
        let url = format!(
            "{}/component_names?order=name.asc",
            self.config.incident_commander_url
        );

        let response = self.client.get(&url).send().await?;
        let rows: Option<Vec<ComponentItem>> = self.handle_response(response).await?;
        Ok(rows.unwrap_or_default())
    }

    /// A single component name row
    pub async fn get_component_name(&self, component_id: &str) -> Result<Option<ComponentItem>> {
        let url = format!(
            "{}/component_names?id=eq.{}",
            self.config.incident_commander_url,
            urlencoding::encode(component_id)
        );

        let response = self.client.get(&url).send().await?;
        let rows: Option<Vec<ComponentItem>> = self.handle_response(response).await?;
        Ok(rows.and_then(|rows| rows.into_iter().next()))
    }

    /// Health checks attached to a component
    pub async fn get_component_checks(&self, component_id: &str) -> Result<Vec<ComponentHealthCheck>> {
        let url = format!(
            "{}/checks_by_component?component_id=eq.{}",
            self.config.incident_commander_url,
            urlencoding::encode(component_id)
        );

        let response = self.client.get(&url).send().await?;
        let rows: Option<Vec<ComponentHealthCheck>> = self.handle_response(response).await?;
        Ok(rows.unwrap_or_default())
    }

    // ==================== Health Check API ====================

    /// Summary of a single health check
    pub async fn get_health_check_summary(&self, check_id: &str) -> Result<Option<HealthCheckSummary>> {
        let url = format!(
            "{}/checks?id=eq.{}&select=id,name,icon,status,type",
            self.config.incident_commander_url,
            urlencoding::encode(check_id)
        );

        let response = self.client.get(&url).send().await?;
        let rows: Option<Vec<HealthCheckSummary>> = self.handle_response(response).await?;
        Ok(rows.and_then(|rows| rows.into_iter().next()))
    }

    /// Paginated status history of a health check, newest first
    pub async fn get_check_statuses(
        &self,
        check_id: &str,
        range: TimeRange,
        page: Pagination,
        filter: &CheckStatusFilter,
    ) -> Result<Page<CheckStatus>> {
        let from = Utc::now() - ChronoDuration::minutes(range.minutes());
        let from = from.to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut params = vec![
            format!("check_id=eq.{}", urlencoding::encode(check_id)),
            format!("time=gt.{}", urlencoding::encode(&from)),
            "order=time.desc".to_string(),
        ];
        if let Some(status) = filter.status {
            params.push(format!("status=eq.{}", status));
        }
        if let Some(duration) = filter.min_duration_ms {
            params.push(format!("duration=gte.{}", duration));
        }
        params.push(format!("limit={}", page.page_size));
        params.push(format!("offset={}", page.offset()));

        let url = format!(
            "{}/check_statuses?{}",
            self.config.canary_checker_db_url,
            params.join("&")
        );

        let response = self
            .client
            .get(&url)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let total = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let items: Option<Vec<CheckStatus>> = self.handle_response(response).await?;
        Ok(Page {
            items: items.unwrap_or_default(),
            total,
        })
    }

    // ==================== Helper Methods ====================

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TopologyError::Server {
                status,
                message: body,
            });
        }
        Ok(response)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<T>> {
        let response = self.check_status(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }
        let body = serde_json::from_slice(&bytes)?;
        Ok(body)
    }
}

#[async_trait]
impl TopologySource for TopologyClient {
    async fn fetch_topology(&self, params: &TopologyParams) -> Result<TopologyResponse> {
        TopologyClient::fetch_topology(self, params).await
    }
}

/// Total from a `Content-Range` header such as `0-49/1234` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}
