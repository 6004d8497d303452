//! REST data source for the hosted backend service.
//!
//! Speaks the service's PostgREST-style row API and its object storage
//! API. Change notifications are produced client-side: one poll loop per
//! subscribed table fingerprints the table body and notifies on change.
//! The loop starts with the first subscriber and stops after the last one
//! unsubscribes.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};
use url::Url;

use super::{ChannelRegistry, DataSource, Filter, RowQuery, SourceError, Subscription};

/// Configuration for [`RestSource`].
#[derive(Debug, Clone)]
pub struct RestSourceConfig {
    /// Root of the hosted service (the part before `/rest/v1`).
    pub base_url: Url,

    /// Service API key, sent as both `apikey` and bearer token.
    pub api_key: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Cadence of the change-detection poll behind subscriptions.
    pub poll_interval: Duration,
}

impl RestSourceConfig {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(15),
        }
    }
}

pub struct RestSource {
    client: Client,
    config: RestSourceConfig,
    registry: Arc<ChannelRegistry>,
    pollers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl RestSource {
    pub fn new(config: RestSourceConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| SourceError::Config("API key contains invalid characters".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| SourceError::Config("API key contains invalid characters".to_string()))?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            config,
            registry: Arc::new(ChannelRegistry::default()),
            pollers: Mutex::new(HashMap::new()),
        })
    }

    fn endpoint(&self, segments: &str) -> Result<Url, SourceError> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, segments))
            .map_err(|e| SourceError::InvalidUrl(e.to_string()))
    }

    fn table_url(&self, table: &str) -> Result<Url, SourceError> {
        self.endpoint(&format!("rest/v1/{}", table))
    }

    fn object_url(&self, bucket: &str, path: &str) -> Result<Url, SourceError> {
        self.endpoint(&format!("storage/v1/object/{}/{}", bucket, path))
    }

    fn public_object_url(&self, bucket: &str, path: &str) -> Result<Url, SourceError> {
        self.endpoint(&format!("storage/v1/object/public/{}/{}", bucket, path))
    }

    /// Translate a [`RowQuery`] into the service's query-string dialect.
    fn query_params(query: &RowQuery) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];

        for filter in &query.filters {
            match filter {
                Filter::Eq(column, value) => {
                    params.push((column.clone(), format!("eq.{}", value)));
                }
                Filter::Contains(column, needle) => {
                    params.push((column.clone(), format!("ilike.*{}*", needle)));
                }
                Filter::AnyOf(column, values) => {
                    params.push((column.clone(), format!("in.({})", values.join(","))));
                }
            }
        }

        if let Some(order) = &query.order {
            let direction = if order.descending { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(SourceError::Service { status, message })
    }

    /// Start the change poll for a table unless one is already running.
    fn ensure_poller(&self, table: &str) {
        let mut pollers = self.pollers.lock().expect("poller map poisoned");
        if let Some(handle) = pollers.get(table) {
            if !handle.is_finished() {
                return;
            }
        }

        let url = match self.table_url(table) {
            Ok(url) => url,
            Err(e) => {
                // The subscription stays silent; the view keeps its
                // statically-fetched data.
                warn!("Cannot watch {} for changes: {}", table, e);
                return;
            }
        };

        let handle = tokio::spawn(poll_table(
            self.client.clone(),
            url,
            table.to_string(),
            Arc::clone(&self.registry),
            self.config.poll_interval,
        ));
        pollers.insert(table.to_string(), handle);
    }
}

#[async_trait]
impl DataSource for RestSource {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn fetch_all(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>, SourceError> {
        let url = self.table_url(table)?;
        let response = self
            .client
            .get(url)
            .query(&Self::query_params(query))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }

    async fn update(
        &self,
        table: &str,
        query: &RowQuery,
        patch: Value,
    ) -> Result<(), SourceError> {
        let url = self.table_url(table)?;
        // Filters only; the row body is not echoed back.
        let params: Vec<(String, String)> = Self::query_params(query)
            .into_iter()
            .filter(|(key, _)| key != "select")
            .collect();

        let response = self
            .client
            .patch(url)
            .header("Prefer", "return=minimal")
            .query(&params)
            .json(&patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn subscribe(&self, table: &str) -> Subscription {
        let subscription = self.registry.subscribe(table);
        self.ensure_poller(table);
        subscription
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SourceError> {
        let url = self.object_url(bucket, path)?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;

        Ok(self.public_object_url(bucket, path)?.to_string())
    }

    async fn delete_object(&self, bucket: &str, path: &str) -> Result<(), SourceError> {
        let url = self.object_url(bucket, path)?;
        let response = self.client.delete(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SourceError> {
        let url = self.endpoint("rest/v1/")?;
        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Data service health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// Change-detection loop for one table.
///
/// The first successful poll only establishes the baseline; subscribers
/// already run their initial fetch themselves. A failed poll tick is
/// equivalent to "no update occurred this tick".
async fn poll_table(
    client: Client,
    url: Url,
    table: String,
    registry: Arc<ChannelRegistry>,
    every: Duration,
) {
    let mut ticker = interval(every);
    let mut last_fingerprint: Option<u64> = None;

    loop {
        ticker.tick().await;

        if !registry.has_subscribers(&table) {
            debug!("Stopping change poll for {} (no subscribers left)", table);
            return;
        }

        let body = match client.get(url.clone()).query(&[("select", "*")]).send().await {
            Ok(response) if response.status().is_success() => response.bytes().await.ok(),
            Ok(response) => {
                debug!(
                    "Change poll for {} got {}; treating as no change",
                    table,
                    response.status()
                );
                None
            }
            Err(e) => {
                debug!("Change poll for {} failed: {}", table, e);
                None
            }
        };

        let Some(body) = body else { continue };
        let current = fingerprint(&body);

        match last_fingerprint {
            None => last_fingerprint = Some(current),
            Some(previous) if previous != current => {
                last_fingerprint = Some(current);
                debug!("Change detected in {}", table);
                registry.notify(&table);
            }
            Some(_) => {}
        }
    }
}

fn fingerprint(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}
