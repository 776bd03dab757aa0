use helix_rs::{HelixDB, HelixDBClient, HelixError};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::IdeaGraphConfig;

const INITIAL_RETRY_DELAY_MS: u64 = 100;
const MAX_RETRY_DELAY_MS: u64 = 10000;

#[derive(Debug, Error)]
pub enum HelixClientError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Helix error: {0}")]
    Helix(#[from] HelixError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Retry exhausted after {0} attempts: {1}")]
    RetryExhausted(u32, String),
}

impl HelixClientError {
    /// Connectivity-class failures degrade per the error taxonomy;
    /// everything else is a real query problem.
    pub fn is_connectivity(&self) -> bool {
        let s = self.to_string().to_lowercase();
        matches!(self, Self::Connection(_))
            || s.contains("connection refused")
            || s.contains("timed out")
            || s.contains("dns")
    }
}

/// Injected, shareable handle to the graph database. Each logical
/// operation is a named server-side query; the server executes one
/// named query atomically, which is the transaction boundary the
/// committer relies on.
pub struct HelixClient {
    inner: HelixDB,
    is_connected: AtomicBool,
    base_url: String,
    max_retries: u32,
}

impl HelixClient {
    pub fn new(host: &str, port: u16, max_retries: u32) -> Result<Self, HelixClientError> {
        let endpoint = format!("http://{}", host);
        let base_url = format!("http://{}:{}", host, port);

        let inner = <HelixDB as HelixDBClient>::new(Some(&endpoint), Some(port), None);

        info!("HelixClient created for {}", base_url);

        Ok(Self {
            inner,
            is_connected: AtomicBool::new(false),
            base_url,
            max_retries: max_retries.max(1),
        })
    }

    pub fn from_config(config: &IdeaGraphConfig) -> Result<Self, HelixClientError> {
        Self::new(&config.store_host, config.store_port, config.store_max_retries)
    }

    /// Run a named query with exponential backoff. Not-found responses
    /// are surfaced immediately; they are an answer, not a failure.
    pub async fn execute_query<T, P>(&self, query_name: &str, params: &P) -> Result<T, HelixClientError>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let mut last_error = None;
        let mut delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS);

        for attempt in 1..=self.max_retries {
            debug!("Executing query: {} (attempt {})", query_name, attempt);

            match self.inner.query::<P, T>(query_name, params).await {
                Ok(result) => {
                    self.is_connected.store(true, Ordering::Relaxed);
                    return Ok(result);
                }
                Err(e) => {
                    let err_str = e.to_string();

                    if err_str.contains("not found") || err_str.contains("No value") {
                        debug!("Query {} returned not found", query_name);
                        return Err(HelixClientError::NotFound(err_str));
                    }

                    debug!("Query {} failed (attempt {}): {}", query_name, attempt, err_str);
                    last_error = Some(err_str);

                    if attempt < self.max_retries {
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(Duration::from_millis(MAX_RETRY_DELAY_MS));
                    }
                }
            }
        }

        Err(HelixClientError::RetryExhausted(
            self.max_retries,
            last_error.unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }

    pub async fn execute_query_no_retry<T, P>(
        &self,
        query_name: &str,
        params: &P,
    ) -> Result<T, HelixClientError>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        self.inner.query::<P, T>(query_name, params).await.map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("not found") || err_str.contains("No value") {
                HelixClientError::NotFound(err_str)
            } else {
                HelixClientError::Query(err_str)
            }
        })
    }

    pub async fn health_check(&self) -> Result<(), HelixClientError> {
        match self
            .execute_query_no_retry::<serde_json::Value, _>("health", &serde_json::json!({}))
            .await
        {
            Ok(_) => Ok(()),
            // A 404 means the server is alive without a health query
            Err(HelixClientError::NotFound(_)) => {
                info!("Health check passed (server alive, no health query)");
                Ok(())
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("404") {
                    info!("Health check passed (server alive, no health query)");
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::Relaxed)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
