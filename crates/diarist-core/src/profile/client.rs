//! Profile service client
//!
//! Fetches `PersonalProfile` documents by numeric id from the profile
//! service (`GET {base_url}/profiles/{id}`). The request is bounded by a
//! short timeout; a slow profile service fails the pipeline quickly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ProfileConfig;
use crate::error::{Error, Result};

use super::PersonalProfile;

const SERVICE: &str = "profile service";

/// Source of personal profiles
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the profile with the given id
    async fn fetch(&self, personal_id: i64) -> Result<PersonalProfile>;
}

/// HTTP client for the profile service
#[derive(Debug, Clone)]
pub struct HttpProfileClient {
    http_client: HttpClient,
    base_url: String,
    timeout_secs: u64,
}

impl HttpProfileClient {
    /// Create a client from configuration
    pub fn new(config: &ProfileConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Base URL of the profile service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn profile_url(&self, personal_id: i64) -> String {
        format!("{}/profiles/{}", self.base_url, personal_id)
    }

    /// Check that the service answers HTTP at all; any status counts
    pub async fn health_check(&self) -> Result<()> {
        self.http_client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| Error::from_transport(SERVICE, self.timeout_secs, e))?;
        Ok(())
    }
}

#[async_trait]
impl ProfileSource for HttpProfileClient {
    async fn fetch(&self, personal_id: i64) -> Result<PersonalProfile> {
        let url = self.profile_url(personal_id);
        debug!(personal_id, url = %url, "Fetching personal profile");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::from_transport(SERVICE, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(personal_id, status = status.as_u16(), body = %body, "Profile fetch failed");
            return Err(Error::UpstreamUnavailable {
                service: SERVICE,
                status: Some(status.as_u16()),
                message: "Failed to fetch personal data".to_string(),
            });
        }

        let document: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                Error::Internal(format!("Invalid profile document: {}", e))
            } else {
                Error::from_transport(SERVICE, self.timeout_secs, e)
            }
        })?;

        PersonalProfile::from_value(document)
    }
}
