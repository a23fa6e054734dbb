//! Vendor HTTP client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, info};

use tales_models::{JobId, StatusSample, Vendor};
use tales_poller::StatusCheck;

use crate::config::VendorConfig;
use crate::error::{VendorError, VendorResult};
use crate::mapping::StatusMapping;

/// API version pinned for Runway requests.
pub const RUNWAY_API_VERSION: &str = "2024-11-06";

/// Client for one vendor's job API: submit a generation, then read its
/// status through the vendor's [`StatusMapping`].
#[derive(Debug, Clone)]
pub struct VendorClient {
    http: Client,
    config: VendorConfig,
    mapping: StatusMapping,
}

impl VendorClient {
    /// Create a new vendor client.
    pub fn new(config: VendorConfig) -> VendorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VendorError::Network)?;
        let mapping = StatusMapping::for_vendor(config.vendor);

        Ok(Self {
            http,
            config,
            mapping,
        })
    }

    /// Create from environment variables.
    pub fn from_env(vendor: Vendor) -> VendorResult<Self> {
        Self::new(VendorConfig::from_env(vendor)?)
    }

    /// Replace the status mapping (custom endpoints or self-hosted gateways).
    pub fn with_mapping(mut self, mapping: StatusMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn vendor(&self) -> Vendor {
        self.config.vendor
    }

    pub fn config(&self) -> &VendorConfig {
        &self.config
    }

    pub fn mapping(&self) -> &StatusMapping {
        &self.mapping
    }

    /// Submit a generation request and return the vendor's job id.
    ///
    /// `endpoint` is relative to the base URL. The body is passed through
    /// unchanged; prompt construction belongs to the caller.
    pub async fn submit(&self, endpoint: &str, body: &Value) -> VendorResult<JobId> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        debug!(vendor = %self.config.vendor, url = %url, "Submitting job");

        let response = self.authorize(self.http.post(&url)).json(body).send().await?;
        let body = Self::read_json(response).await?;
        let job_id = self.mapping.parse_job_id(&body)?;

        info!(vendor = %self.config.vendor, job_id = %job_id, "Job submitted");
        Ok(job_id)
    }

    /// Fetch and interpret the current status of a job.
    pub async fn fetch_status(&self, job_id: &JobId) -> VendorResult<StatusSample<Value, String>> {
        let url = self.mapping.status_url(&self.config.base_url, job_id);
        let response = self.authorize(self.http.get(&url)).send().await?;
        let body = Self::read_json(response).await?;
        self.mapping.parse_sample(&body)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key = &self.config.api_key;
        match self.config.vendor {
            Vendor::Fal => request.header("Authorization", format!("Key {}", key)),
            Vendor::GoApi => request.header("x-api-key", key),
            Vendor::Runway => request
                .bearer_auth(key)
                .header("X-Runway-Version", RUNWAY_API_VERSION),
            Vendor::Wavespeed | Vendor::Sora | Vendor::Suno => request.bearer_auth(key),
        }
    }

    async fn read_json(response: Response) -> VendorResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VendorError::from_http_status(status.as_u16(), body));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl StatusCheck for VendorClient {
    type Payload = Value;
    type Reason = String;
    type Error = VendorError;

    async fn check_status(&self, job_id: &JobId) -> Result<StatusSample<Value, String>, VendorError> {
        self.fetch_status(job_id).await
    }
}
