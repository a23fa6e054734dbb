//! Vendor connection settings.

use std::time::Duration;

use tales_models::Vendor;

use crate::error::{VendorError, VendorResult};

/// Default per-request timeout for status and submit calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Public API root for each vendor.
pub fn default_base_url(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Wavespeed => "https://api.wavespeed.ai",
        Vendor::Fal => "https://queue.fal.run/fal-ai/diffrhythm",
        Vendor::Runway => "https://api.dev.runwayml.com",
        Vendor::Sora => "https://api.openai.com",
        Vendor::Suno => "https://api.sunoapi.org",
        Vendor::GoApi => "https://api.goapi.ai",
    }
}

/// Configuration for a vendor client.
#[derive(Clone)]
pub struct VendorConfig {
    pub vendor: Vendor,
    /// API root, without trailing slash
    pub base_url: String,
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorConfig")
            .field("vendor", &self.vendor)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl VendorConfig {
    /// Config for `vendor` against its public API.
    pub fn new(vendor: Vendor, api_key: impl Into<String>) -> Self {
        Self {
            vendor,
            base_url: default_base_url(vendor).to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create config from environment variables.
    ///
    /// Reads `{PREFIX}_API_KEY` (required), `{PREFIX}_BASE_URL` and
    /// `{PREFIX}_TIMEOUT_SECS`, where the prefix comes from
    /// [`Vendor::env_prefix`].
    pub fn from_env(vendor: Vendor) -> VendorResult<Self> {
        let prefix = vendor.env_prefix();
        let key_var = format!("{}_API_KEY", prefix);

        let api_key = std::env::var(&key_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| VendorError::MissingApiKey(key_var.clone()))?;

        let mut config = Self::new(vendor, api_key);

        if let Ok(base_url) = std::env::var(format!("{}_BASE_URL", prefix)) {
            if !base_url.trim().is_empty() {
                config = config.with_base_url(base_url.trim());
            }
        }

        let timeout_var = format!("{}_TIMEOUT_SECS", prefix);
        if let Ok(raw) = std::env::var(&timeout_var) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                VendorError::config(format!("{} must be a whole number of seconds", timeout_var))
            })?;
            if secs == 0 {
                return Err(VendorError::config(format!("{} must be positive", timeout_var)));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
