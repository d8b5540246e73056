//! HTTP infrastructure — implements `HttpProbe` with reqwest.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::HttpProbe;

/// Fixed per-attempt request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Production probe issuing plain GET requests.
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    /// # Errors
    ///
    /// Returns an error if the TLS backend fails to initialize.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build HTTP client")?;
        Ok(Self { client })
    }
}

impl HttpProbe for ReqwestProbe {
    async fn get_status(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        Ok(response.status().as_u16())
    }
}
