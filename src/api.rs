//! HTTP implementation of the vehicle API
//!
//! Thin reqwest client over the dashboard backend. No retries: a failed
//! request is reported once and the caller decides what to show.

use crate::config::ApiConfig;
use crate::error::{PanelError, Result};
use crate::logging::get_logger;
use crate::vehicle::{VehicleApi, VehicleStatus};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response, Url};
use serde_json::json;
use std::time::Duration;

/// Vehicle API client backed by reqwest
pub struct HttpVehicleApi {
    client: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
    logger: crate::logging::StructuredLogger,
}

impl HttpVehicleApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let trimmed = config.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(PanelError::config("api.base_url is empty"));
        }
        let base_url = Url::parse(trimmed)
            .map_err(|e| PanelError::config(format!("invalid api.base_url '{}': {}", trimmed, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(PanelError::config(format!(
                "api.base_url '{}' cannot carry a path",
                trimmed
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url,
            access_token: config
                .access_token
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            logger: get_logger("api"),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PanelError::config("api.base_url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn decorate(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("vehicle-panel/", env!("APP_VERSION")));
        match &self.access_token {
            Some(token) => req.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => req,
        }
    }

    async fn check(&self, what: &str, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        self.logger
            .error(&format!("{} failed: {} {}", what, status, body.trim()));
        Err(PanelError::api(format!("{} failed with status {}", what, status)))
    }
}

#[async_trait::async_trait]
impl VehicleApi for HttpVehicleApi {
    async fn get_vehicle(&self, id: &str) -> Result<VehicleStatus> {
        self.logger.debug(&format!("GET vehicle {}", id));
        let resp = self
            .decorate(self.client.get(self.url(&["vehicles", id])?))
            .send()
            .await?;
        let resp = self.check("get_vehicle", resp).await?;
        let status: VehicleStatus = resp.json().await?;
        Ok(status)
    }

    async fn update_property(&self, id: &str, name: &str, value: &str) -> Result<()> {
        self.logger
            .info(&format!("Update {}={} on vehicle {}", name, value, id));
        let resp = self
            .decorate(
                self.client
                    .put(self.url(&["vehicles", id, "properties", name])?),
            )
            .json(&json!({ "value": value }))
            .send()
            .await?;
        self.check("update_property", resp).await?;
        Ok(())
    }

    async fn disconnect(&self, id: Option<&str>) -> Result<()> {
        let url = match id {
            Some(id) => self.url(&["vehicles", id])?,
            None => self.url(&["vehicles"])?,
        };
        self.logger
            .info(&format!("Disconnect {}", id.unwrap_or("all vehicles")));
        let resp = self.decorate(self.client.delete(url)).send().await?;
        self.check("disconnect", resp).await?;
        Ok(())
    }
}
