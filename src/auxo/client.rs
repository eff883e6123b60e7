//! HTTPS client for the AUXO v3 zero-trust endpoints.

use super::AssetService;
use crate::config::Config;
use crate::models::{
    ProtectSurfaceLocationState, ProtectSurfaceResponse, RemoteStateRecord, StatesResponse,
    UpsertRequest,
};
use crate::BoxError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct AuxoClient {
    http: Client,
    base_url: String,
    api_token: String,
}

impl AuxoClient {
    pub fn new(api_url: &str, api_token: &str, timeout: Duration) -> Result<AuxoClient, BoxError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Error building HTTP client: {e}"))?;
        Ok(AuxoClient {
            http,
            base_url: base_url(api_url),
            api_token: api_token.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<AuxoClient, BoxError> {
        AuxoClient::new(&config.api_url, &config.api_token, config.http_timeout)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/v3/zerotrust/{endpoint}", self.base_url)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(endpoint))
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String, BoxError> {
        let response = request
            .send()
            .await
            .map_err(|e| format!("{what}: request failed: {e}"))?;
        checked_body(response, what).await
    }
}

/// `https://{API_URL}` unless `API_URL` already names a scheme.
fn base_url(api_url: &str) -> String {
    let api_url = api_url.trim().trim_end_matches('/');
    if api_url.starts_with("http://") || api_url.starts_with("https://") {
        api_url.to_string()
    } else {
        format!("https://{api_url}")
    }
}

/// Body of a successful response, or an error carrying status and body.
async fn checked_body(response: Response, what: &str) -> Result<String, BoxError> {
    let status = response.status();
    let body = response.text().await;
    if !status.is_success() {
        let body = body.unwrap_or_default();
        return Err(format!("Error http: [{status}] {what}: {body}").into());
    }
    body.map_err(|e| format!("{what}: reading response body failed: {e}").into())
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, BoxError> {
    let mut deserializer = serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| format!("{what}: invalid response path={} error={}", e.path(), e).into())
}

#[async_trait]
impl AssetService for AuxoClient {
    async fn upsert_state(&self, item: &ProtectSurfaceLocationState) -> Result<(), BoxError> {
        let body = UpsertRequest {
            items: vec![item.clone()],
        };
        let request = self
            .request(Method::POST, "upsert-protectsurface-location-state")
            .json(&body);
        let response = self.send(request, &format!("Upsert {}", item.label())).await?;
        log::debug!("Upsert {} response: {}", item.label(), response);
        Ok(())
    }

    async fn get_states(&self) -> Result<Vec<RemoteStateRecord>, BoxError> {
        let body = self
            .send(self.request(Method::GET, "get-states"), "Get states")
            .await?;
        let states: StatesResponse = decode(&body, "Get states")?;
        let (records, rejected) = states.into_records();
        for reason in &rejected {
            log::warn!("Get states: skipping malformed state {reason}");
        }
        log::info!(
            "State get request successful: {} states, {} malformed skipped",
            records.len(),
            rejected.len()
        );
        Ok(records)
    }

    async fn get_protect_surface_name(&self, protect_surface_id: &str) -> Result<String, BoxError> {
        let what = format!("Get protect surface {protect_surface_id}");
        let request = self
            .request(Method::GET, "get-protectsurface")
            .query(&[("id", protect_surface_id)]);
        let body = self.send(request, &what).await?;
        let response: ProtectSurfaceResponse = decode(&body, &what)?;
        response
            .items
            .into_iter()
            .next()
            .map(|ps| ps.name)
            .ok_or_else(|| format!("{what}: no protect surface returned").into())
    }

    async fn delete_state(&self, state_id: &str) -> Result<(), BoxError> {
        let request = self
            .request(Method::POST, "remove-state")
            .query(&[("id", state_id)]);
        self.send(request, &format!("Delete state {state_id}")).await?;
        Ok(())
    }
}
